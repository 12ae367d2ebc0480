//! TrainingRuntime and ClusterTrainingRuntime admission rules
//!
//! Structural validation of the replicated-job topology, role-based
//! replica constraints, policy consistency, and deprecated-field
//! migration. Violations are reported for every offending group and
//! container, never just the first.

use tensile_common::crd::TrainingRuntimeSpec;
use tensile_common::{
    CONTAINER_DATASET_INITIALIZER, CONTAINER_MODEL_INITIALIZER, CONTAINER_TRAINER,
    JOB_INITIALIZER, JOB_LAUNCHER, JOB_TRAINER_NODE,
};

use crate::field::{FieldError, FieldPath};

/// Validate a runtime template spec. Both runtime kinds share this rule
/// set; the cluster-scoped handler converts its spec first.
pub fn validate_training_runtime(spec: &TrainingRuntimeSpec) -> (Vec<String>, Vec<FieldError>) {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let jobs_path = FieldPath::new("spec")
        .child("template")
        .child("spec")
        .child("replicatedJobs");

    for group in &spec.template.spec.replicated_jobs {
        let group_path = jobs_path.clone().key(&group.name);
        let containers_path = group_path
            .clone()
            .child("template")
            .child("spec")
            .child("containers");

        let containers = group
            .template
            .spec
            .as_ref()
            .map(|s| s.containers.as_slice())
            .unwrap_or_default();

        if containers.is_empty() {
            errors.push(FieldError::required(
                containers_path.clone(),
                "each replicated job needs at least one container",
            ));
        }
        for (index, container) in containers.iter().enumerate() {
            if container.name.is_empty() {
                errors.push(FieldError::required(
                    containers_path.clone(),
                    "container name must be set",
                ));
            }
            if container.image.as_deref().unwrap_or_default().is_empty() {
                errors.push(FieldError::required(
                    containers_path.clone().index(index).child("image"),
                    "container image must be set",
                ));
            }
        }

        if group.name == JOB_TRAINER_NODE
            && !containers.iter().any(|c| c.name == CONTAINER_TRAINER)
        {
            errors.push(FieldError::required(
                containers_path.clone(),
                format!("{JOB_TRAINER_NODE} must declare a container named \"{CONTAINER_TRAINER}\""),
            ));
        }
        if group.name == JOB_INITIALIZER
            && !containers.iter().any(|c| {
                c.name == CONTAINER_DATASET_INITIALIZER || c.name == CONTAINER_MODEL_INITIALIZER
            })
        {
            errors.push(FieldError::required(
                containers_path,
                format!(
                    "{JOB_INITIALIZER} must declare a \"{CONTAINER_DATASET_INITIALIZER}\" or \"{CONTAINER_MODEL_INITIALIZER}\" container"
                ),
            ));
        }

        let singleton_role = group.name == JOB_LAUNCHER || group.name == JOB_INITIALIZER;
        if singleton_role && group.replicas != 1 {
            errors.push(FieldError::forbidden(
                group_path.clone().child("replicas"),
                "must be 1 for singleton role groups",
            ));
        }
        if group.name == JOB_TRAINER_NODE && group.replicas == 0 {
            errors.push(FieldError::forbidden(
                group_path.child("replicas"),
                "must not be 0",
            ));
        }
    }

    if let Some(policy) = &spec.ml_policy {
        let policy_path = FieldPath::new("spec").child("mlPolicy");

        if policy.torch.is_some() && policy.mpi.is_some() {
            errors.push(FieldError::forbidden(
                policy_path.clone().child("mpi"),
                "only one of torch or mpi may be set",
            ));
        }

        if let Some(torch) = &policy.torch {
            let torch_path = policy_path.child("torch");
            if let Some(elastic) = &torch.elastic {
                if !spec
                    .template
                    .spec
                    .replicated_jobs
                    .iter()
                    .any(|g| g.name == JOB_TRAINER_NODE)
                {
                    errors.push(FieldError::required(
                        jobs_path.clone().key(JOB_TRAINER_NODE),
                        format!("elastic policy requires a {JOB_TRAINER_NODE} replicated job"),
                    ));
                }

                if let (Some(min), Some(max)) = (elastic.min_nodes, elastic.max_nodes) {
                    if min > max {
                        errors.push(FieldError::invalid(
                            torch_path.clone().child("elastic").child("maxNodes"),
                            max.to_string(),
                            "maxNodes must not be less than minNodes",
                        ));
                    }
                }

                let deprecated_path = torch_path
                    .clone()
                    .child("elastic")
                    .child("nProcPerNode");
                if elastic.n_proc_per_node.is_some() {
                    warnings.push(format!(
                        "{} is deprecated, use {} instead",
                        deprecated_path,
                        torch_path.clone().child("numProcPerNode")
                    ));
                    if torch.num_proc_per_node.is_some() {
                        errors.push(FieldError::forbidden(
                            deprecated_path,
                            "must not be used together with numProcPerNode",
                        ));
                    }
                }
            }
        }
    }

    (warnings, errors)
}
