//! Spec merger — combines a runtime template with a TrainJob's overrides
//!
//! Merging starts from a deep copy of the template topology, so the
//! stored runtime is never mutated and concurrent assemblies sharing a
//! cached template cannot alias each other. Absent override fields keep
//! the template's values; an override whose target group or container is
//! missing fails the whole merge with no partial output.

use tensile_common::crd::{InitializerConfig, TrainJob, TrainingRuntimeSpec};
use tensile_common::{
    CONTAINER_DATASET_INITIALIZER, CONTAINER_MODEL_INITIALIZER, CONTAINER_TRAINER, ENV_STORAGE_URI,
    JOB_INITIALIZER, JOB_TRAINER_NODE,
};
use tensile_jobset::JobSetSpec;

use crate::error::AssemblyError;
use crate::topology;

/// Merge a runtime template with a TrainJob into a concrete topology.
///
/// Node-count resolution order: explicit `trainer.numNodes` on the job,
/// then the runtime's `mlPolicy.numNodes`, then 1. The resolved count is
/// the sole authority for the trainer group's replica count. Initializer
/// groups are pinned to a single pod regardless of node count.
pub fn merge(runtime: &TrainingRuntimeSpec, job: &TrainJob) -> Result<JobSetSpec, AssemblyError> {
    let mut spec = runtime.template.spec.clone();

    let node_count = job
        .spec
        .trainer
        .as_ref()
        .and_then(|t| t.num_nodes)
        .or_else(|| runtime.ml_policy.as_ref().and_then(|p| p.num_nodes))
        .unwrap_or(1);

    if let Some(trainer_group) = topology::job_mut(&mut spec, JOB_TRAINER_NODE) {
        trainer_group.replicas = node_count;
    } else if job.spec.trainer.is_some() {
        return Err(AssemblyError::UnknownTargetJob {
            job: JOB_TRAINER_NODE.to_string(),
        });
    }

    for group in &mut spec.replicated_jobs {
        if group.name == JOB_INITIALIZER {
            group.replicas = 1;
            group.parallelism = Some(1);
            group.completions = Some(1);
        }
    }

    if let Some(trainer) = &job.spec.trainer {
        // Presence of the trainer group was checked above
        let group = topology::job_mut(&mut spec, JOB_TRAINER_NODE).ok_or_else(|| {
            AssemblyError::UnknownTargetJob {
                job: JOB_TRAINER_NODE.to_string(),
            }
        })?;
        let container = topology::container_mut(group, CONTAINER_TRAINER).ok_or_else(|| {
            AssemblyError::UnknownTargetContainer {
                job: JOB_TRAINER_NODE.to_string(),
                container: CONTAINER_TRAINER.to_string(),
            }
        })?;
        if let Some(image) = &trainer.image {
            container.image = Some(image.clone());
        }
        if let Some(command) = &trainer.command {
            container.command = Some(command.clone());
        }
        if let Some(args) = &trainer.args {
            container.args = Some(args.clone());
        }
        if let Some(resources) = &trainer.resources_per_node {
            container.resources = Some(resources.clone());
        }
        for var in &trainer.env {
            topology::upsert_env_var(container, var);
        }
    }

    apply_initializer(
        &mut spec,
        job.spec.dataset_config.as_ref(),
        CONTAINER_DATASET_INITIALIZER,
    )?;
    apply_initializer(
        &mut spec,
        job.spec.model_config.as_ref(),
        CONTAINER_MODEL_INITIALIZER,
    )?;

    for pod_override in &job.spec.pod_spec_overrides {
        for target in &pod_override.target_jobs {
            let group = topology::job_mut(&mut spec, target).ok_or_else(|| {
                AssemblyError::UnknownTargetJob {
                    job: target.clone(),
                }
            })?;
            let pod_spec = group.template.spec.get_or_insert_with(Default::default);
            if !pod_override.node_selector.is_empty() {
                pod_spec
                    .node_selector
                    .get_or_insert_with(Default::default)
                    .extend(pod_override.node_selector.clone());
            }
            if let Some(sa) = &pod_override.service_account_name {
                pod_spec.service_account_name = Some(sa.clone());
            }
            if !pod_override.tolerations.is_empty() {
                pod_spec
                    .tolerations
                    .get_or_insert_with(Vec::new)
                    .extend(pod_override.tolerations.iter().cloned());
            }
        }
    }

    if let Some(suspend) = job.spec.suspend {
        spec.suspend = Some(suspend);
    }

    Ok(spec)
}

/// Apply a dataset or model initializer override to its container in the
/// singleton initializer group.
fn apply_initializer(
    spec: &mut JobSetSpec,
    config: Option<&InitializerConfig>,
    container_name: &str,
) -> Result<(), AssemblyError> {
    let Some(config) = config else {
        return Ok(());
    };
    let group = topology::job_mut(spec, JOB_INITIALIZER).ok_or_else(|| {
        AssemblyError::UnknownTargetJob {
            job: JOB_INITIALIZER.to_string(),
        }
    })?;
    let container = topology::container_mut(group, container_name).ok_or_else(|| {
        AssemblyError::UnknownTargetContainer {
            job: JOB_INITIALIZER.to_string(),
            container: container_name.to_string(),
        }
    })?;
    if let Some(image) = &config.image {
        container.image = Some(image.clone());
    }
    for var in &config.env {
        topology::upsert_env_var(container, var);
    }
    if let Some(uri) = &config.storage_uri {
        topology::upsert_env(container, ENV_STORAGE_URI, uri);
    }
    Ok(())
}
