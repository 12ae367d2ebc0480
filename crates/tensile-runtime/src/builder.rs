//! Object builder — final output objects with ownership linkage
//!
//! Wraps the assembled topology and optional gang descriptor in their
//! API envelopes: deterministic names derived from the TrainJob, owner
//! references so the store cascade-deletes on job removal, and labels
//! copied from the runtime's template metadata. Construction only; no
//! store writes happen here.

use std::collections::BTreeSet;

use tensile_common::crd::{TrainJob, TrainingRuntimeSpec};
use tensile_common::{API_VERSION, TRAIN_JOB_KIND};
use tensile_jobset::{
    JobSet, ObjectMetadata, OwnerReference, PodGroup, JOBSET_API_VERSION, JOBSET_KIND,
    POD_GROUP_API_VERSION, POD_GROUP_KIND,
};

use crate::error::AssemblyError;
use crate::plugins::Assembly;

/// The ordered output of one assembly call
#[derive(Debug)]
pub struct AssembledTrainJob {
    /// The topology object, always present and always first
    pub job_set: JobSet,
    /// The gang descriptor, present iff coscheduling was configured
    pub pod_group: Option<PodGroup>,
}

impl AssembledTrainJob {
    /// The output objects as an ordered list of JSON values, topology first.
    pub fn objects(&self) -> Result<Vec<serde_json::Value>, AssemblyError> {
        let mut objects = vec![serde_json::to_value(&self.job_set)?];
        if let Some(pod_group) = &self.pod_group {
            objects.push(serde_json::to_value(pod_group)?);
        }
        Ok(objects)
    }
}

/// Build the final output objects from a completed assembly.
///
/// Panics if the plugin chain produced a topology with duplicate group
/// names; that is a programming invariant violation, not submitter input.
pub fn build(
    assembly: Assembly,
    runtime: &TrainingRuntimeSpec,
    job: &TrainJob,
) -> AssembledTrainJob {
    let mut seen = BTreeSet::new();
    for group in &assembly.spec.replicated_jobs {
        assert!(
            seen.insert(group.name.as_str()),
            "duplicate replicated job '{}' in assembled topology",
            group.name
        );
    }

    let name = job.metadata.name.as_deref().unwrap_or_default();
    let namespace = job.metadata.namespace.as_deref().unwrap_or("default");

    let job_set = JobSet {
        api_version: JOBSET_API_VERSION.to_string(),
        kind: JOBSET_KIND.to_string(),
        metadata: object_metadata(runtime, job, name, namespace),
        spec: assembly.spec,
    };

    let pod_group = assembly.pod_group.map(|spec| PodGroup {
        api_version: POD_GROUP_API_VERSION.to_string(),
        kind: POD_GROUP_KIND.to_string(),
        metadata: object_metadata(runtime, job, name, namespace),
        spec,
    });

    AssembledTrainJob { job_set, pod_group }
}

fn object_metadata(
    runtime: &TrainingRuntimeSpec,
    job: &TrainJob,
    name: &str,
    namespace: &str,
) -> ObjectMetadata {
    let uid = job.metadata.uid.as_deref().unwrap_or_default();

    let template_metadata = runtime.template.metadata.as_ref();
    let mut labels = template_metadata
        .map(|m| m.labels.clone())
        .unwrap_or_default();
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "tensile".to_string(),
    );
    labels.insert("app.kubernetes.io/name".to_string(), name.to_string());

    ObjectMetadata {
        name: name.to_string(),
        namespace: namespace.to_string(),
        labels,
        annotations: template_metadata
            .map(|m| m.annotations.clone())
            .unwrap_or_default(),
        owner_references: vec![OwnerReference {
            api_version: API_VERSION.to_string(),
            kind: TRAIN_JOB_KIND.to_string(),
            name: name.to_string(),
            uid: uid.to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger;
    use crate::testing::{make_runtime, make_train_job, trainer_group};
    use tensile_jobset::PodGroupSpec;

    fn assembly_for(runtime: &TrainingRuntimeSpec, job: &TrainJob) -> Assembly {
        Assembly::new(merger::merge(runtime, job).unwrap())
    }

    #[test]
    fn owner_reference_points_back_to_train_job() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let built = build(assembly_for(&runtime, &job), &runtime, &job);

        assert_eq!(built.job_set.metadata.owner_references.len(), 1);
        let oref = &built.job_set.metadata.owner_references[0];
        assert_eq!(oref.kind, "TrainJob");
        assert_eq!(oref.api_version, "tensile.dev/v1alpha1");
        assert_eq!(oref.name, "test-job");
        assert_eq!(oref.uid, "uid");
        assert_eq!(oref.controller, Some(true));
        assert_eq!(oref.block_owner_deletion, Some(true));
    }

    #[test]
    fn names_are_deterministic() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let built = build(assembly_for(&runtime, &job), &runtime, &job);
        assert_eq!(built.job_set.metadata.name, "test-job");
        assert_eq!(built.job_set.metadata.namespace, "default");
    }

    #[test]
    fn objects_are_ordered_topology_first() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let mut assembly = assembly_for(&runtime, &job);
        assembly.pod_group = Some(PodGroupSpec {
            min_member: 2,
            ..Default::default()
        });

        let built = build(assembly, &runtime, &job);
        let objects = built.objects().unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["kind"], "JobSet");
        assert_eq!(objects[1]["kind"], "PodGroup");
    }

    #[test]
    fn no_pod_group_yields_single_object() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let built = build(assembly_for(&runtime, &job), &runtime, &job);
        assert!(built.pod_group.is_none());
        assert_eq!(built.objects().unwrap().len(), 1);
    }

    #[test]
    #[should_panic(expected = "duplicate replicated job")]
    fn duplicate_group_names_panic() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let mut assembly = assembly_for(&runtime, &job);
        let duplicate = assembly.spec.replicated_jobs[0].clone();
        assembly.spec.replicated_jobs.push(duplicate);

        let _ = build(assembly, &runtime, &job);
    }

    #[test]
    fn template_metadata_copied() {
        let mut runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        runtime.template.metadata = Some(tensile_common::crd::TemplateMetadata {
            labels: std::collections::BTreeMap::from([(
                "team".to_string(),
                "research".to_string(),
            )]),
            annotations: std::collections::BTreeMap::from([(
                "tensile.dev/description".to_string(),
                "torch distributed".to_string(),
            )]),
        });
        let job = make_train_job("test-job", None);

        let built = build(assembly_for(&runtime, &job), &runtime, &job);
        assert_eq!(built.job_set.metadata.labels["team"], "research");
        assert_eq!(
            built.job_set.metadata.labels["app.kubernetes.io/managed-by"],
            "tensile"
        );
        assert_eq!(
            built.job_set.metadata.annotations["tensile.dev/description"],
            "torch distributed"
        );
    }
}
