//! Test fixtures shared by unit and integration tests
//!
//! Small constructors for runtimes, jobs, and replicated-job groups so
//! tests read as scenario descriptions rather than struct literals.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use tensile_common::crd::{
    JobSetTemplateSpec, MlPolicy, TrainJob, TrainJobSpec, TrainerSpec, TrainingRuntimeSpec,
    RuntimeRef,
};
use tensile_common::{
    CONTAINER_DATASET_INITIALIZER, CONTAINER_MODEL_INITIALIZER, CONTAINER_TRAINER,
    JOB_INITIALIZER, JOB_TRAINER_NODE,
};
use tensile_jobset::{JobSetSpec, ReplicatedJob};

/// A container with a CPU request and placeholder command/args
pub fn container(name: &str, image: &str, cpu_request: &str) -> Container {
    Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        command: Some(vec!["runtime".to_string()]),
        args: Some(vec!["runtime".to_string()]),
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([(
                "cpu".to_string(),
                Quantity(cpu_request.to_string()),
            )])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn pod_template(containers: Vec<Container>) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: None,
        spec: Some(PodSpec {
            containers,
            ..Default::default()
        }),
    }
}

/// The scalable trainer group with a single `trainer` container
pub fn trainer_group(image: &str, cpu_request: &str) -> ReplicatedJob {
    ReplicatedJob {
        name: JOB_TRAINER_NODE.to_string(),
        replicas: 1,
        parallelism: None,
        completions: None,
        depends_on: vec![],
        template: pod_template(vec![container(CONTAINER_TRAINER, image, cpu_request)]),
    }
}

/// The singleton initializer group hosting both initializer containers
pub fn initializer_group(image: &str, cpu_request: &str) -> ReplicatedJob {
    ReplicatedJob {
        name: JOB_INITIALIZER.to_string(),
        replicas: 1,
        parallelism: None,
        completions: None,
        depends_on: vec![],
        template: pod_template(vec![
            container(CONTAINER_DATASET_INITIALIZER, image, cpu_request),
            container(CONTAINER_MODEL_INITIALIZER, image, cpu_request),
        ]),
    }
}

/// A runtime spec with the given node count and topology groups
pub fn make_runtime(num_nodes: Option<u32>, groups: Vec<ReplicatedJob>) -> TrainingRuntimeSpec {
    TrainingRuntimeSpec {
        ml_policy: num_nodes.map(|n| MlPolicy {
            num_nodes: Some(n),
            ..Default::default()
        }),
        pod_group_policy: None,
        template: JobSetTemplateSpec {
            metadata: None,
            spec: JobSetSpec {
                replicated_jobs: groups,
                suspend: None,
            },
        },
    }
}

/// A namespaced TrainJob with a fixed uid and optional trainer override
pub fn make_train_job(name: &str, trainer: Option<TrainerSpec>) -> TrainJob {
    let spec = TrainJobSpec {
        runtime_ref: RuntimeRef {
            api_group: None,
            kind: None,
            name: "test-runtime".to_string(),
        },
        trainer,
        ..Default::default()
    };
    let mut job = TrainJob::new(name, spec);
    job.metadata.namespace = Some("default".to_string());
    job.metadata.uid = Some("uid".to_string());
    job
}

/// Look up an environment variable's value on a named container
pub fn env_value(group: &ReplicatedJob, container_name: &str, env_name: &str) -> Option<String> {
    group
        .template
        .spec
        .as_ref()?
        .containers
        .iter()
        .find(|c| c.name == container_name)?
        .env
        .as_ref()?
        .iter()
        .find(|e| e.name == env_name)?
        .value
        .clone()
}
