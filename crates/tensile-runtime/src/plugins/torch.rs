//! Torch plugin — distributed/elastic launch environment
//!
//! Writes the torchrun `PET_*` environment into the trainer container:
//! node count (a `min:max` range when the policy is elastic), processes
//! per node, rendezvous backend and endpoint. The per-node process
//! count resolves job override first, then the structured policy field,
//! then the deprecated elastic knob, then "auto".

use tensile_common::crd::{TrainJob, TrainingRuntimeSpec};
use tensile_common::{
    CONTAINER_TRAINER, JOB_TRAINER_NODE, TORCH_ENV_NUM_NODES, TORCH_ENV_NUM_PROC_PER_NODE,
    TORCH_ENV_RDZV_BACKEND, TORCH_ENV_RDZV_ENDPOINT, TORCH_RDZV_PORT,
};

use kube::ResourceExt;

use crate::error::AssemblyError;
use crate::plugins::Assembly;
use crate::topology;

pub(crate) fn apply(
    assembly: &mut Assembly,
    runtime: &TrainingRuntimeSpec,
    job: &TrainJob,
) -> Result<(), AssemblyError> {
    let Some(torch) = runtime.ml_policy.as_ref().and_then(|p| p.torch.as_ref()) else {
        return Ok(());
    };

    let node_count = topology::job(&assembly.spec, JOB_TRAINER_NODE)
        .map(|g| g.replicas)
        .ok_or_else(|| AssemblyError::UnknownTargetJob {
            job: JOB_TRAINER_NODE.to_string(),
        })?;

    let num_proc_per_node = job
        .spec
        .trainer
        .as_ref()
        .and_then(|t| t.num_proc_per_node.clone())
        .or_else(|| torch.num_proc_per_node.clone())
        .or_else(|| {
            torch
                .elastic
                .as_ref()
                .and_then(|e| e.n_proc_per_node.map(|n| n.to_string()))
        })
        .unwrap_or_else(|| "auto".to_string());

    let nnodes = match &torch.elastic {
        Some(elastic) => format!(
            "{}:{}",
            elastic.min_nodes.unwrap_or(node_count),
            elastic.max_nodes.unwrap_or(node_count)
        ),
        None => node_count.to_string(),
    };

    let rdzv_backend = torch
        .elastic
        .as_ref()
        .map(|e| e.rdzv_backend.clone())
        .unwrap_or_else(|| "c10d".to_string());

    let job_name = job.name_any();
    let rdzv_endpoint = format!("{job_name}-{JOB_TRAINER_NODE}-0-0.{job_name}:{TORCH_RDZV_PORT}");

    let group = topology::job_mut(&mut assembly.spec, JOB_TRAINER_NODE).ok_or_else(|| {
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

    topology::upsert_env(container, TORCH_ENV_NUM_NODES, &nnodes);
    topology::upsert_env(container, TORCH_ENV_NUM_PROC_PER_NODE, &num_proc_per_node);
    topology::upsert_env(container, TORCH_ENV_RDZV_BACKEND, &rdzv_backend);
    topology::upsert_env(container, TORCH_ENV_RDZV_ENDPOINT, &rdzv_endpoint);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger;
    use crate::testing::{env_value, make_runtime, make_train_job, trainer_group};
    use tensile_common::crd::{MlPolicy, TorchElasticPolicy, TorchPolicy, TrainerSpec};

    fn torch_runtime(
        num_nodes: Option<u32>,
        torch: TorchPolicy,
    ) -> tensile_common::crd::TrainingRuntimeSpec {
        let mut runtime = make_runtime(num_nodes, vec![trainer_group("test:runtime", "1")]);
        runtime.ml_policy = Some(MlPolicy {
            num_nodes,
            torch: Some(torch),
            mpi: None,
        });
        runtime
    }

    fn trainer_env(assembly: &Assembly, name: &str) -> Option<String> {
        let group = crate::topology::job(&assembly.spec, JOB_TRAINER_NODE).unwrap();
        env_value(group, CONTAINER_TRAINER, name)
    }

    #[test]
    fn non_elastic_sets_plain_node_count() {
        let runtime = torch_runtime(Some(4), TorchPolicy::default());
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert_eq!(trainer_env(&assembly, TORCH_ENV_NUM_NODES).as_deref(), Some("4"));
        assert_eq!(
            trainer_env(&assembly, TORCH_ENV_NUM_PROC_PER_NODE).as_deref(),
            Some("auto")
        );
        assert_eq!(
            trainer_env(&assembly, TORCH_ENV_RDZV_ENDPOINT).as_deref(),
            Some("test-job-trainer-node-0-0.test-job:29400")
        );
    }

    #[test]
    fn elastic_sets_node_range_and_backend() {
        let runtime = torch_runtime(
            Some(4),
            TorchPolicy {
                num_proc_per_node: None,
                elastic: Some(TorchElasticPolicy {
                    min_nodes: Some(2),
                    max_nodes: Some(8),
                    ..Default::default()
                }),
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert_eq!(trainer_env(&assembly, TORCH_ENV_NUM_NODES).as_deref(), Some("2:8"));
        assert_eq!(
            trainer_env(&assembly, TORCH_ENV_RDZV_BACKEND).as_deref(),
            Some("c10d")
        );
    }

    #[test]
    fn elastic_bounds_default_to_node_count() {
        let runtime = torch_runtime(
            Some(4),
            TorchPolicy {
                num_proc_per_node: None,
                elastic: Some(TorchElasticPolicy::default()),
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert_eq!(trainer_env(&assembly, TORCH_ENV_NUM_NODES).as_deref(), Some("4:4"));
    }

    #[test]
    fn deprecated_knob_reconciled_when_structured_field_unset() {
        let runtime = torch_runtime(
            Some(2),
            TorchPolicy {
                num_proc_per_node: None,
                elastic: Some(TorchElasticPolicy {
                    n_proc_per_node: Some(8),
                    ..Default::default()
                }),
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert_eq!(
            trainer_env(&assembly, TORCH_ENV_NUM_PROC_PER_NODE).as_deref(),
            Some("8")
        );
    }

    #[test]
    fn structured_field_wins_over_deprecated_knob() {
        let runtime = torch_runtime(
            Some(2),
            TorchPolicy {
                num_proc_per_node: Some("gpu".to_string()),
                elastic: Some(TorchElasticPolicy {
                    n_proc_per_node: Some(8),
                    ..Default::default()
                }),
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert_eq!(
            trainer_env(&assembly, TORCH_ENV_NUM_PROC_PER_NODE).as_deref(),
            Some("gpu")
        );
    }

    #[test]
    fn job_override_wins_over_policy() {
        let runtime = torch_runtime(
            Some(2),
            TorchPolicy {
                num_proc_per_node: Some("gpu".to_string()),
                elastic: None,
            },
        );
        let job = make_train_job(
            "test-job",
            Some(TrainerSpec {
                num_proc_per_node: Some("4".to_string()),
                ..Default::default()
            }),
        );

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert_eq!(
            trainer_env(&assembly, TORCH_ENV_NUM_PROC_PER_NODE).as_deref(),
            Some("4")
        );
    }

    #[test]
    fn no_torch_policy_is_a_no_op() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert!(trainer_env(&assembly, TORCH_ENV_NUM_NODES).is_none());
    }
}
