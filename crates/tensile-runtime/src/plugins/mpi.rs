//! MPI plugin — launcher/worker topology rewrite
//!
//! Ensures the topology carries a singleton launcher group that starts
//! only after the initializers complete and the worker nodes are ready,
//! and propagates the per-node process count into the launch arguments.
//! If the launcher is created after gang sizing already ran, the gang
//! descriptor is bumped by the launcher's pods and requests so the
//! sizing invariant holds after the full chain.

use std::collections::BTreeMap;

use tensile_common::crd::{MpiImplementation, TrainJob, TrainingRuntimeSpec};
use tensile_common::{
    quantity, JOB_INITIALIZER, JOB_LAUNCHER, JOB_TRAINER_NODE, MPI_ENV_DEFAULT_SLOTS,
    MPI_ENV_INTEL_PERHOST,
};
use tensile_jobset::{DependencyStatus, DependsOn};

use crate::error::AssemblyError;
use crate::plugins::Assembly;
use crate::topology;

pub(crate) fn apply(
    assembly: &mut Assembly,
    runtime: &TrainingRuntimeSpec,
    job: &TrainJob,
) -> Result<(), AssemblyError> {
    let Some(mpi) = runtime.ml_policy.as_ref().and_then(|p| p.mpi.as_ref()) else {
        return Ok(());
    };

    let num_proc_per_node = job
        .spec
        .trainer
        .as_ref()
        .and_then(|t| t.num_proc_per_node.as_deref())
        .and_then(|s| s.parse::<u32>().ok())
        .or(mpi.num_proc_per_node)
        .unwrap_or(1);

    let trainer_replicas = topology::job(&assembly.spec, JOB_TRAINER_NODE)
        .map(|g| g.replicas)
        .ok_or_else(|| AssemblyError::UnknownTargetJob {
            job: JOB_TRAINER_NODE.to_string(),
        })?;

    if topology::job(&assembly.spec, JOB_LAUNCHER).is_none() {
        add_launcher_group(assembly)?;
    }

    let total_procs =
        num_proc_per_node * (trainer_replicas + u32::from(mpi.run_launcher_as_node));

    let launcher = topology::job_mut(&mut assembly.spec, JOB_LAUNCHER).ok_or_else(|| {
        AssemblyError::UnknownTargetJob {
            job: JOB_LAUNCHER.to_string(),
        }
    })?;
    let container = topology::lead_container_mut(launcher).ok_or_else(|| {
        AssemblyError::EmptyPodTemplate {
            job: JOB_LAUNCHER.to_string(),
        }
    })?;

    container.args.get_or_insert_with(Vec::new).extend([
        "--npernode".to_string(),
        num_proc_per_node.to_string(),
        "-np".to_string(),
        total_procs.to_string(),
    ]);
    let slots_env = match mpi.mpi_implementation {
        MpiImplementation::OpenMPI => MPI_ENV_DEFAULT_SLOTS,
        MpiImplementation::Intel => MPI_ENV_INTEL_PERHOST,
    };
    topology::upsert_env(container, slots_env, &num_proc_per_node.to_string());

    Ok(())
}

/// Derive a launcher group from the trainer template: one pod, starting
/// after the initializers complete and the workers report ready.
fn add_launcher_group(assembly: &mut Assembly) -> Result<(), AssemblyError> {
    let trainer = topology::job(&assembly.spec, JOB_TRAINER_NODE).ok_or_else(|| {
        AssemblyError::UnknownTargetJob {
            job: JOB_TRAINER_NODE.to_string(),
        }
    })?;

    let mut launcher = trainer.clone();
    launcher.name = JOB_LAUNCHER.to_string();
    launcher.replicas = 1;
    launcher.parallelism = Some(1);
    launcher.completions = Some(1);
    launcher.depends_on = Vec::new();
    if topology::job(&assembly.spec, JOB_INITIALIZER).is_some() {
        launcher.depends_on.push(DependsOn {
            name: JOB_INITIALIZER.to_string(),
            status: DependencyStatus::Complete,
        });
    }
    launcher.depends_on.push(DependsOn {
        name: JOB_TRAINER_NODE.to_string(),
        status: DependencyStatus::Ready,
    });

    // Gang sizing ran before this plugin; account for the new group so
    // minMember stays the sum of replicas over all groups.
    if let Some(pod_group) = assembly.pod_group.as_mut() {
        pod_group.min_member += launcher.replicas;
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for (name, qty) in &pod_group.min_resources {
            totals.insert(name.clone(), quantity::parse_milli(&qty.0).map_err(AssemblyError::Common)?);
        }
        topology::accumulate_pod_requests(&launcher, &mut totals)?;
        pod_group.min_resources = quantity::to_resource_list(&totals);
    }

    assembly.spec.replicated_jobs.push(launcher);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger;
    use crate::plugins::Plugin;
    use crate::testing::{initializer_group, make_runtime, make_train_job, trainer_group};
    use tensile_common::crd::{
        CoschedulingPolicy, MlPolicy, MpiPolicy, PodGroupPolicy, TrainingRuntimeSpec,
    };

    fn mpi_runtime(num_nodes: Option<u32>, mpi: MpiPolicy) -> TrainingRuntimeSpec {
        let mut runtime = make_runtime(
            num_nodes,
            vec![
                trainer_group("test:runtime", "1"),
                initializer_group("test:runtime", "1"),
            ],
        );
        runtime.ml_policy = Some(MlPolicy {
            num_nodes,
            torch: None,
            mpi: Some(mpi),
        });
        runtime
    }

    #[test]
    fn adds_launcher_with_dependency_edges() {
        let runtime = mpi_runtime(
            Some(4),
            MpiPolicy {
                num_proc_per_node: Some(2),
                ..Default::default()
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        let launcher = crate::topology::job(&assembly.spec, JOB_LAUNCHER).unwrap();
        assert_eq!(launcher.replicas, 1);
        assert_eq!(launcher.depends_on.len(), 2);
        assert_eq!(launcher.depends_on[0].name, JOB_INITIALIZER);
        assert_eq!(launcher.depends_on[0].status, DependencyStatus::Complete);
        assert_eq!(launcher.depends_on[1].name, JOB_TRAINER_NODE);
        assert_eq!(launcher.depends_on[1].status, DependencyStatus::Ready);
    }

    #[test]
    fn propagates_process_count_into_launch_args() {
        let runtime = mpi_runtime(
            Some(4),
            MpiPolicy {
                num_proc_per_node: Some(2),
                ..Default::default()
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        let launcher = crate::topology::job(&assembly.spec, JOB_LAUNCHER).unwrap();
        let args = launcher.template.spec.as_ref().unwrap().containers[0]
            .args
            .as_ref()
            .unwrap();
        let tail: Vec<&str> = args.iter().map(String::as_str).collect();
        assert!(tail.ends_with(&["--npernode", "2", "-np", "8"]));
    }

    #[test]
    fn launcher_counts_when_running_as_node() {
        let runtime = mpi_runtime(
            Some(4),
            MpiPolicy {
                num_proc_per_node: Some(2),
                run_launcher_as_node: true,
                ..Default::default()
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        let launcher = crate::topology::job(&assembly.spec, JOB_LAUNCHER).unwrap();
        let args = launcher.template.spec.as_ref().unwrap().containers[0]
            .args
            .as_ref()
            .unwrap();
        let tail: Vec<&str> = args.iter().map(String::as_str).collect();
        assert!(tail.ends_with(&["--npernode", "2", "-np", "10"]));
    }

    #[test]
    fn bumps_gang_descriptor_for_added_launcher() {
        let mut runtime = mpi_runtime(
            Some(4),
            MpiPolicy {
                num_proc_per_node: Some(2),
                ..Default::default()
            },
        );
        runtime.pod_group_policy = Some(PodGroupPolicy {
            coscheduling: Some(CoschedulingPolicy {
                schedule_timeout_seconds: Some(120),
            }),
        });
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        for plugin in Plugin::default_chain() {
            plugin.apply(&mut assembly, &runtime, &job).unwrap();
        }

        // 4 trainer nodes + 1 initializer + 1 launcher
        let pod_group = assembly.pod_group.unwrap();
        assert_eq!(pod_group.min_member, 6);
        // 4 + 2 (initializer containers) + 1 (launcher, cloned trainer) CPUs
        assert_eq!(pod_group.min_resources["cpu"].0, "7");
    }

    #[test]
    fn template_declared_launcher_left_in_place() {
        let mut runtime = mpi_runtime(Some(2), MpiPolicy::default());
        let mut launcher = trainer_group("launcher:runtime", "1");
        launcher.name = JOB_LAUNCHER.to_string();
        launcher.replicas = 1;
        runtime.template.spec.replicated_jobs.push(launcher);
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        let launchers: Vec<_> = assembly
            .spec
            .replicated_jobs
            .iter()
            .filter(|g| g.name == JOB_LAUNCHER)
            .collect();
        assert_eq!(launchers.len(), 1);
        assert_eq!(
            launchers[0].template.spec.as_ref().unwrap().containers[0]
                .image
                .as_deref(),
            Some("launcher:runtime")
        );
    }

    #[test]
    fn slots_env_matches_mpi_implementation() {
        let runtime = mpi_runtime(
            Some(2),
            MpiPolicy {
                num_proc_per_node: Some(4),
                mpi_implementation: MpiImplementation::Intel,
                ..Default::default()
            },
        );
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        let launcher = crate::topology::job(&assembly.spec, JOB_LAUNCHER).unwrap();
        let env = launcher.template.spec.as_ref().unwrap().containers[0]
            .env
            .as_ref()
            .unwrap();
        assert!(env
            .iter()
            .any(|e| e.name == MPI_ENV_INTEL_PERHOST && e.value.as_deref() == Some("4")));
        assert!(!env.iter().any(|e| e.name == MPI_ENV_DEFAULT_SLOTS));
    }

    #[test]
    fn no_mpi_policy_is_a_no_op() {
        let runtime = make_runtime(Some(2), vec![trainer_group("test:runtime", "1")]);
        let job = make_train_job("test-job", None);

        let mut assembly = Assembly::new(merger::merge(&runtime, &job).unwrap());
        apply(&mut assembly, &runtime, &job).unwrap();

        assert!(crate::topology::job(&assembly.spec, JOB_LAUNCHER).is_none());
    }
}
