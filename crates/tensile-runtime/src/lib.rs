//! Runtime object-assembly pipeline for Tensile
//!
//! Turns a `TrainJob` plus its referenced runtime template into the
//! JobSet and PodGroup objects the cluster scheduler consumes:
//! registry resolve → spec merge → policy plugin chain → object build.
//! Everything past the registry lookup is a pure function of its
//! inputs; repeated assembly of the same pair produces identical
//! objects.

mod builder;
mod error;
mod merger;
mod plugins;
mod registry;
pub mod testing;
mod topology;

pub use builder::AssembledTrainJob;
pub use error::AssemblyError;
pub use merger::merge;
pub use plugins::{Assembly, Plugin};
pub use registry::RuntimeRegistry;

use kube::{Client, ResourceExt};
use tracing::info;

use tensile_common::crd::{TrainJob, TrainingRuntimeSpec};

/// Assemble the output objects for a TrainJob, resolving its runtime
/// reference against the cluster.
///
/// Fails with [`AssemblyError::RuntimeNotFound`] when the reference is
/// dangling; no objects are produced on any error.
pub async fn assemble(client: &Client, job: &TrainJob) -> Result<AssembledTrainJob, AssemblyError> {
    let namespace = job
        .metadata
        .namespace
        .as_deref()
        .ok_or(AssemblyError::MissingNamespace)?;

    let registry = RuntimeRegistry::new(client.clone());
    let runtime = registry.resolve(namespace, &job.spec.runtime_ref).await?;
    assemble_for_runtime(&runtime, job)
}

/// Assemble the output objects for a TrainJob against an already-resolved
/// runtime spec. Pure: no I/O, the template is never mutated.
pub fn assemble_for_runtime(
    runtime: &TrainingRuntimeSpec,
    job: &TrainJob,
) -> Result<AssembledTrainJob, AssemblyError> {
    let spec = merger::merge(runtime, job)?;

    let mut assembly = Assembly::new(spec);
    for plugin in Plugin::default_chain() {
        plugin.apply(&mut assembly, runtime, job)?;
    }

    let assembled = builder::build(assembly, runtime, job);
    info!(
        job = %job.name_any(),
        groups = assembled.job_set.spec.replicated_jobs.len(),
        gang = assembled.pod_group.is_some(),
        "assembled train job"
    );
    Ok(assembled)
}
