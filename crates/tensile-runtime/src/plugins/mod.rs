//! Policy plugin chain
//!
//! Cross-cutting scheduling policy is injected by a closed set of
//! plugins applied in a fixed order: gang scheduling first, then the
//! framework launch plugins, so later plugins see earlier mutations.
//! The order is an explicit constructed sequence, not a registration
//! side effect. Each plugin only writes keys it owns: the pod-group
//! label for coscheduling, `PET_*` environment for torch, the launcher
//! group and MPI launch arguments for MPI.

mod coscheduling;
mod mpi;
mod torch;

use tensile_common::crd::{TrainJob, TrainingRuntimeSpec};
use tensile_jobset::{JobSetSpec, PodGroupSpec};

use crate::error::AssemblyError;

/// Mutable state threaded through the plugin chain
pub struct Assembly {
    /// The merged topology, mutated in place by plugins
    pub spec: JobSetSpec,
    /// Gang descriptor produced by the coscheduling plugin, if any
    pub pod_group: Option<PodGroupSpec>,
}

impl Assembly {
    /// Wrap a merged topology with no auxiliary outputs yet
    pub fn new(spec: JobSetSpec) -> Self {
        Self {
            spec,
            pod_group: None,
        }
    }
}

/// One policy family's transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plugin {
    /// Gang-scheduling sizing and pod-group labeling
    Coscheduling,
    /// Torch distributed/elastic launch environment
    Torch,
    /// MPI launcher/worker topology rewrite
    Mpi,
}

impl Plugin {
    /// The fixed chain order: gang scheduling first, then framework plugins
    pub fn default_chain() -> Vec<Plugin> {
        vec![Plugin::Coscheduling, Plugin::Torch, Plugin::Mpi]
    }

    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Plugin::Coscheduling => "coscheduling",
            Plugin::Torch => "torch",
            Plugin::Mpi => "mpi",
        }
    }

    /// Apply this plugin to the assembly. Plugins not matching the
    /// runtime's policies are no-ops.
    pub fn apply(
        &self,
        assembly: &mut Assembly,
        runtime: &TrainingRuntimeSpec,
        job: &TrainJob,
    ) -> Result<(), AssemblyError> {
        match self {
            Plugin::Coscheduling => coscheduling::apply(assembly, runtime, job),
            Plugin::Torch => torch::apply(assembly, runtime, job),
            Plugin::Mpi => mpi::apply(assembly, runtime, job),
        }
    }
}
