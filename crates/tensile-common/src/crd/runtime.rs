//! TrainingRuntime and ClusterTrainingRuntime CRD types
//!
//! A runtime is a reusable blueprint for a distributed training job:
//! a replicated-job topology template plus the cross-cutting policies
//! (gang scheduling, torch elastic launch, MPI launch) the assembly
//! pipeline injects into it. The two kinds share one spec shape; the
//! cluster-scoped kind exists so operators can publish templates
//! usable from any namespace.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use tensile_jobset::JobSetSpec;

// =============================================================================
// Distribution policy
// =============================================================================

/// Distribution policy: how training work is spread across nodes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MlPolicy {
    /// Number of training nodes; a TrainJob may override this explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_nodes: Option<u32>,

    /// Torch launch policy (at most one of torch/mpi may be set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torch: Option<TorchPolicy>,

    /// MPI launcher/worker launch policy (at most one of torch/mpi may be set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpi: Option<MpiPolicy>,
}

/// Torch distributed launch configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TorchPolicy {
    /// Processes per node: "auto", "cpu", "gpu", or an integer.
    /// Replaces the deprecated `elastic.nProcPerNode`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_proc_per_node: Option<String>,

    /// Elastic launch configuration; when set, node count may vary
    /// between `minNodes` and `maxNodes` at runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic: Option<TorchElasticPolicy>,
}

/// Torch elastic rendezvous configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TorchElasticPolicy {
    /// Lower node bound; defaults to the resolved node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_nodes: Option<u32>,

    /// Upper node bound; defaults to the resolved node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<u32>,

    /// Rendezvous backend identifier
    #[serde(default = "default_rdzv_backend")]
    pub rdzv_backend: String,

    /// Deprecated: use `spec.mlPolicy.torch.numProcPerNode` instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_proc_per_node: Option<u32>,
}

impl Default for TorchElasticPolicy {
    fn default() -> Self {
        Self {
            min_nodes: None,
            max_nodes: None,
            rdzv_backend: default_rdzv_backend(),
            n_proc_per_node: None,
        }
    }
}

fn default_rdzv_backend() -> String {
    "c10d".to_string()
}

/// MPI launcher/worker launch configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MpiPolicy {
    /// Slots (processes) per worker node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_proc_per_node: Option<u32>,

    /// MPI implementation the launcher image ships
    #[serde(default)]
    pub mpi_implementation: MpiImplementation,

    /// Whether the launcher pod also runs training processes and
    /// therefore counts toward the total process count
    #[serde(default)]
    pub run_launcher_as_node: bool,
}

/// Supported MPI implementations
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum MpiImplementation {
    /// OpenMPI (default)
    #[default]
    OpenMPI,
    /// Intel MPI
    Intel,
}

impl std::fmt::Display for MpiImplementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenMPI => write!(f, "OpenMPI"),
            Self::Intel => write!(f, "Intel"),
        }
    }
}

// =============================================================================
// Gang-scheduling policy
// =============================================================================

/// Gang-scheduling policy for the assembled topology
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodGroupPolicy {
    /// Coscheduling via the scheduler-plugins PodGroup API; absent means
    /// no gang scheduling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coscheduling: Option<CoschedulingPolicy>,
}

/// Coscheduling configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoschedulingPolicy {
    /// Seconds the scheduler waits for the full gang before rejecting it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_timeout_seconds: Option<i32>,
}

// =============================================================================
// Topology template
// =============================================================================

/// Replicated-job topology template embedded in a runtime
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSetTemplateSpec {
    /// Labels and annotations copied onto the emitted JobSet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TemplateMetadata>,

    /// The topology itself
    pub spec: JobSetSpec,
}

/// Metadata stamped onto objects built from a template
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Labels to copy
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Annotations to copy
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

// =============================================================================
// CRDs
// =============================================================================

/// Namespace-scoped training runtime template
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "tensile.dev",
    version = "v1alpha1",
    kind = "TrainingRuntime",
    plural = "trainingruntimes",
    shortname = "tr",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRuntimeSpec {
    /// Distribution policy injected into the topology at assembly time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_policy: Option<MlPolicy>,

    /// Gang-scheduling policy; when set, assembly emits a PodGroup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_group_policy: Option<PodGroupPolicy>,

    /// The replicated-job topology template
    pub template: JobSetTemplateSpec,
}

/// Cluster-scoped training runtime template
///
/// Same spec shape as [`TrainingRuntimeSpec`]; published by cluster
/// operators and resolvable from any namespace.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "tensile.dev",
    version = "v1alpha1",
    kind = "ClusterTrainingRuntime",
    plural = "clustertrainingruntimes",
    shortname = "ctr"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTrainingRuntimeSpec {
    /// Distribution policy injected into the topology at assembly time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_policy: Option<MlPolicy>,

    /// Gang-scheduling policy; when set, assembly emits a PodGroup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_group_policy: Option<PodGroupPolicy>,

    /// The replicated-job topology template
    pub template: JobSetTemplateSpec,
}

impl From<ClusterTrainingRuntimeSpec> for TrainingRuntimeSpec {
    fn from(spec: ClusterTrainingRuntimeSpec) -> Self {
        Self {
            ml_policy: spec.ml_policy,
            pod_group_policy: spec.pod_group_policy,
            template: spec.template,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
