//! TrainJob CRD types
//!
//! A TrainJob is one training submission: a reference to a runtime
//! template plus the per-run overrides (trainer container, dataset and
//! model initializers, node count, pod-spec tweaks). The assembly
//! pipeline merges it with the referenced runtime; the reconciler owns
//! the status field.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, ResourceRequirements, Toleration};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Runtime reference
// =============================================================================

/// Reference to the runtime template a TrainJob is built from
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeRef {
    /// API group of the referenced runtime; defaults to the Tensile group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,

    /// `TrainingRuntime` or `ClusterTrainingRuntime`; defaults to the
    /// cluster-scoped kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Name of the referenced runtime
    pub name: String,
}

// =============================================================================
// Overrides
// =============================================================================

/// Trainer container and sizing overrides
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerSpec {
    /// Trainer container image; absent keeps the template's image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Trainer container command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Trainer container args
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Per-node compute resources for the trainer container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_per_node: Option<ResourceRequirements>,

    /// Explicit node count; wins over the runtime's `mlPolicy.numNodes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_nodes: Option<u32>,

    /// Processes per node: "auto", "cpu", "gpu", or an integer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_proc_per_node: Option<String>,

    /// Extra environment for the trainer container; overrides same-name
    /// template entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// Dataset or model initializer overrides
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializerConfig {
    /// Artifact location, surfaced to the container as `STORAGE_URI`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,

    /// Initializer container image; absent keeps the template's image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Extra environment for the initializer container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// Pod-spec tweaks targeted at named replicated-job groups
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpecOverride {
    /// Names of the template groups this override applies to; every name
    /// must exist in the runtime's topology
    pub target_jobs: Vec<String>,

    /// Node selector entries merged into the targeted pod specs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    /// Service account for the targeted pods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Tolerations appended to the targeted pod specs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,
}

// =============================================================================
// CRD
// =============================================================================

/// One training submission built from a runtime template
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "tensile.dev",
    version = "v1alpha1",
    kind = "TrainJob",
    plural = "trainjobs",
    shortname = "tj",
    namespaced,
    status = "TrainJobStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TrainJobSpec {
    /// The runtime template this job is built from
    pub runtime_ref: RuntimeRef,

    /// Trainer container and sizing overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer: Option<TrainerSpec>,

    /// Dataset initializer overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_config: Option<InitializerConfig>,

    /// Model initializer overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<InitializerConfig>,

    /// Pod-spec tweaks targeted at named template groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pod_spec_overrides: Vec<PodSpecOverride>,

    /// Create the topology suspended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,

    /// Controller responsible for this job; immutable after creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,
}

/// Lifecycle phase of a TrainJob
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub enum TrainJobPhase {
    /// Waiting for assembly and scheduling
    #[default]
    Pending,
    /// Topology objects created and running
    Running,
    /// All groups completed
    Succeeded,
    /// Training failed
    Failed,
}

impl std::fmt::Display for TrainJobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Status of a TrainJob, owned by the reconciler
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainJobStatus {
    /// Current phase of the job lifecycle
    #[serde(default)]
    pub phase: TrainJobPhase,

    /// Human-readable message about current state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation last acted upon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_ref_defaults_to_cluster_kind() {
        let r#ref: RuntimeRef = serde_json::from_str(r#"{"name": "torch-dist"}"#).unwrap();
        assert_eq!(r#ref.name, "torch-dist");
        assert!(r#ref.kind.is_none());
        assert!(r#ref.api_group.is_none());
    }

    #[test]
    fn train_job_spec_minimal() {
        let spec: TrainJobSpec =
            serde_json::from_str(r#"{"runtimeRef": {"name": "torch-dist"}}"#).unwrap();
        assert!(spec.trainer.is_none());
        assert!(spec.pod_spec_overrides.is_empty());
        assert!(spec.suspend.is_none());
    }

    #[test]
    fn trainer_spec_serializes_camel_case() {
        let trainer = TrainerSpec {
            image: Some("pytorch/pytorch:2.4".to_string()),
            num_nodes: Some(8),
            num_proc_per_node: Some("gpu".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&trainer).unwrap();
        assert_eq!(json["numNodes"], 8);
        assert_eq!(json["numProcPerNode"], "gpu");
        assert!(json.get("command").is_none());
    }

    #[test]
    fn phase_display() {
        assert_eq!(TrainJobPhase::Pending.to_string(), "Pending");
        assert_eq!(TrainJobPhase::Running.to_string(), "Running");
        assert_eq!(TrainJobPhase::Succeeded.to_string(), "Succeeded");
        assert_eq!(TrainJobPhase::Failed.to_string(), "Failed");
    }
}
