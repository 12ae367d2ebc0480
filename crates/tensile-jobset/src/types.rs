//! JobSet and PodGroup serialization types
//!
//! Uses serde for JSON serialization compatible with server-side apply.
//! The JobSet spec types also derive `JsonSchema` because runtime CRDs
//! embed them as the replicated-job topology template.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// JobSet resource (`jobset.x-k8s.io/v1alpha2` Kind: JobSet)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSet {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMetadata,
    pub spec: JobSetSpec,
}

/// PodGroup resource (`scheduling.x-k8s.io/v1alpha1` Kind: PodGroup)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodGroup {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMetadata,
    pub spec: PodGroupSpec,
}

/// Metadata carried by emitted resources
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

/// JobSet spec — the replicated-job topology
///
/// Also used inside `TrainingRuntime` CRDs as the topology template, so
/// it derives `JsonSchema` alongside serde.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSetSpec {
    /// Named homogeneous pod groups making up the distributed job
    #[serde(default)]
    pub replicated_jobs: Vec<ReplicatedJob>,

    /// Suspend flag propagated from the TrainJob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
}

/// A single replicated-job group within a JobSet
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedJob {
    pub name: String,

    /// Number of pods in this group
    #[serde(default = "default_one")]
    pub replicas: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completions: Option<u32>,

    /// Startup ordering edges to other groups in the same JobSet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependsOn>,

    pub template: PodTemplateSpec,
}

fn default_one() -> u32 {
    1
}

/// Dependency edge between replicated-job groups
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependsOn {
    /// Name of the group this one waits for
    pub name: String,
    /// Condition the target group must reach
    pub status: DependencyStatus,
}

/// Condition a dependency target must reach before the dependent starts
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum DependencyStatus {
    /// Target group finished all completions
    #[default]
    Complete,
    /// Target group has all pods ready
    Ready,
}

impl std::fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "Complete"),
            Self::Ready => write!(f, "Ready"),
        }
    }
}

/// PodGroup spec — the sizing contract handed to the coscheduling scheduler
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodGroupSpec {
    /// Minimum number of pods that must be admitted together
    pub min_member: u32,

    /// Minimum aggregate resource requests across all member pods
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub min_resources: BTreeMap<String, Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_timeout_seconds: Option<i32>,
}
