//! JobSet and PodGroup serialization types for Tensile training workloads
//!
//! Typed representation of the two objects the runtime pipeline emits:
//! the `jobset.x-k8s.io/v1alpha2` JobSet topology and the
//! `scheduling.x-k8s.io/v1alpha1` PodGroup gang descriptor.
//! Pure types crate — no controller logic.

mod types;

pub use types::{
    DependencyStatus, DependsOn, JobSet, JobSetSpec, ObjectMetadata, OwnerReference, PodGroup,
    PodGroupSpec, ReplicatedJob,
};

/// API version of the emitted JobSet resource
pub const JOBSET_API_VERSION: &str = "jobset.x-k8s.io/v1alpha2";

/// Kind of the emitted JobSet resource
pub const JOBSET_KIND: &str = "JobSet";

/// API version of the emitted PodGroup resource
pub const POD_GROUP_API_VERSION: &str = "scheduling.x-k8s.io/v1alpha1";

/// Kind of the emitted PodGroup resource
pub const POD_GROUP_KIND: &str = "PodGroup";
