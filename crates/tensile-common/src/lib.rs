//! Common types for Tensile: CRDs, errors, constants, and quantity arithmetic

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod quantity;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group owned by Tensile
pub const API_GROUP: &str = "tensile.dev";

/// Full apiVersion string for Tensile resources
pub const API_VERSION: &str = "tensile.dev/v1alpha1";

/// Kind of the namespaced runtime template
pub const TRAINING_RUNTIME_KIND: &str = "TrainingRuntime";

/// Kind of the cluster-scoped runtime template
pub const CLUSTER_TRAINING_RUNTIME_KIND: &str = "ClusterTrainingRuntime";

/// Kind of the training submission resource
pub const TRAIN_JOB_KIND: &str = "TrainJob";

/// Replicated-job group running the training processes; its replica count
/// always equals the resolved node count
pub const JOB_TRAINER_NODE: &str = "trainer-node";

/// Singleton replicated-job group hosting the dataset and model
/// initializer containers in one pod
pub const JOB_INITIALIZER: &str = "initializer";

/// Singleton replicated-job group running the multi-process launcher
pub const JOB_LAUNCHER: &str = "launcher";

/// Well-known name of the training container inside the trainer-node group
pub const CONTAINER_TRAINER: &str = "trainer";

/// Well-known name of the dataset initializer container
pub const CONTAINER_DATASET_INITIALIZER: &str = "dataset-initializer";

/// Well-known name of the model initializer container
pub const CONTAINER_MODEL_INITIALIZER: &str = "model-initializer";

/// Label stamped on every pod template of a gang-scheduled topology.
/// This is the coupling contract with the coscheduling scheduler and
/// must stay stable across releases.
pub const POD_GROUP_LABEL: &str = "scheduling.x-k8s.io/pod-group";

/// Environment variable carrying the artifact location to initializer containers
pub const ENV_STORAGE_URI: &str = "STORAGE_URI";

/// Torchrun environment variable holding the node count (or elastic `min:max` range)
pub const TORCH_ENV_NUM_NODES: &str = "PET_NNODES";

/// Torchrun environment variable holding the per-node process count
pub const TORCH_ENV_NUM_PROC_PER_NODE: &str = "PET_NPROC_PER_NODE";

/// Torchrun environment variable holding the rendezvous backend identifier
pub const TORCH_ENV_RDZV_BACKEND: &str = "PET_RDZV_BACKEND";

/// Torchrun environment variable holding the rendezvous endpoint
pub const TORCH_ENV_RDZV_ENDPOINT: &str = "PET_RDZV_ENDPOINT";

/// Default port torchrun rendezvous listens on
pub const TORCH_RDZV_PORT: u16 = 29400;

/// OpenMPI environment variable setting the default slot count per host
pub const MPI_ENV_DEFAULT_SLOTS: &str = "OMPI_MCA_orte_set_default_slots";

/// Intel MPI environment variable setting the process count per host
pub const MPI_ENV_INTEL_PERHOST: &str = "I_MPI_PERHOST";

/// managedBy value selecting the built-in TrainJob controller
pub const MANAGER_TRAINJOB_CONTROLLER: &str = "tensile.dev/trainjob-controller";

/// managedBy value delegating the TrainJob to MultiKueue
pub const MANAGER_MULTIKUEUE: &str = "kueue.x-k8s.io/multikueue";
