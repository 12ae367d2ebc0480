//! Assembly-specific error types

/// Errors produced while assembling a TrainJob into cluster objects
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// The referenced runtime template does not exist. Distinguished from
    /// transport failures so callers can react to a dangling reference
    /// without retrying.
    #[error("no {kind} named '{name}' found")]
    RuntimeNotFound {
        /// Kind of the missing runtime
        kind: String,
        /// Name the TrainJob referenced
        name: String,
    },

    #[error("unsupported runtime kind '{0}' in runtimeRef")]
    UnsupportedRuntimeKind(String),

    /// The TrainJob targets a replicated job the template does not declare
    #[error("replicated job '{job}' is not declared by the runtime template")]
    UnknownTargetJob {
        /// Name of the missing replicated job
        job: String,
    },

    /// A targeted replicated job exists but lacks the expected container
    #[error("replicated job '{job}' has no container named '{container}'")]
    UnknownTargetContainer {
        /// Name of the replicated job
        job: String,
        /// Name of the missing container
        container: String,
    },

    /// A replicated job's pod template declares no containers at all
    #[error("replicated job '{job}' has no containers")]
    EmptyPodTemplate {
        /// Name of the replicated job
        job: String,
    },

    #[error("missing namespace on TrainJob")]
    MissingNamespace,

    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Common(#[from] tensile_common::Error),
}
