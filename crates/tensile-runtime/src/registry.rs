//! Runtime registry — resolves a TrainJob's runtimeRef to a loaded template
//!
//! The registry is the pipeline's only I/O: a single bounded lookup
//! against the API server. A missing template maps to the distinguished
//! [`AssemblyError::RuntimeNotFound`] so callers can tell a dangling
//! reference apart from transport failures; no default is ever
//! substituted and no retry happens here.

use kube::{Api, Client};
use tracing::debug;

use tensile_common::crd::{ClusterTrainingRuntime, RuntimeRef, TrainingRuntime, TrainingRuntimeSpec};
use tensile_common::{CLUSTER_TRAINING_RUNTIME_KIND, TRAINING_RUNTIME_KIND};

use crate::error::AssemblyError;

/// Scope of a referenced runtime kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuntimeScope {
    Cluster,
    Namespaced,
}

/// Map a runtimeRef kind to its scope. An unset kind defaults to the
/// cluster-scoped template, anything unrecognized is rejected.
pub(crate) fn scope_for(kind: Option<&str>) -> Result<RuntimeScope, AssemblyError> {
    match kind {
        None => Ok(RuntimeScope::Cluster),
        Some(CLUSTER_TRAINING_RUNTIME_KIND) => Ok(RuntimeScope::Cluster),
        Some(TRAINING_RUNTIME_KIND) => Ok(RuntimeScope::Namespaced),
        Some(other) => Err(AssemblyError::UnsupportedRuntimeKind(other.to_string())),
    }
}

/// Resolves runtime references against the cluster store
pub struct RuntimeRegistry {
    client: Client,
}

impl RuntimeRegistry {
    /// Create a registry backed by the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve a runtime reference to its spec.
    ///
    /// `namespace` is the TrainJob's namespace, used only for
    /// namespace-scoped references.
    pub async fn resolve(
        &self,
        namespace: &str,
        runtime_ref: &RuntimeRef,
    ) -> Result<TrainingRuntimeSpec, AssemblyError> {
        match scope_for(runtime_ref.kind.as_deref())? {
            RuntimeScope::Cluster => {
                let api: Api<ClusterTrainingRuntime> = Api::all(self.client.clone());
                match api.get(&runtime_ref.name).await {
                    Ok(runtime) => {
                        debug!(runtime = %runtime_ref.name, "resolved cluster training runtime");
                        Ok(runtime.spec.into())
                    }
                    Err(kube::Error::Api(ae)) if ae.code == 404 => {
                        Err(AssemblyError::RuntimeNotFound {
                            kind: CLUSTER_TRAINING_RUNTIME_KIND.to_string(),
                            name: runtime_ref.name.clone(),
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
            RuntimeScope::Namespaced => {
                let api: Api<TrainingRuntime> = Api::namespaced(self.client.clone(), namespace);
                match api.get(&runtime_ref.name).await {
                    Ok(runtime) => {
                        debug!(
                            runtime = %runtime_ref.name,
                            namespace = %namespace,
                            "resolved training runtime"
                        );
                        Ok(runtime.spec)
                    }
                    Err(kube::Error::Api(ae)) if ae.code == 404 => {
                        Err(AssemblyError::RuntimeNotFound {
                            kind: TRAINING_RUNTIME_KIND.to_string(),
                            name: runtime_ref.name.clone(),
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_kind_defaults_to_cluster_scope() {
        assert_eq!(scope_for(None).unwrap(), RuntimeScope::Cluster);
    }

    #[test]
    fn known_kinds_map_to_scopes() {
        assert_eq!(
            scope_for(Some("ClusterTrainingRuntime")).unwrap(),
            RuntimeScope::Cluster
        );
        assert_eq!(
            scope_for(Some("TrainingRuntime")).unwrap(),
            RuntimeScope::Namespaced
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let err = scope_for(Some("PyTorchJob")).unwrap_err();
        assert!(matches!(err, AssemblyError::UnsupportedRuntimeKind(ref k) if k == "PyTorchJob"));
    }

    #[test]
    fn not_found_error_is_distinguishable() {
        let err = AssemblyError::RuntimeNotFound {
            kind: "ClusterTrainingRuntime".to_string(),
            name: "test-runtime".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no ClusterTrainingRuntime named 'test-runtime' found"
        );
        assert!(matches!(err, AssemblyError::RuntimeNotFound { .. }));
    }
}
