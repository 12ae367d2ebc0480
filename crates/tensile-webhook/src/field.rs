//! Field-scoped validation errors
//!
//! Validation runs every rule to completion and reports all violations
//! together, each scoped to the exact field path that produced it, in
//! the style of the Kubernetes API machinery's field error lists.

use std::fmt;

/// A dotted path into a submitted object (`spec.mlPolicy.torch`,
/// `spec.template.spec.replicatedJobs[trainer-node].replicas`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    /// Start a path at a root field
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    /// Append a child field
    pub fn child(mut self, name: &str) -> Self {
        self.0.push('.');
        self.0.push_str(name);
        self
    }

    /// Append a map key
    pub fn key(mut self, key: &str) -> Self {
        self.0.push('[');
        self.0.push_str(key);
        self.0.push(']');
        self
    }

    /// Append a list index
    pub fn index(mut self, index: usize) -> Self {
        self.0.push('[');
        self.0.push_str(&index.to_string());
        self.0.push(']');
        self
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a field violation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field is missing or empty
    Required,
    /// The value is malformed or violates a constraint
    Invalid,
    /// The field must not be set in this combination
    Forbidden,
    /// The value is outside a closed set of permitted values
    NotSupported,
}

/// One field-scoped violation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the offending field
    pub path: FieldPath,
    /// Violation category
    pub kind: ErrorKind,
    /// Human-readable detail
    pub detail: String,
    /// The rejected value, where meaningful
    pub bad_value: Option<String>,
    /// Permitted values for `NotSupported` violations
    pub supported: Vec<String>,
}

impl FieldError {
    /// A required field is missing or empty
    pub fn required(path: FieldPath, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind: ErrorKind::Required,
            detail: detail.into(),
            bad_value: None,
            supported: Vec::new(),
        }
    }

    /// The value is malformed or violates a constraint
    pub fn invalid(
        path: FieldPath,
        bad_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            path,
            kind: ErrorKind::Invalid,
            detail: detail.into(),
            bad_value: Some(bad_value.into()),
            supported: Vec::new(),
        }
    }

    /// The field must not be set in this combination
    pub fn forbidden(path: FieldPath, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind: ErrorKind::Forbidden,
            detail: detail.into(),
            bad_value: None,
            supported: Vec::new(),
        }
    }

    /// The value is outside a closed set of permitted values
    pub fn not_supported(
        path: FieldPath,
        bad_value: impl Into<String>,
        supported: &[&str],
    ) -> Self {
        Self {
            path,
            kind: ErrorKind::NotSupported,
            detail: String::new(),
            bad_value: Some(bad_value.into()),
            supported: supported.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Required => {
                write!(f, "{}: Required value", self.path)?;
                if !self.detail.is_empty() {
                    write!(f, ": {}", self.detail)?;
                }
                Ok(())
            }
            ErrorKind::Invalid => write!(
                f,
                "{}: Invalid value: \"{}\": {}",
                self.path,
                self.bad_value.as_deref().unwrap_or_default(),
                self.detail
            ),
            ErrorKind::Forbidden => write!(f, "{}: Forbidden: {}", self.path, self.detail),
            ErrorKind::NotSupported => write!(
                f,
                "{}: Unsupported value: \"{}\": supported values: {}",
                self.path,
                self.bad_value.as_deref().unwrap_or_default(),
                self.supported.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_rendering() {
        let path = FieldPath::new("spec")
            .child("template")
            .child("spec")
            .child("replicatedJobs")
            .key("trainer-node")
            .child("template")
            .child("spec")
            .child("containers")
            .index(0)
            .child("image");
        assert_eq!(
            path.to_string(),
            "spec.template.spec.replicatedJobs[trainer-node].template.spec.containers[0].image"
        );
    }

    #[test]
    fn required_rendering() {
        let err = FieldError::required(
            FieldPath::new("spec").child("runtimeRef").child("name"),
            "runtime name must be set",
        );
        assert_eq!(
            err.to_string(),
            "spec.runtimeRef.name: Required value: runtime name must be set"
        );
    }

    #[test]
    fn invalid_rendering_cites_value() {
        let err = FieldError::invalid(
            FieldPath::new("spec").child("managedBy"),
            "kueue.x-k8s.io/multikueue",
            "field is immutable",
        );
        assert_eq!(
            err.to_string(),
            "spec.managedBy: Invalid value: \"kueue.x-k8s.io/multikueue\": field is immutable"
        );
    }

    #[test]
    fn not_supported_lists_permitted_values() {
        let err = FieldError::not_supported(
            FieldPath::new("spec").child("managedBy"),
            "other-controller",
            &["a-controller", "b-controller"],
        );
        assert_eq!(
            err.to_string(),
            "spec.managedBy: Unsupported value: \"other-controller\": supported values: a-controller, b-controller"
        );
    }

    #[test]
    fn forbidden_rendering() {
        let err = FieldError::forbidden(
            FieldPath::new("spec").child("replicas"),
            "must be 1 for singleton role groups",
        );
        assert_eq!(
            err.to_string(),
            "spec.replicas: Forbidden: must be 1 for singleton role groups"
        );
    }
}
