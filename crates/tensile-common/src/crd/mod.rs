//! Custom Resource Definitions for Tensile
//!
//! This module contains all CRD definitions used by the Tensile operator.

mod runtime;
mod trainjob;

pub use runtime::{
    ClusterTrainingRuntime, ClusterTrainingRuntimeSpec, CoschedulingPolicy, JobSetTemplateSpec,
    MlPolicy, MpiImplementation, MpiPolicy, PodGroupPolicy, TemplateMetadata, TorchElasticPolicy,
    TorchPolicy, TrainingRuntime, TrainingRuntimeSpec,
};
pub use trainjob::{
    InitializerConfig, PodSpecOverride, RuntimeRef, TrainJob, TrainJobPhase, TrainJobSpec,
    TrainJobStatus, TrainerSpec,
};

/// Validate an RFC 1035 DNS label (lowercase alphanumeric and hyphens,
/// must start with a letter and end alphanumeric, at most 63 characters).
///
/// Resource names referenced in generated child-object names must meet
/// this so the derived names are themselves valid.
pub fn validate_dns1035_label(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if name.len() > 63 {
        return Err(format!("name '{name}' exceeds 63 characters"));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or('-');
    if !first.is_ascii_lowercase() {
        return Err(format!("name '{name}' must start with a lowercase letter"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "name '{name}' may only contain lowercase letters, digits, and hyphens"
        ));
    }
    if name.ends_with('-') {
        return Err(format!("name '{name}' must end with an alphanumeric character"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_dns1035_label;

    #[test]
    fn accepts_valid_labels() {
        assert!(validate_dns1035_label("test-job").is_ok());
        assert!(validate_dns1035_label("a").is_ok());
        assert!(validate_dns1035_label("torch-dist-2").is_ok());
    }

    #[test]
    fn rejects_invalid_labels() {
        assert!(validate_dns1035_label("").is_err());
        assert!(validate_dns1035_label("0-test").is_err());
        assert!(validate_dns1035_label("Test").is_err());
        assert!(validate_dns1035_label("test-").is_err());
        assert!(validate_dns1035_label("test_job").is_err());
        assert!(validate_dns1035_label(&"a".repeat(64)).is_err());
    }
}
