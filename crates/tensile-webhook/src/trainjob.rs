//! TrainJob admission rules
//!
//! Cross-field and immutability validation for training submissions.
//! All rules run; the returned lists carry every violation and every
//! warning, independently of each other.

use tensile_common::crd::{validate_dns1035_label, TrainJob};
use tensile_common::{
    API_GROUP, CLUSTER_TRAINING_RUNTIME_KIND, MANAGER_MULTIKUEUE, MANAGER_TRAINJOB_CONTROLLER,
    TRAINING_RUNTIME_KIND,
};

use crate::field::{FieldError, FieldPath};

/// Validate a TrainJob submission. `old` is the stored object on update,
/// `None` on create.
pub fn validate_train_job(
    old: Option<&TrainJob>,
    new: &TrainJob,
) -> (Vec<String>, Vec<FieldError>) {
    let warnings = Vec::new();
    let mut errors = Vec::new();

    if let Some(name) = new.metadata.name.as_deref() {
        if let Err(detail) = validate_dns1035_label(name) {
            errors.push(FieldError::invalid(
                FieldPath::new("metadata").child("name"),
                name,
                detail,
            ));
        }
    }

    let spec_path = FieldPath::new("spec");

    let ref_path = spec_path.clone().child("runtimeRef");
    if new.spec.runtime_ref.name.is_empty() {
        errors.push(FieldError::required(
            ref_path.clone().child("name"),
            "runtime name must be set",
        ));
    }
    if let Some(kind) = new.spec.runtime_ref.kind.as_deref() {
        if kind != TRAINING_RUNTIME_KIND && kind != CLUSTER_TRAINING_RUNTIME_KIND {
            errors.push(FieldError::not_supported(
                ref_path.clone().child("kind"),
                kind,
                &[CLUSTER_TRAINING_RUNTIME_KIND, TRAINING_RUNTIME_KIND],
            ));
        }
    }
    if let Some(api_group) = new.spec.runtime_ref.api_group.as_deref() {
        if api_group != API_GROUP {
            errors.push(FieldError::not_supported(
                ref_path.child("apiGroup"),
                api_group,
                &[API_GROUP],
            ));
        }
    }

    let managed_by_path = spec_path.clone().child("managedBy");
    if let Some(managed_by) = new.spec.managed_by.as_deref() {
        if managed_by != MANAGER_TRAINJOB_CONTROLLER && managed_by != MANAGER_MULTIKUEUE {
            errors.push(FieldError::not_supported(
                managed_by_path.clone(),
                managed_by,
                &[MANAGER_MULTIKUEUE, MANAGER_TRAINJOB_CONTROLLER],
            ));
        }
    }
    if let Some(old) = old {
        if old.spec.managed_by != new.spec.managed_by {
            errors.push(FieldError::invalid(
                managed_by_path,
                old.spec.managed_by.as_deref().unwrap_or_default(),
                "field is immutable",
            ));
        }
    }

    if let Some(trainer) = &new.spec.trainer {
        let trainer_path = spec_path.child("trainer");
        if trainer.num_nodes == Some(0) {
            errors.push(FieldError::invalid(
                trainer_path.clone().child("numNodes"),
                "0",
                "must be greater than or equal to 1",
            ));
        }
        if let Some(num_proc) = trainer.num_proc_per_node.as_deref() {
            let is_symbolic = matches!(num_proc, "auto" | "cpu" | "gpu");
            if !is_symbolic && num_proc.parse::<u32>().is_err() {
                errors.push(FieldError::invalid(
                    trainer_path.child("numProcPerNode"),
                    num_proc,
                    "must be \"auto\", \"cpu\", \"gpu\", or an integer",
                ));
            }
        }
    }

    (warnings, errors)
}
