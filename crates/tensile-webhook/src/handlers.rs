//! Admission review handlers
//!
//! Adapts the HTTP admission boundary to the pure validators: parse the
//! AdmissionReview, run every rule, and answer with the full error list
//! and all warnings. An empty error list admits; any error rejects with
//! the aggregated message so the submitter sees every violation at once.

use axum::Json;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use kube::Resource;
use tracing::{error, info};

use tensile_common::crd::{ClusterTrainingRuntime, TrainJob, TrainingRuntime};

use crate::field::FieldError;
use crate::runtime::validate_training_runtime;
use crate::trainjob::validate_train_job;

/// Build the admission response for a parsed request and its validation
/// outcome.
fn respond<T: Resource>(
    req: &AdmissionRequest<T>,
    warnings: Vec<String>,
    errors: Vec<FieldError>,
) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(req);
    if !errors.is_empty() {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        info!(
            name = %req.name,
            errors = errors.len(),
            "rejecting admission request"
        );
        response = response.deny(message);
    }
    if !warnings.is_empty() {
        response.warnings = Some(warnings);
    }
    response
}

/// Validate TrainJob create/update requests
pub async fn validate_train_jobs(
    Json(body): Json<AdmissionReview<TrainJob>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<TrainJob> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    // Deletes carry no object; nothing to validate
    let Some(new) = req.object.as_ref() else {
        return Json(AdmissionResponse::from(&req).into_review());
    };

    let (warnings, errors) = validate_train_job(req.old_object.as_ref(), new);
    Json(respond(&req, warnings, errors).into_review())
}

/// Validate TrainingRuntime create/update requests
pub async fn validate_training_runtimes(
    Json(body): Json<AdmissionReview<TrainingRuntime>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<TrainingRuntime> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let Some(new) = req.object.as_ref() else {
        return Json(AdmissionResponse::from(&req).into_review());
    };

    let (warnings, errors) = validate_training_runtime(&new.spec);
    Json(respond(&req, warnings, errors).into_review())
}

/// Validate ClusterTrainingRuntime create/update requests
pub async fn validate_cluster_training_runtimes(
    Json(body): Json<AdmissionReview<ClusterTrainingRuntime>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<ClusterTrainingRuntime> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let Some(new) = req.object.as_ref() else {
        return Json(AdmissionResponse::from(&req).into_review());
    };

    // Both runtime kinds share one rule set
    let (warnings, errors) = validate_training_runtime(&new.spec.clone().into());
    Json(respond(&req, warnings, errors).into_review())
}
