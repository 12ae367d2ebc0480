//! Validating Admission Webhook for Tensile
//!
//! The admission engine gates what reaches the store: structural
//! validation of runtime topologies, cross-field and immutability rules
//! for TrainJobs, and deprecated-field migration warnings. Validation
//! is pure and synchronous; this crate also provides the axum router
//! wiring it to the API server's admission review callbacks.
//!
//! Errors block admission; warnings never do, but are always delivered
//! to the submitter, even alongside a clean admit.

mod field;
mod handlers;
mod runtime;
mod trainjob;

pub use field::{ErrorKind, FieldError, FieldPath};
pub use runtime::validate_training_runtime;
pub use trainjob::validate_train_job;

use axum::{routing::post, Router};

/// Create the webhook router with all validation endpoints
///
/// - POST /validate/trainjobs
/// - POST /validate/trainingruntimes
/// - POST /validate/clustertrainingruntimes
pub fn webhook_router() -> Router {
    Router::new()
        .route("/validate/trainjobs", post(handlers::validate_train_jobs))
        .route(
            "/validate/trainingruntimes",
            post(handlers::validate_training_runtimes),
        )
        .route(
            "/validate/clustertrainingruntimes",
            post(handlers::validate_cluster_training_runtimes),
        )
}
