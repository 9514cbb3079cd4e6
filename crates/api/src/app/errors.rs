use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use unitrack_infra::repository::RepositoryError;
use unitrack_infra::WorkflowError;

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    match err {
        WorkflowError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        WorkflowError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        WorkflowError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "duplicate", msg),
        WorkflowError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        WorkflowError::Invariant(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        WorkflowError::Repository(e @ RepositoryError::Corrupt { .. }) => {
            tracing::error!(error = %e, "stored unit is corrupt");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "corrupt_record", e.to_string())
        }
        WorkflowError::Repository(e) => {
            tracing::error!(error = %e, "repository failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        WorkflowError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
