//! Inbound trigger endpoints: one POST per upstream event.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::post,
};

use unitrack_infra::workflow::{
    ProductDiscarded, ProductImported, ProductStored, QuarantineRequested, ShipmentCompleted,
    UnitReceived,
};
use unitrack_infra::{Outcome, WorkflowError};

use crate::app::dto::TriggerResponse;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/product-imported", post(product_imported))
        .route("/quarantine-requested", post(quarantine_requested))
        .route("/unit-received", post(unit_received))
        .route("/product-discarded", post(product_discarded))
        .route("/shipment-completed", post(shipment_completed))
        .route("/product-stored", post(product_stored))
}

fn respond(result: Result<Outcome, WorkflowError>) -> axum::response::Response {
    match result {
        Ok(outcome) => Json(TriggerResponse::from(outcome)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn product_imported(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ProductImported>,
) -> axum::response::Response {
    respond(services.workflow.product_imported(&body).await)
}

pub async fn quarantine_requested(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<QuarantineRequested>,
) -> axum::response::Response {
    respond(services.workflow.quarantine_requested(&body).await)
}

pub async fn unit_received(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<UnitReceived>,
) -> axum::response::Response {
    respond(services.workflow.unit_received(&body).await)
}

pub async fn product_discarded(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ProductDiscarded>,
) -> axum::response::Response {
    respond(services.workflow.product_discarded(&body).await)
}

pub async fn shipment_completed(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ShipmentCompleted>,
) -> axum::response::Response {
    respond(services.workflow.shipment_completed(&body).await)
}

pub async fn product_stored(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ProductStored>,
) -> axum::response::Response {
    respond(services.workflow.product_stored(&body).await)
}
