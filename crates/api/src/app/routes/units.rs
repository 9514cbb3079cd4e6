use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
};

use unitrack_core::UnitKey;
use unitrack_infra::WorkflowError;

use crate::app::dto::{ShipCheckQuery, ShipCheckResponse, UnitResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:unit_number/:product_code", get(get_unit))
        .route("/:unit_number/:product_code/ship-check", get(ship_check))
}

fn parse_key(unit_number: &str, product_code: &str) -> Result<UnitKey, axum::response::Response> {
    UnitKey::parse(unit_number, product_code)
        .map_err(|e| errors::workflow_error_to_response(WorkflowError::from(e)))
}

/// Status read model for every unit (eventually consistent with the repository).
pub async fn list_units(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(services.projection.list()).into_response()
}

pub async fn get_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Path((unit_number, product_code)): Path<(String, String)>,
) -> axum::response::Response {
    let key = match parse_key(&unit_number, &product_code) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    match services.workflow.get(&key).await {
        Ok(aggregate) => Json(UnitResponse::new(&aggregate)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn ship_check(
    Extension(services): Extension<Arc<AppServices>>,
    Path((unit_number, product_code)): Path<(String, String)>,
    Query(query): Query<ShipCheckQuery>,
) -> axum::response::Response {
    let key = match parse_key(&unit_number, &product_code) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    match services.workflow.check_valid_to_ship(&key, &query.location).await {
        Ok(notifications) => Json(ShipCheckResponse {
            location: query.location,
            can_ship: notifications.is_empty(),
            notifications,
        })
        .into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
