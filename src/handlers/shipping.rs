// src/handlers/shipping.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermManageShipping, RequirePermission},
    models::shipping::{CreateShipmentPayload, ManifestPayload, PickupLocationPayload, WaybillQuery},
};

type Guard = RequirePermission<PermManageShipping>;

#[utoipa::path(
    post,
    path = "/shipping/pickup-location",
    tag = "Shipping",
    request_body = PickupLocationPayload,
    responses(
        (status = 200, description = "Courier response", body = Object),
        (status = 502, description = "Courier unavailable")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_pickup_location(
    State(app_state): State<AppState>,
    _perm: Guard,
    Json(payload): Json<PickupLocationPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.shipping_client.create_pickup_location(&payload).await?))
}

#[utoipa::path(
    post,
    path = "/shipping/shipment",
    tag = "Shipping",
    request_body = CreateShipmentPayload,
    responses(
        (status = 200, description = "Courier response", body = Object),
        (status = 502, description = "Courier unavailable")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shipment(
    State(app_state): State<AppState>,
    _perm: Guard,
    Json(payload): Json<CreateShipmentPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.shipping_client.create_shipment(&payload).await?))
}

#[utoipa::path(
    get,
    path = "/shipping/track/{awb}",
    tag = "Shipping",
    params(("awb" = String, Path, description = "Air waybill number")),
    responses(
        (status = 200, description = "Courier tracking data", body = Object),
        (status = 502, description = "Courier unavailable")
    ),
    security(("api_jwt" = []))
)]
pub async fn track(
    State(app_state): State<AppState>,
    _perm: Guard,
    Path(awb): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(app_state.shipping_client.track(&awb).await?))
}

#[utoipa::path(
    post,
    path = "/shipping/cancel/{awb}",
    tag = "Shipping",
    params(("awb" = String, Path, description = "Air waybill number")),
    responses(
        (status = 200, description = "Courier response", body = Object),
        (status = 502, description = "Courier unavailable")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel(
    State(app_state): State<AppState>,
    _perm: Guard,
    Path(awb): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(app_state.shipping_client.cancel(&awb).await?))
}

#[utoipa::path(
    post,
    path = "/shipping/manifest",
    tag = "Shipping",
    request_body = ManifestPayload,
    responses(
        (status = 200, description = "Pickup requested", body = Object),
        (status = 502, description = "Courier unavailable")
    ),
    security(("api_jwt" = []))
)]
pub async fn manifest(
    State(app_state): State<AppState>,
    _perm: Guard,
    Json(payload): Json<ManifestPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.shipping_client.manifest(&payload).await?))
}

#[utoipa::path(
    get,
    path = "/shipping/waybill",
    tag = "Shipping",
    params(WaybillQuery),
    responses(
        (status = 200, description = "Fresh waybill numbers", body = Object),
        (status = 502, description = "Courier unavailable")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_waybill(
    State(app_state): State<AppState>,
    _perm: Guard,
    Query(query): Query<WaybillQuery>,
) -> Result<Json<Value>, AppError> {
    let count = query.count.unwrap_or(1);
    Ok(Json(app_state.shipping_client.generate_waybill(count).await?))
}
