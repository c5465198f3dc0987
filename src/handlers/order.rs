// src/handlers/order.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedAdmin,
        rbac::{PermManageOrders, PermViewOrders, RequirePermission},
    },
    models::order::{CheckoutPayload, Order, OrderDetail, TrackingResponse, UpdateOrderStatusPayload},
};

#[utoipa::path(
    post,
    path = "/order/checkout",
    tag = "Orders",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Order placed, payment pending", body = Order),
        (status = 400, description = "Invalid cart")
    )
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state.order_service.checkout(payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/order/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items and payment", body = OrderDetail),
        (status = 404, description = "Order not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermViewOrders>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    Ok(Json(app_state.order_service.get_order(id).await?))
}

#[utoipa::path(
    get,
    path = "/order/{id}/tracking",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Tracking timeline", body = TrackingResponse),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_tracking(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingResponse>, AppError> {
    Ok(Json(app_state.order_service.tracking(id).await?))
}

#[utoipa::path(
    patch,
    path = "/order/{id}/status",
    tag = "Orders",
    request_body = UpdateOrderStatusPayload,
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Status written", body = Order),
        (status = 404, description = "Order not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageOrders>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<Json<Order>, AppError> {
    payload.validate()?;

    tracing::info!("Admin {} sets order {} to {:?}", admin.id, id, payload.status);
    let order = app_state
        .order_service
        .update_status(id, payload.status, payload.note.as_deref())
        .await?;

    Ok(Json(order))
}
