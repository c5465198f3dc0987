// src/handlers/payment.rs
//
// Verification is called by the storefront after the Razorpay checkout widget
// closes; the signature is the proof. Failure and attach are staff actions.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermManageOrders, RequirePermission},
    models::order::{
        AttachRazorpayOrderPayload, MessageResponse, Order, PaymentFailurePayload,
        PaymentOutcome, VerifiedPayment, VerifyPaymentPayload,
    },
};

#[utoipa::path(
    post,
    path = "/payment/verify",
    tag = "Payments",
    request_body = VerifyPaymentPayload,
    responses(
        (status = 200, description = "Payment verified", body = MessageResponse),
        (status = 400, description = "Invalid signature or missing fields"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already settled differently")
    )
)]
pub async fn verify_payment(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyPaymentPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    let outcome = app_state
        .payment_service
        .verify_payment(
            payload.order_id,
            VerifiedPayment {
                razorpay_payment_id: payload.razorpay_payment_id,
                razorpay_order_id: payload.razorpay_order_id,
                razorpay_signature: payload.razorpay_signature,
                method: payload.method,
            },
        )
        .await?;

    let message = match outcome {
        PaymentOutcome::Recorded(_) => "Payment verified successfully",
        PaymentOutcome::AlreadyRecorded(_) => "Payment already verified",
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/payment/failure",
    tag = "Payments",
    request_body = PaymentFailurePayload,
    responses(
        (status = 200, description = "Payment marked as failed", body = Order),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Payment is no longer pending")
    ),
    security(("api_jwt" = []))
)]
pub async fn payment_failure(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageOrders>,
    Json(payload): Json<PaymentFailurePayload>,
) -> Result<Json<Order>, AppError> {
    payload.validate()?;

    let order = app_state
        .payment_service
        .record_failure(
            payload.order_id,
            payload.razorpay_order_id.as_deref(),
            payload.razorpay_payment_id.as_deref(),
            payload.reason.as_deref(),
        )
        .await?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/payment/attach/{orderId}",
    tag = "Payments",
    request_body = AttachRazorpayOrderPayload,
    params(("orderId" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Gateway order recorded", body = Order),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Payment is no longer pending or gateway order in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn attach_razorpay_order(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageOrders>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AttachRazorpayOrderPayload>,
) -> Result<Json<Order>, AppError> {
    payload.validate()?;

    let order = app_state
        .payment_service
        .attach_razorpay_order(order_id, &payload.razorpay_order_id)
        .await?;

    Ok(Json(order))
}
