// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    ReturnRequested,
    ReturnApproved,
    Returned,
    Refunded,
}

// --- Rows ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = "ORD-20250301-9F2C41AB")]
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    #[schema(example = "order_N5cQ8pYd7b1Xw2")]
    pub razorpay_order_id: Option<String>,
    pub payment_id: Option<String>,
    #[schema(example = "45999.00")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_variant_id: Uuid,
    #[schema(example = "Solitaire Ring 18K")]
    pub product_name: String,
    #[schema(example = 1)]
    pub quantity: i32,
    #[schema(example = "45999.00")]
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub id: Uuid,
    pub order_id: Uuid,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub method: Option<String>,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub payment: PaymentHistory,
}

// --- Checkout ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCustomer {
    #[validate(length(min = 1, message = "Customer name is required."))]
    pub name: String,
    #[validate(email(message = "The email provided is invalid."))]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_variant_id: Uuid,
    #[validate(length(min = 1, message = "Product name is required."))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[validate(nested)]
    pub customer: CheckoutCustomer,

    #[validate(length(min = 1, message = "At least one item is required."), nested)]
    pub items: Vec<CheckoutItem>,

    pub razorpay_order_id: Option<String>,
}

/// A validated order ready to be written.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer: CheckoutCustomer,
    pub items: Vec<CheckoutItem>,
    pub razorpay_order_id: Option<String>,
    pub total_amount: Decimal,
}

// --- Payment ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyPaymentPayload {
    #[validate(length(min = 1, message = "razorpay_payment_id is required."))]
    #[schema(example = "pay_29QQoUBi66xm2f")]
    pub razorpay_payment_id: String,

    #[validate(length(min = 1, message = "razorpay_order_id is required."))]
    #[schema(example = "order_9A33XWu170gUtm")]
    pub razorpay_order_id: String,

    #[validate(length(min = 1, message = "razorpay_signature is required."))]
    pub razorpay_signature: String,

    #[serde(rename = "orderId")]
    pub order_id: Uuid,

    #[serde(default)]
    #[schema(example = "upi")]
    pub method: Option<String>,
}

/// Gateway fields recorded when a verified payment is applied.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
    pub method: Option<String>,
}

/// Result of applying a verified payment to an order.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// PENDING -> SUCCESS happened in this call.
    Recorded(Order),
    /// The order was already SUCCESS with the same payment id. Nothing written.
    AlreadyRecorded(Order),
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFailurePayload {
    pub order_id: Uuid,
    #[serde(rename = "razorpay_order_id")]
    pub razorpay_order_id: Option<String>,
    #[serde(rename = "razorpay_payment_id")]
    pub razorpay_payment_id: Option<String>,
    #[validate(length(max = 500, message = "Reason is too long."))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachRazorpayOrderPayload {
    #[validate(length(min = 1, message = "razorpayOrderId is required."))]
    pub razorpay_order_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

// --- Status ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusPayload {
    pub status: OrderStatus,
    #[validate(length(max = 500, message = "Note is too long."))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub reached: bool,
    pub current: bool,
    pub reached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub steps: Vec<TrackingStep>,
    pub history: Vec<OrderStatusEvent>,
}

// --- Payment transition rules ---
// Both store implementations apply these while holding the order row.

/// What a verified payment does to an order in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessTransition {
    Apply,
    AlreadyApplied,
}

impl Order {
    /// The gateway order must be the one recorded when the payment attempt began.
    pub fn ensure_gateway_order(&self, razorpay_order_id: &str) -> Result<(), AppError> {
        match self.razorpay_order_id.as_deref() {
            Some(recorded) if recorded == razorpay_order_id => Ok(()),
            Some(_) => Err(AppError::conflict(
                "Payment belongs to a different gateway order.",
            )),
            None => Err(AppError::conflict(
                "No payment attempt has been recorded for this order.",
            )),
        }
    }

    pub fn success_transition(
        &self,
        razorpay_order_id: &str,
        razorpay_payment_id: &str,
    ) -> Result<SuccessTransition, AppError> {
        self.ensure_gateway_order(razorpay_order_id)?;

        match self.payment_status {
            PaymentStatus::Pending => Ok(SuccessTransition::Apply),
            PaymentStatus::Success if self.payment_id.as_deref() == Some(razorpay_payment_id) => {
                Ok(SuccessTransition::AlreadyApplied)
            }
            PaymentStatus::Success => Err(AppError::conflict(
                "Order is already paid with a different payment.",
            )),
            PaymentStatus::Failed => Err(AppError::conflict(
                "Payment for this order has already failed.",
            )),
        }
    }

    pub fn ensure_payment_pending(&self) -> Result<(), AppError> {
        if self.payment_status == PaymentStatus::Pending {
            Ok(())
        } else {
            Err(AppError::conflict(format!(
                "Order payment is no longer pending ({:?}).",
                self.payment_status
            )))
        }
    }
}
