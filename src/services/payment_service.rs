// src/services/payment_service.rs

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderStore,
    models::order::{Order, PaymentOutcome, VerifiedPayment},
    services::notification::{Notification, Notifier},
};

type HmacSha256 = Hmac<Sha256>;

/// Checks a Razorpay checkout signature: hex HMAC-SHA256 of
/// `"{order_id}|{payment_id}"` keyed with the account secret.
pub fn verify_razorpay_signature(
    secret: &str,
    razorpay_order_id: &str,
    razorpay_payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{}|{}", razorpay_order_id, razorpay_payment_id).as_bytes());

    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    // constant-time
    mac.verify_slice(&expected).is_ok()
}

#[derive(Clone)]
pub struct PaymentService {
    orders: Arc<dyn OrderStore>,
    notifier: Notifier,
    razorpay_secret: String,
}

impl PaymentService {
    pub fn new(orders: Arc<dyn OrderStore>, notifier: Notifier, razorpay_secret: String) -> Self {
        Self {
            orders,
            notifier,
            razorpay_secret,
        }
    }

    /// Applies a client-reported Razorpay payment to `order_id`.
    ///
    /// A bad signature writes nothing. A good one moves the order and its
    /// payment record to SUCCESS together, then queues the confirmation email.
    /// Replaying the same payment on an already-paid order is a no-op.
    pub async fn verify_payment(
        &self,
        order_id: Uuid,
        payment: VerifiedPayment,
    ) -> Result<PaymentOutcome, AppError> {
        if !verify_razorpay_signature(
            &self.razorpay_secret,
            &payment.razorpay_order_id,
            &payment.razorpay_payment_id,
            &payment.razorpay_signature,
        ) {
            tracing::warn!(
                "Rejected payment {} for order {}: invalid signature",
                payment.razorpay_payment_id,
                order_id
            );
            return Err(AppError::InvalidSignature);
        }

        let outcome = self.orders.record_payment_success(order_id, &payment).await?;

        match &outcome {
            PaymentOutcome::Recorded(order) => {
                tracing::info!(
                    "Payment {} verified for order {}",
                    payment.razorpay_payment_id,
                    order.order_number
                );
                self.queue_confirmation(order).await;
            }
            PaymentOutcome::AlreadyRecorded(order) => {
                tracing::info!(
                    "Payment {} already recorded for order {}",
                    payment.razorpay_payment_id,
                    order.order_number
                );
            }
        }

        Ok(outcome)
    }

    pub async fn record_failure(
        &self,
        order_id: Uuid,
        razorpay_order_id: Option<&str>,
        razorpay_payment_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Order, AppError> {
        let order = self
            .orders
            .record_payment_failure(order_id, razorpay_order_id, razorpay_payment_id, reason)
            .await?;

        tracing::info!(
            "Payment failed for order {}: {}",
            order.order_number,
            reason.unwrap_or("no reason given")
        );
        Ok(order)
    }

    pub async fn attach_razorpay_order(
        &self,
        order_id: Uuid,
        razorpay_order_id: &str,
    ) -> Result<Order, AppError> {
        self.orders.attach_razorpay_order(order_id, razorpay_order_id).await
    }

    // Runs after commit. A lookup failure only costs the email.
    async fn queue_confirmation(&self, order: &Order) {
        match self.orders.find_customer(order.customer_id).await {
            Ok(Some(customer)) => self.notifier.enqueue(Notification::OrderConfirmed {
                to_email: customer.email,
                customer_name: customer.name,
                order_number: order.order_number.clone(),
                amount: order.total_amount,
            }),
            Ok(None) => tracing::warn!("Order {} has no customer to notify", order.order_number),
            Err(e) => tracing::warn!(
                "Could not load customer for order {}: {}",
                order.order_number,
                e
            ),
        }
    }
}
