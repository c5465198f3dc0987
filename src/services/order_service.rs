// src/services/order_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderStore,
    models::order::{
        CheckoutPayload, NewOrder, Order, OrderDetail, OrderStatus, TrackingResponse,
    },
    services::tracking::build_timeline,
};

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
}

/// `ORD-YYYYMMDD-XXXXXXXX`
pub fn generate_order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    pub async fn checkout(&self, payload: CheckoutPayload) -> Result<Order, AppError> {
        if payload.items.iter().any(|i| i.unit_price < Decimal::ZERO) {
            return Err(AppError::BadRequest("Item prices cannot be negative.".into()));
        }

        let total_amount = payload
            .items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();

        let new_order = NewOrder {
            order_number: generate_order_number(),
            customer: payload.customer,
            items: payload.items,
            razorpay_order_id: payload.razorpay_order_id,
            total_amount,
        };

        let order = self.orders.create_order(&new_order).await?;

        tracing::info!("Order {} placed, total {}", order.order_number, order.total_amount);
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderDetail, AppError> {
        self.orders
            .order_detail(id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found."))
    }

    /// Writes the status as given and records it in the history. There is no
    /// transition table.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<Order, AppError> {
        let order = self.orders.update_status(id, status, note).await?;
        tracing::info!("Order {} moved to {:?}", order.order_number, status);
        Ok(order)
    }

    pub async fn tracking(&self, id: Uuid) -> Result<TrackingResponse, AppError> {
        let order = self
            .orders
            .find_order(id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found."))?;
        let history = self.orders.status_history(id).await?;

        Ok(TrackingResponse {
            order_id: order.id,
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
            steps: build_timeline(order.status, &history),
            history,
        })
    }
}
