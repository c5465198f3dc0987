// src/db/order_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    db::OrderStore,
    models::order::{
        CheckoutCustomer, Customer, NewOrder, Order, OrderDetail, OrderItem, OrderStatus,
        OrderStatusEvent, PaymentHistory, PaymentOutcome, PaymentStatus, SuccessTransition,
        VerifiedPayment,
    },
};

const GATEWAY_ORDER_TAKEN: &str = "This gateway order belongs to another order.";
const PAYMENT_TAKEN: &str = "This payment is already recorded on another order.";

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_customer<'e, E>(
        executor: E,
        customer: &CheckoutCustomer,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone)
            VALUES ($1, lower($2), $3)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name,
                phone = COALESCE(EXCLUDED.phone, customers.phone)
            RETURNING *
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }

    async fn append_status_event<'e, E>(
        executor: E,
        order_id: Uuid,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO order_status_history (order_id, status, note) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(status)
            .bind(note)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Row lock held until the surrounding transaction ends.
    async fn lock_order<'e, E>(executor: E, order_id: Uuid) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found."))
    }

    #[allow(clippy::too_many_arguments)]
    async fn update_payment_record<'e, E>(
        executor: E,
        order_id: Uuid,
        status: PaymentStatus,
        razorpay_order_id: Option<&str>,
        razorpay_payment_id: Option<&str>,
        razorpay_signature: Option<&str>,
        method: Option<&str>,
        paid_at: Option<chrono::DateTime<Utc>>,
        failure_reason: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE payment_history
            SET status = $2,
                razorpay_order_id = COALESCE($3, razorpay_order_id),
                razorpay_payment_id = COALESCE($4, razorpay_payment_id),
                razorpay_signature = COALESCE($5, razorpay_signature),
                method = COALESCE($6, method),
                paid_at = COALESCE($7, paid_at),
                failure_reason = COALESCE($8, failure_reason),
                updated_at = now()
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(razorpay_order_id)
        .bind(razorpay_payment_id)
        .bind(razorpay_signature)
        .bind(method)
        .bind(paid_at)
        .bind(failure_reason)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Payment record not found for this order."));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn create_order(&self, new_order: &NewOrder) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = Self::upsert_customer(&mut *tx, &new_order.customer).await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (order_number, customer_id, razorpay_order_id, total_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new_order.order_number)
        .bind(customer.id)
        .bind(&new_order.razorpay_order_id)
        .bind(new_order.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Order number or gateway order is already in use."))?;

        for item in &new_order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_variant_id, product_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id)
            .bind(item.product_variant_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO payment_history (order_id, razorpay_order_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(order.id)
        .bind(&new_order.razorpay_order_id)
        .bind(new_order.total_amount)
        .execute(&mut *tx)
        .await?;

        Self::append_status_event(&mut *tx, order.id, OrderStatus::Pending, None).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn order_detail(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError> {
        let Some(order) = self.find_order(id).await? else {
            return Ok(None);
        };

        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(order.customer_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let payment = sqlx::query_as::<_, PaymentHistory>(
            "SELECT * FROM payment_history WHERE order_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order,
            customer,
            items,
            payment,
        }))
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    async fn attach_razorpay_order(
        &self,
        order_id: Uuid,
        razorpay_order_id: &str,
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut *tx, order_id).await?;
        order.ensure_payment_pending()?;

        Self::update_payment_record(
            &mut *tx,
            order_id,
            PaymentStatus::Pending,
            Some(razorpay_order_id),
            None,
            None,
            None,
            None,
            None,
        )
        .await?;

        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET razorpay_order_id = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .bind(razorpay_order_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, GATEWAY_ORDER_TAKEN))?;

        tx.commit().await?;
        Ok(order)
    }

    async fn record_payment_success(
        &self,
        order_id: Uuid,
        payment: &VerifiedPayment,
    ) -> Result<PaymentOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut *tx, order_id).await?;
        if order.success_transition(&payment.razorpay_order_id, &payment.razorpay_payment_id)?
            == SuccessTransition::AlreadyApplied
        {
            return Ok(PaymentOutcome::AlreadyRecorded(order));
        }

        let paid_at = Utc::now();

        Self::update_payment_record(
            &mut *tx,
            order_id,
            PaymentStatus::Success,
            Some(&payment.razorpay_order_id),
            Some(&payment.razorpay_payment_id),
            Some(&payment.razorpay_signature),
            payment.method.as_deref(),
            Some(paid_at),
            None,
        )
        .await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET is_paid = true,
                payment_status = $2,
                paid_at = $3,
                payment_id = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(PaymentStatus::Success)
        .bind(paid_at)
        .bind(&payment.razorpay_payment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, PAYMENT_TAKEN))?;

        tx.commit().await?;

        Ok(PaymentOutcome::Recorded(order))
    }

    async fn record_payment_failure(
        &self,
        order_id: Uuid,
        razorpay_order_id: Option<&str>,
        razorpay_payment_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut *tx, order_id).await?;
        order.ensure_payment_pending()?;
        if let (Some(given), Some(_)) = (razorpay_order_id, order.razorpay_order_id.as_deref()) {
            order.ensure_gateway_order(given)?;
        }

        Self::update_payment_record(
            &mut *tx,
            order_id,
            PaymentStatus::Failed,
            razorpay_order_id,
            razorpay_payment_id,
            None,
            None,
            None,
            reason,
        )
        .await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET payment_status = $2,
                razorpay_order_id = COALESCE($3, razorpay_order_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(PaymentStatus::Failed)
        .bind(razorpay_order_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, GATEWAY_ORDER_TAKEN))?;

        tx.commit().await?;
        Ok(order)
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found."))?;

        Self::append_status_event(&mut *tx, order_id, status, note).await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn status_history(&self, order_id: Uuid) -> Result<Vec<OrderStatusEvent>, AppError> {
        let events = sqlx::query_as::<_, OrderStatusEvent>(
            "SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
