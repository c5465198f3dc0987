// src/db/mod.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::Admin,
        order::{
            Customer, NewOrder, Order, OrderDetail, OrderStatus, OrderStatusEvent,
            PaymentOutcome, VerifiedPayment,
        },
        rbac::{AdminAccess, Permission, Role},
    },
};

pub mod admin_repo;
pub mod order_repo;
pub mod rbac_repo;

#[cfg(test)]
pub mod memory;

pub use admin_repo::AdminRepository;
pub use order_repo::OrderRepository;
pub use rbac_repo::RbacRepository;

/// Permissions, roles and the two assignment relations.
#[async_trait]
pub trait RbacStore: Send + Sync {
    // --- Permissions ---
    async fn create_permission(&self, name: &str, label: &str, module: &str)
        -> Result<Permission, AppError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError>;
    async fn update_permission(
        &self,
        id: Uuid,
        name: Option<&str>,
        label: Option<&str>,
        module: Option<&str>,
    ) -> Result<Permission, AppError>;
    async fn delete_permission(&self, id: Uuid) -> Result<(), AppError>;

    // --- Roles ---
    /// Fails with `Conflict` when the (already normalized) name is taken.
    async fn create_role(&self, name: &str, description: Option<&str>) -> Result<Role, AppError>;
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, AppError>;
    async fn find_system_role(&self) -> Result<Option<Role>, AppError>;
    /// Every role except system roles.
    async fn list_assignable_roles(&self) -> Result<Vec<Role>, AppError>;
    /// `(role_id, permission)` pairs for the given roles.
    async fn permissions_of_roles(&self, role_ids: &[Uuid])
        -> Result<Vec<(Uuid, Permission)>, AppError>;
    /// Adds the missing pairs, keeps existing ones.
    async fn grant_role_permissions(&self, role_id: Uuid, permission_ids: &[Uuid])
        -> Result<(), AppError>;
    /// Rename / describe and, when `permission_ids` is given, replace the set.
    /// Atomic.
    async fn update_role(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<Role, AppError>;
    async fn delete_role(&self, id: Uuid) -> Result<(), AppError>;

    // --- Extra permissions ---
    async fn grant_extra_permissions(&self, admin_id: Uuid, permission_ids: &[Uuid])
        -> Result<(), AppError>;
    async fn revoke_extra_permissions(&self, admin_id: Uuid, permission_ids: &[Uuid])
        -> Result<(), AppError>;
    async fn extra_permissions(&self, admin_id: Uuid) -> Result<Vec<Permission>, AppError>;

    /// Role, role permissions and extra permissions of one admin.
    async fn admin_access(&self, admin_id: Uuid) -> Result<Option<AdminAccess>, AppError>;
}

/// Staff accounts.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError>;
    async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role_id: Uuid,
    ) -> Result<Admin, AppError>;
    async fn count_admins(&self) -> Result<i64, AppError>;
}

/// Orders, their payment record and their status history.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Customer upsert, order, items, payment record and first status event in
    /// one transaction.
    async fn create_order(&self, new_order: &NewOrder) -> Result<Order, AppError>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError>;
    async fn order_detail(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError>;
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError>;
    async fn attach_razorpay_order(&self, order_id: Uuid, razorpay_order_id: &str)
        -> Result<Order, AppError>;
    /// Writes payment record and order together, or neither.
    async fn record_payment_success(&self, order_id: Uuid, payment: &VerifiedPayment)
        -> Result<PaymentOutcome, AppError>;
    async fn record_payment_failure(
        &self,
        order_id: Uuid,
        razorpay_order_id: Option<&str>,
        razorpay_payment_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Order, AppError>;
    async fn update_status(&self, order_id: Uuid, status: OrderStatus, note: Option<&str>)
        -> Result<Order, AppError>;
    async fn status_history(&self, order_id: Uuid) -> Result<Vec<OrderStatusEvent>, AppError>;
}
