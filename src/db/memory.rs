// src/db/memory.rs
//
// In-memory stores for unit tests. Mirrors the constraints the migrations put
// on the real tables (unique names, cascades, RESTRICT on roles in use).

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AdminStore, OrderStore, RbacStore},
    models::{
        auth::Admin,
        order::{
            Customer, NewOrder, Order, OrderDetail, OrderItem, OrderStatus, OrderStatusEvent,
            PaymentHistory, PaymentOutcome, PaymentStatus, SuccessTransition, VerifiedPayment,
        },
        rbac::{AdminAccess, Permission, Role},
    },
};

#[derive(Default)]
struct State {
    permissions: Vec<Permission>,
    roles: Vec<Role>,
    role_permissions: HashSet<(Uuid, Uuid)>,
    admins: Vec<Admin>,
    extra_permissions: HashSet<(Uuid, Uuid)>,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    payments: Vec<PaymentHistory>,
    events: Vec<OrderStatusEvent>,
    /// Counts payment-history writes, so tests can assert "nothing written".
    payment_writes: usize,
}

impl State {
    fn sorted(mut permissions: Vec<Permission>) -> Vec<Permission> {
        permissions.sort_by(|a, b| (&a.module, &a.name).cmp(&(&b.module, &b.name)));
        permissions
    }

    fn permissions_where(&self, ids: impl Fn(Uuid) -> bool) -> Vec<Permission> {
        Self::sorted(self.permissions.iter().filter(|p| ids(p.id)).cloned().collect())
    }

    fn ensure_permissions_exist(&self, ids: &[Uuid]) -> Result<(), AppError> {
        if ids.iter().all(|id| self.permissions.iter().any(|p| p.id == *id)) {
            Ok(())
        } else {
            Err(AppError::not_found("One or more permissions do not exist."))
        }
    }

    fn order_mut(&mut self, id: Uuid) -> Result<&mut Order, AppError> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::not_found("Order not found."))
    }

    // Partial unique indexes on orders.razorpay_order_id and orders.payment_id.
    fn ensure_gateway_order_free(&self, order_id: Uuid, razorpay_order_id: &str) -> Result<(), AppError> {
        let taken = self
            .orders
            .iter()
            .any(|o| o.id != order_id && o.razorpay_order_id.as_deref() == Some(razorpay_order_id));
        if taken {
            Err(AppError::conflict("This gateway order belongs to another order."))
        } else {
            Ok(())
        }
    }

    fn ensure_payment_free(&self, order_id: Uuid, payment_id: &str) -> Result<(), AppError> {
        let taken = self
            .orders
            .iter()
            .any(|o| o.id != order_id && o.payment_id.as_deref() == Some(payment_id));
        if taken {
            Err(AppError::conflict("This payment is already recorded on another order."))
        } else {
            Ok(())
        }
    }

    fn payment_mut(&mut self, order_id: Uuid) -> Result<&mut PaymentHistory, AppError> {
        self.payments
            .iter_mut()
            .find(|p| p.order_id == order_id)
            .ok_or_else(|| AppError::not_found("Payment record not found for this order."))
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Starts with the built-in `admin` system role, like the migrations.
    pub fn new() -> Self {
        let now = Utc::now();
        let state = State {
            roles: vec![Role {
                id: Uuid::new_v4(),
                name: "admin".to_string(),
                description: Some("Built-in super administrator".to_string()),
                is_system: true,
                created_at: now,
                updated_at: now,
            }],
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn system_role_id(&self) -> Uuid {
        self.lock().roles.iter().find(|r| r.is_system).unwrap().id
    }

    pub fn payment_writes(&self) -> usize {
        self.lock().payment_writes
    }

    pub fn payment_of(&self, order_id: Uuid) -> PaymentHistory {
        self.lock()
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned()
            .unwrap()
    }

    pub fn order_of(&self, order_id: Uuid) -> Order {
        self.lock()
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn create_permission(
        &self,
        name: &str,
        label: &str,
        module: &str,
    ) -> Result<Permission, AppError> {
        let mut state = self.lock();
        if state.permissions.iter().any(|p| p.name == name) {
            return Err(AppError::conflict("A permission with this name already exists."));
        }
        let now = Utc::now();
        let permission = Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            label: label.to_string(),
            module: module.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        Ok(State::sorted(self.lock().permissions.clone()))
    }

    async fn update_permission(
        &self,
        id: Uuid,
        name: Option<&str>,
        label: Option<&str>,
        module: Option<&str>,
    ) -> Result<Permission, AppError> {
        let mut state = self.lock();
        if let Some(name) = name {
            if state.permissions.iter().any(|p| p.name == name && p.id != id) {
                return Err(AppError::conflict("A permission with this name already exists."));
            }
        }
        let permission = state
            .permissions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Permission not found."))?;
        if let Some(name) = name {
            permission.name = name.to_string();
        }
        if let Some(label) = label {
            permission.label = label.to_string();
        }
        if let Some(module) = module {
            permission.module = module.to_string();
        }
        permission.updated_at = Utc::now();
        Ok(permission.clone())
    }

    async fn delete_permission(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let before = state.permissions.len();
        state.permissions.retain(|p| p.id != id);
        if state.permissions.len() == before {
            return Err(AppError::not_found("Permission not found."));
        }
        state.role_permissions.retain(|(_, p)| *p != id);
        state.extra_permissions.retain(|(_, p)| *p != id);
        Ok(())
    }

    async fn create_role(&self, name: &str, description: Option<&str>) -> Result<Role, AppError> {
        let mut state = self.lock();
        if state.roles.iter().any(|r| r.name.to_lowercase() == name.to_lowercase()) {
            return Err(AppError::conflict("Role already exists."));
        }
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            is_system: false,
            created_at: now,
            updated_at: now,
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.lock().roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_system_role(&self) -> Result<Option<Role>, AppError> {
        Ok(self.lock().roles.iter().find(|r| r.is_system).cloned())
    }

    async fn list_assignable_roles(&self) -> Result<Vec<Role>, AppError> {
        let mut roles: Vec<Role> = self
            .lock()
            .roles
            .iter()
            .filter(|r| !r.is_system)
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn permissions_of_roles(
        &self,
        role_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, Permission)>, AppError> {
        let state = self.lock();
        let mut pairs = Vec::new();
        for role_id in role_ids {
            let granted = state.permissions_where(|p| state.role_permissions.contains(&(*role_id, p)));
            pairs.extend(granted.into_iter().map(|p| (*role_id, p)));
        }
        Ok(pairs)
    }

    async fn grant_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        if !state.roles.iter().any(|r| r.id == role_id) {
            return Err(AppError::not_found("Role not found."));
        }
        state.ensure_permissions_exist(permission_ids)?;
        for id in permission_ids {
            state.role_permissions.insert((role_id, *id));
        }
        Ok(())
    }

    async fn update_role(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<Role, AppError> {
        let mut state = self.lock();
        if let Some(name) = name {
            if state
                .roles
                .iter()
                .any(|r| r.id != id && r.name.to_lowercase() == name.to_lowercase())
            {
                return Err(AppError::conflict("Role already exists."));
            }
        }
        if let Some(ids) = permission_ids {
            state.ensure_permissions_exist(ids)?;
        }
        let role = state
            .roles
            .iter_mut()
            .find(|r| r.id == id && !r.is_system)
            .ok_or_else(|| AppError::not_found("Role not found."))?;
        if let Some(name) = name {
            role.name = name.to_string();
        }
        if let Some(description) = description {
            role.description = Some(description.to_string());
        }
        role.updated_at = Utc::now();
        let role = role.clone();

        if let Some(ids) = permission_ids {
            state.role_permissions.retain(|(r, _)| *r != id);
            for p in ids {
                state.role_permissions.insert((id, *p));
            }
        }
        Ok(role)
    }

    async fn delete_role(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        if !state.roles.iter().any(|r| r.id == id && !r.is_system) {
            return Err(AppError::not_found("Role not found."));
        }
        if state.admins.iter().any(|a| a.role_id == id) {
            return Err(AppError::conflict("Role is still assigned to one or more admins."));
        }
        state.roles.retain(|r| r.id != id);
        state.role_permissions.retain(|(r, _)| *r != id);
        Ok(())
    }

    async fn grant_extra_permissions(
        &self,
        admin_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        state.ensure_permissions_exist(permission_ids)?;
        for id in permission_ids {
            state.extra_permissions.insert((admin_id, *id));
        }
        Ok(())
    }

    async fn revoke_extra_permissions(
        &self,
        admin_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        state
            .extra_permissions
            .retain(|(a, p)| !(*a == admin_id && permission_ids.contains(p)));
        Ok(())
    }

    async fn extra_permissions(&self, admin_id: Uuid) -> Result<Vec<Permission>, AppError> {
        let state = self.lock();
        Ok(state.permissions_where(|p| state.extra_permissions.contains(&(admin_id, p))))
    }

    async fn admin_access(&self, admin_id: Uuid) -> Result<Option<AdminAccess>, AppError> {
        let state = self.lock();
        let Some(admin) = state.admins.iter().find(|a| a.id == admin_id) else {
            return Ok(None);
        };
        let Some(role) = state.roles.iter().find(|r| r.id == admin.role_id).cloned() else {
            return Ok(None);
        };
        let role_permissions =
            state.permissions_where(|p| state.role_permissions.contains(&(role.id, p)));
        let extra_permissions =
            state.permissions_where(|p| state.extra_permissions.contains(&(admin_id, p)));

        Ok(Some(AdminAccess {
            admin_id,
            role,
            role_permissions,
            extra_permissions,
        }))
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, AppError> {
        Ok(self
            .lock()
            .admins
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        Ok(self.lock().admins.iter().find(|a| a.id == id).cloned())
    }

    async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role_id: Uuid,
    ) -> Result<Admin, AppError> {
        let mut state = self.lock();
        if state.admins.iter().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::conflict("This email is already in use."));
        }
        if !state.roles.iter().any(|r| r.id == role_id) {
            return Err(AppError::not_found("Role not found."));
        }
        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role_id,
            created_at: now,
            updated_at: now,
        };
        state.admins.push(admin.clone());
        Ok(admin)
    }

    async fn count_admins(&self) -> Result<i64, AppError> {
        Ok(self.lock().admins.len() as i64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, new_order: &NewOrder) -> Result<Order, AppError> {
        let mut state = self.lock();
        let gateway_taken = new_order.razorpay_order_id.as_deref().is_some_and(|id| {
            state.orders.iter().any(|o| o.razorpay_order_id.as_deref() == Some(id))
        });
        if gateway_taken || state.orders.iter().any(|o| o.order_number == new_order.order_number) {
            return Err(AppError::conflict("Order number or gateway order is already in use."));
        }
        let now = Utc::now();

        let email = new_order.customer.email.to_lowercase();
        let existing = state.customers.iter().position(|c| c.email == email);
        let customer_id = match existing {
            Some(index) => {
                let existing = &mut state.customers[index];
                existing.name = new_order.customer.name.clone();
                if new_order.customer.phone.is_some() {
                    existing.phone = new_order.customer.phone.clone();
                }
                existing.id
            }
            None => {
                let customer = Customer {
                    id: Uuid::new_v4(),
                    name: new_order.customer.name.clone(),
                    email,
                    phone: new_order.customer.phone.clone(),
                    created_at: now,
                };
                let id = customer.id;
                state.customers.push(customer);
                id
            }
        };

        let order = Order {
            id: Uuid::new_v4(),
            order_number: new_order.order_number.clone(),
            customer_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            is_paid: false,
            paid_at: None,
            razorpay_order_id: new_order.razorpay_order_id.clone(),
            payment_id: None,
            total_amount: new_order.total_amount,
            created_at: now,
            updated_at: now,
        };

        for item in &new_order.items {
            state.items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_variant_id: item.product_variant_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                created_at: now,
            });
        }
        state.payments.push(PaymentHistory {
            id: Uuid::new_v4(),
            order_id: order.id,
            razorpay_order_id: new_order.razorpay_order_id.clone(),
            razorpay_payment_id: None,
            razorpay_signature: None,
            method: None,
            status: PaymentStatus::Pending,
            amount: new_order.total_amount,
            paid_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        });
        state.events.push(OrderStatusEvent {
            id: Uuid::new_v4(),
            order_id: order.id,
            status: OrderStatus::Pending,
            note: None,
            created_at: now,
        });
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_detail(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError> {
        let state = self.lock();
        let Some(order) = state.orders.iter().find(|o| o.id == id).cloned() else {
            return Ok(None);
        };
        let customer = state
            .customers
            .iter()
            .find(|c| c.id == order.customer_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Customer not found."))?;
        let items = state.items.iter().filter(|i| i.order_id == id).cloned().collect();
        let payment = state
            .payments
            .iter()
            .find(|p| p.order_id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Payment record not found for this order."))?;
        Ok(Some(OrderDetail {
            order,
            customer,
            items,
            payment,
        }))
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self.lock().customers.iter().find(|c| c.id == id).cloned())
    }

    async fn attach_razorpay_order(
        &self,
        order_id: Uuid,
        razorpay_order_id: &str,
    ) -> Result<Order, AppError> {
        let mut state = self.lock();
        state.order_mut(order_id)?.ensure_payment_pending()?;
        state.ensure_gateway_order_free(order_id, razorpay_order_id)?;

        let payment = state.payment_mut(order_id)?;
        payment.razorpay_order_id = Some(razorpay_order_id.to_string());
        payment.updated_at = Utc::now();
        state.payment_writes += 1;

        let order = state.order_mut(order_id)?;
        order.razorpay_order_id = Some(razorpay_order_id.to_string());
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn record_payment_success(
        &self,
        order_id: Uuid,
        payment: &VerifiedPayment,
    ) -> Result<PaymentOutcome, AppError> {
        let mut state = self.lock();
        let current = state.order_mut(order_id)?.clone();
        if current.success_transition(&payment.razorpay_order_id, &payment.razorpay_payment_id)?
            == SuccessTransition::AlreadyApplied
        {
            return Ok(PaymentOutcome::AlreadyRecorded(current));
        }
        state.ensure_payment_free(order_id, &payment.razorpay_payment_id)?;

        let paid_at = Utc::now();

        let record = state.payment_mut(order_id)?;
        record.razorpay_payment_id = Some(payment.razorpay_payment_id.clone());
        record.razorpay_order_id = Some(payment.razorpay_order_id.clone());
        record.razorpay_signature = Some(payment.razorpay_signature.clone());
        if payment.method.is_some() {
            record.method = payment.method.clone();
        }
        record.status = PaymentStatus::Success;
        record.paid_at = Some(paid_at);
        record.updated_at = paid_at;
        state.payment_writes += 1;

        let order = state.order_mut(order_id)?;
        order.is_paid = true;
        order.payment_status = PaymentStatus::Success;
        order.paid_at = Some(paid_at);
        order.payment_id = Some(payment.razorpay_payment_id.clone());
        order.updated_at = paid_at;

        Ok(PaymentOutcome::Recorded(order.clone()))
    }

    async fn record_payment_failure(
        &self,
        order_id: Uuid,
        razorpay_order_id: Option<&str>,
        razorpay_payment_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Order, AppError> {
        let mut state = self.lock();
        let current = state.order_mut(order_id)?.clone();
        current.ensure_payment_pending()?;
        if let Some(given) = razorpay_order_id {
            if current.razorpay_order_id.is_some() {
                current.ensure_gateway_order(given)?;
            }
            state.ensure_gateway_order_free(order_id, given)?;
        }

        let record = state.payment_mut(order_id)?;
        record.status = PaymentStatus::Failed;
        if let Some(id) = razorpay_order_id {
            record.razorpay_order_id = Some(id.to_string());
        }
        if let Some(id) = razorpay_payment_id {
            record.razorpay_payment_id = Some(id.to_string());
        }
        record.failure_reason = reason.map(str::to_string);
        record.updated_at = Utc::now();
        state.payment_writes += 1;

        let order = state.order_mut(order_id)?;
        order.payment_status = PaymentStatus::Failed;
        if let Some(id) = razorpay_order_id {
            order.razorpay_order_id = Some(id.to_string());
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<Order, AppError> {
        let mut state = self.lock();
        let order = state.order_mut(order_id)?;
        order.status = status;
        order.updated_at = Utc::now();
        let order = order.clone();

        state.events.push(OrderStatusEvent {
            id: Uuid::new_v4(),
            order_id,
            status,
            note: note.map(str::to_string),
            created_at: Utc::now(),
        });
        Ok(order)
    }

    async fn status_history(&self, order_id: Uuid) -> Result<Vec<OrderStatusEvent>, AppError> {
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }
}
