// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedAdmin};

/// A named permission a route can demand.
pub trait PermissionDef: Send + Sync + 'static {
    fn name() -> &'static str;
}

/// Rejects the request unless the caller's effective permissions contain
/// `T::name()`. Super administrators always pass.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let admin = AuthenticatedAdmin::from_request_parts(parts, state).await?;

        let required = T::name();
        if !app_state.rbac_service.has_permission(admin.0.id, required).await? {
            tracing::warn!("Admin {} denied: missing {}", admin.0.id, required);
            return Err(AppError::Forbidden(format!(
                "You need the '{}' permission to perform this action.",
                required
            )));
        }

        Ok(RequirePermission(PhantomData))
    }
}

/// Only admins holding the system role get through.
pub struct RequireSuperAdmin;

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let admin = AuthenticatedAdmin::from_request_parts(parts, state).await?;

        if !app_state.rbac_service.is_super_admin(admin.0.id).await? {
            return Err(AppError::Forbidden(
                "Only a super administrator can perform this action.".into(),
            ));
        }

        Ok(RequireSuperAdmin)
    }
}

// ---
// Permission types
// ---

pub struct PermManageRoles;
impl PermissionDef for PermManageRoles {
    fn name() -> &'static str { "MANAGE_ROLES" }
}

pub struct PermViewOrders;
impl PermissionDef for PermViewOrders {
    fn name() -> &'static str { "VIEW_ORDERS" }
}

pub struct PermManageOrders;
impl PermissionDef for PermManageOrders {
    fn name() -> &'static str { "MANAGE_ORDERS" }
}

pub struct PermManageShipping;
impl PermissionDef for PermManageShipping {
    fn name() -> &'static str { "MANAGE_SHIPPING" }
}
