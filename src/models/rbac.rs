// src/models/rbac.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// What comes out of the `permissions` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,

    #[schema(example = "EDIT_BLOG")]
    pub name: String,

    #[schema(example = "Edit Blog")]
    pub label: String,

    #[schema(example = "CMS")]
    pub module: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// What comes out of the `roles` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "editor")]
    pub name: String,

    #[schema(example = "content editor")]
    pub description: Option<String>,

    /// The built-in super administrator role. Never listed, never editable.
    pub is_system: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Role plus its permission list
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    pub permissions: Vec<Permission>,
}

/// Everything needed to resolve what an admin may do.
#[derive(Debug, Clone)]
pub struct AdminAccess {
    pub admin_id: Uuid,
    pub role: Role,
    pub role_permissions: Vec<Permission>,
    pub extra_permissions: Vec<Permission>,
}

impl AdminAccess {
    pub fn is_super_admin(&self) -> bool {
        self.role.is_system
    }

    /// Role permissions first, then extras the role doesn't already grant.
    pub fn effective_permissions(&self) -> Vec<Permission> {
        merge_permissions(&self.role_permissions, &self.extra_permissions)
    }
}

/// Union of two permission lists, deduplicated by id, keeping first-seen order.
pub fn merge_permissions(role: &[Permission], extra: &[Permission]) -> Vec<Permission> {
    let mut seen = HashSet::with_capacity(role.len() + extra.len());
    role.iter()
        .chain(extra.iter())
        .filter(|p| seen.insert(p.id))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPermissionsResponse {
    pub admin_id: Uuid,
    pub role: Role,
    pub is_super_admin: bool,
    pub permissions: Vec<Permission>,
}

impl From<AdminAccess> for AdminPermissionsResponse {
    fn from(access: AdminAccess) -> Self {
        let permissions = access.effective_permissions();
        Self {
            admin_id: access.admin_id,
            is_super_admin: access.is_super_admin(),
            role: access.role,
            permissions,
        }
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionPayload {
    #[validate(length(min = 1, message = "Permission name is required."))]
    #[schema(example = "EDIT_BLOG")]
    pub name: String,

    #[validate(length(min = 1, message = "Permission label is required."))]
    #[schema(example = "Edit Blog")]
    pub label: String,

    #[validate(length(min = 1, message = "Permission module is required."))]
    #[schema(example = "CMS")]
    pub module: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionPayload {
    #[validate(length(min = 1, message = "Permission name cannot be empty."))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Permission label cannot be empty."))]
    pub label: Option<String>,

    #[validate(length(min = 1, message = "Permission module cannot be empty."))]
    pub module: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, message = "Role name is required."))]
    #[schema(example = "editor")]
    pub name: String,

    #[schema(example = "content editor")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    pub id: Uuid,

    #[validate(length(min = 1, message = "Role name cannot be empty."))]
    pub name: Option<String>,

    pub description: Option<String>,

    /// When present, becomes the role's complete permission set.
    #[schema(example = json!(["550e8400-e29b-41d4-a716-446655440001"]))]
    pub permission_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionIdsPayload {
    #[validate(length(min = 1, message = "At least one permission id is required."))]
    #[schema(example = json!(["550e8400-e29b-41d4-a716-446655440001"]))]
    pub permission_ids: Vec<Uuid>,
}

/// Trimmed, lower-case role name as stored.
pub fn normalize_role_name(name: &str) -> String {
    name.trim().to_lowercase()
}
