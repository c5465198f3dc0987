// src/services/rbac_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AdminStore, RbacStore},
    models::rbac::{
        normalize_role_name, AdminAccess, AdminPermissionsResponse, Permission, Role,
        RoleResponse,
    },
};

// Length validators count whitespace, so blanks are caught after trimming.
fn required_field<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("Permission {} must not be blank.", field)));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct RbacService {
    repo: Arc<dyn RbacStore>,
    admins: Arc<dyn AdminStore>,
}

impl RbacService {
    pub fn new(repo: Arc<dyn RbacStore>, admins: Arc<dyn AdminStore>) -> Self {
        Self { repo, admins }
    }

    // =========================================================================
    //  PERMISSIONS
    // =========================================================================

    pub async fn create_permission(
        &self,
        name: &str,
        label: &str,
        module: &str,
    ) -> Result<Permission, AppError> {
        let name = required_field(name, "name")?;
        let label = required_field(label, "label")?;
        let module = required_field(module, "module")?;

        let permission = self.repo.create_permission(name, label, module).await?;

        tracing::info!("Permission {} created in module {}", permission.name, permission.module);
        Ok(permission)
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_permissions().await
    }

    pub async fn update_permission(
        &self,
        id: Uuid,
        name: Option<&str>,
        label: Option<&str>,
        module: Option<&str>,
    ) -> Result<Permission, AppError> {
        let name = name.map(|v| required_field(v, "name")).transpose()?;
        let label = label.map(|v| required_field(v, "label")).transpose()?;
        let module = module.map(|v| required_field(v, "module")).transpose()?;

        self.repo.update_permission(id, name, label, module).await
    }

    pub async fn delete_permission(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_permission(id).await?;
        tracing::info!("Permission {} deleted", id);
        Ok(())
    }

    // =========================================================================
    //  ROLES
    // =========================================================================

    pub async fn create_role(&self, name: &str, description: Option<&str>) -> Result<Role, AppError> {
        let name = normalize_role_name(name);
        if name.is_empty() {
            return Err(AppError::BadRequest("Role name is required.".into()));
        }

        // No existence pre-check: the unique index is the only arbiter.
        let role = self.repo.create_role(&name, description).await?;

        tracing::info!("Role {} created", role.name);
        Ok(role)
    }

    /// Every assignable role with its permissions. System roles never appear.
    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_assignable_roles().await?;
        let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();

        let mut by_role: HashMap<Uuid, Vec<Permission>> = HashMap::new();
        for (role_id, permission) in self.repo.permissions_of_roles(&role_ids).await? {
            by_role.entry(role_id).or_default().push(permission);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let permissions = by_role.remove(&role.id).unwrap_or_default();
                RoleResponse { role, permissions }
            })
            .collect())
    }

    pub async fn get_role(&self, id: Uuid) -> Result<RoleResponse, AppError> {
        let role = self
            .repo
            .find_role(id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;

        let permissions = self
            .repo
            .permissions_of_roles(&[id])
            .await?
            .into_iter()
            .map(|(_, p)| p)
            .collect();

        Ok(RoleResponse { role, permissions })
    }

    /// Additive grant: missing pairs are created, nothing is revoked.
    pub async fn assign_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<RoleResponse, AppError> {
        self.repo
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;

        self.repo.grant_role_permissions(role_id, permission_ids).await?;

        tracing::info!("Granted {} permission(s) to role {}", permission_ids.len(), role_id);
        self.get_role(role_id).await
    }

    /// Role edit form. `permission_ids`, when present, replaces the whole set.
    pub async fn update_role(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<RoleResponse, AppError> {
        let existing = self
            .repo
            .find_role(id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;
        if existing.is_system {
            return Err(AppError::Forbidden("The built-in admin role cannot be edited.".into()));
        }

        let name = name.map(normalize_role_name);
        if name.as_deref() == Some("") {
            return Err(AppError::BadRequest("Role name cannot be empty.".into()));
        }

        self.repo
            .update_role(id, name.as_deref(), description, permission_ids)
            .await?;

        tracing::info!("Role {} updated", id);
        self.get_role(id).await
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<(), AppError> {
        let role = self
            .repo
            .find_role(id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found."))?;
        if role.is_system {
            return Err(AppError::Forbidden("The built-in admin role cannot be deleted.".into()));
        }

        self.repo.delete_role(id).await?;
        tracing::info!("Role {} deleted", role.name);
        Ok(())
    }

    // =========================================================================
    //  PER-ADMIN OVERRIDES
    // =========================================================================

    async fn ensure_admin(&self, admin_id: Uuid) -> Result<(), AppError> {
        self.admins
            .find_by_id(admin_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Admin not found."))
    }

    pub async fn assign_extra_permissions(
        &self,
        admin_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, AppError> {
        self.ensure_admin(admin_id).await?;
        self.repo.grant_extra_permissions(admin_id, permission_ids).await?;
        self.repo.extra_permissions(admin_id).await
    }

    pub async fn unassign_extra_permissions(
        &self,
        admin_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, AppError> {
        self.ensure_admin(admin_id).await?;
        self.repo.revoke_extra_permissions(admin_id, permission_ids).await?;
        self.repo.extra_permissions(admin_id).await
    }

    // =========================================================================
    //  RESOLUTION
    // =========================================================================

    pub async fn admin_access(&self, admin_id: Uuid) -> Result<AdminAccess, AppError> {
        self.repo
            .admin_access(admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Admin not found."))
    }

    /// role permissions ∪ extra permissions, each permission once.
    pub async fn fetch_admin_permissions(
        &self,
        admin_id: Uuid,
    ) -> Result<AdminPermissionsResponse, AppError> {
        Ok(self.admin_access(admin_id).await?.into())
    }

    pub async fn has_permission(&self, admin_id: Uuid, permission: &str) -> Result<bool, AppError> {
        let access = self.admin_access(admin_id).await?;
        if access.is_super_admin() {
            return Ok(true);
        }
        Ok(access
            .role_permissions
            .iter()
            .chain(access.extra_permissions.iter())
            .any(|p| p.name == permission))
    }

    pub async fn is_super_admin(&self, admin_id: Uuid) -> Result<bool, AppError> {
        Ok(self.admin_access(admin_id).await?.is_super_admin())
    }
}
