// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{missing_reference, still_referenced, unique_violation},
        error::AppError,
    },
    db::RbacStore,
    models::rbac::{AdminAccess, Permission, Role},
};

const ROLE_EXISTS: &str = "Role already exists.";
const PERMISSION_EXISTS: &str = "A permission with this name already exists.";
const PERMISSION_MISSING: &str = "One or more permissions do not exist.";

#[derive(FromRow)]
struct RolePermissionRow {
    role_id: Uuid,
    #[sqlx(flatten)]
    permission: Permission,
}

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Bulk link with UNNEST; pairs that already exist are skipped.
    async fn insert_role_permissions<'e, E>(
        executor: E,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await
        .map_err(|e| missing_reference(e, PERMISSION_MISSING))?;

        Ok(())
    }

    async fn permissions_for_role<'e, E>(
        executor: E,
        role_id: Uuid,
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.*
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.module, p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;

        Ok(permissions)
    }
}

#[async_trait]
impl RbacStore for RbacRepository {
    // =========================================================================
    //  PERMISSIONS
    // =========================================================================

    async fn create_permission(
        &self,
        name: &str,
        label: &str,
        module: &str,
    ) -> Result<Permission, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (name, label, module)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(label)
        .bind(module)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, PERMISSION_EXISTS))
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions ORDER BY module, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn update_permission(
        &self,
        id: Uuid,
        name: Option<&str>,
        label: Option<&str>,
        module: Option<&str>,
    ) -> Result<Permission, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions
            SET name = COALESCE($2, name),
                label = COALESCE($3, label),
                module = COALESCE($4, module),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(label)
        .bind(module)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, PERMISSION_EXISTS))?
        .ok_or_else(|| AppError::not_found("Permission not found."))
    }

    async fn delete_permission(&self, id: Uuid) -> Result<(), AppError> {
        // role_permissions and admin_extra_permissions cascade
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Permission not found."));
        }
        Ok(())
    }

    // =========================================================================
    //  ROLES
    // =========================================================================

    async fn create_role(&self, name: &str, description: Option<&str>) -> Result<Role, AppError> {
        // Relies on roles_name_lower_key; two concurrent creators cannot both win.
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, ROLE_EXISTS))
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn find_system_role(&self) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE is_system = true ORDER BY created_at LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn list_assignable_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE is_system = false ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn permissions_of_roles(
        &self,
        role_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, Permission)>, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT rp.role_id, p.*
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY p.module, p.name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.role_id, r.permission)).collect())
    }

    async fn grant_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        Self::insert_role_permissions(&self.pool, role_id, permission_ids).await
    }

    async fn update_role(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1 AND is_system = false
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, ROLE_EXISTS))?
        .ok_or_else(|| AppError::not_found("Role not found."))?;

        if let Some(permission_ids) = permission_ids {
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if !permission_ids.is_empty() {
                Self::insert_role_permissions(&mut *tx, id, permission_ids).await?;
            }
        }

        // Dropping tx without commit rolls everything back.
        tx.commit().await?;

        Ok(role)
    }

    async fn delete_role(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND is_system = false")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| still_referenced(e, "Role is still assigned to one or more admins."))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Role not found."));
        }
        Ok(())
    }

    // =========================================================================
    //  EXTRA PERMISSIONS (per admin)
    // =========================================================================

    async fn grant_extra_permissions(
        &self,
        admin_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO admin_extra_permissions (admin_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(admin_id)
        .bind(permission_ids)
        .execute(&self.pool)
        .await
        .map_err(|e| missing_reference(e, PERMISSION_MISSING))?;

        Ok(())
    }

    async fn revoke_extra_permissions(
        &self,
        admin_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM admin_extra_permissions WHERE admin_id = $1 AND permission_id = ANY($2)",
        )
        .bind(admin_id)
        .bind(permission_ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn extra_permissions(&self, admin_id: Uuid) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.*
            FROM admin_extra_permissions ap
            JOIN permissions p ON p.id = ap.permission_id
            WHERE ap.admin_id = $1
            ORDER BY p.module, p.name
            "#,
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn admin_access(&self, admin_id: Uuid) -> Result<Option<AdminAccess>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.*
            FROM admins a
            JOIN roles r ON r.id = a.role_id
            WHERE a.id = $1
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(role) = role else {
            return Ok(None);
        };

        let role_permissions = Self::permissions_for_role(&self.pool, role.id).await?;
        let extra_permissions = self.extra_permissions(admin_id).await?;

        Ok(Some(AdminAccess {
            admin_id,
            role,
            role_permissions,
            extra_permissions,
        }))
    }
}
