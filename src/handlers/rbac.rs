// src/handlers/rbac.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermManageRoles, RequirePermission, RequireSuperAdmin},
    models::{
        order::MessageResponse,
        rbac::{
            AdminPermissionsResponse, CreatePermissionPayload, CreateRolePayload,
            Permission, PermissionIdsPayload, Role, RoleResponse, UpdatePermissionPayload,
            UpdateRolePayload,
        },
    },
};

// =============================================================================
//  PERMISSIONS
// =============================================================================

#[utoipa::path(
    post,
    path = "/permission/create",
    tag = "Permissions",
    request_body = CreatePermissionPayload,
    responses(
        (status = 201, description = "Permission created", body = Permission),
        (status = 409, description = "Name already taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_permission(
    State(app_state): State<AppState>,
    _guard: RequireSuperAdmin,
    Json(payload): Json<CreatePermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let permission = app_state
        .rbac_service
        .create_permission(&payload.name, &payload.label, &payload.module)
        .await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    get,
    path = "/permission/fetch",
    tag = "Permissions",
    responses(
        (status = 200, description = "Every permission", body = Vec<Permission>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(app_state.rbac_service.list_permissions().await?))
}

#[utoipa::path(
    patch,
    path = "/permission/update/{id}",
    tag = "Permissions",
    request_body = UpdatePermissionPayload,
    params(("id" = Uuid, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission updated", body = Permission),
        (status = 404, description = "Permission not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_permission(
    State(app_state): State<AppState>,
    _guard: RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionPayload>,
) -> Result<Json<Permission>, AppError> {
    payload.validate()?;

    let permission = app_state
        .rbac_service
        .update_permission(
            id,
            payload.name.as_deref(),
            payload.label.as_deref(),
            payload.module.as_deref(),
        )
        .await?;

    Ok(Json(permission))
}

#[utoipa::path(
    delete,
    path = "/permission/delete/{id}",
    tag = "Permissions",
    params(("id" = Uuid, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission deleted", body = MessageResponse),
        (status = 404, description = "Permission not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_permission(
    State(app_state): State<AppState>,
    _guard: RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.rbac_service.delete_permission(id).await?;
    Ok(Json(MessageResponse {
        message: "Permission deleted.".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/permission/assign/{adminId}/add",
    tag = "Permissions",
    request_body = PermissionIdsPayload,
    params(("adminId" = Uuid, Path, description = "Admin id")),
    responses(
        (status = 200, description = "The admin's extra permissions", body = Vec<Permission>),
        (status = 404, description = "Admin or permission not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_admin_permissions(
    State(app_state): State<AppState>,
    _guard: RequireSuperAdmin,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<PermissionIdsPayload>,
) -> Result<Json<Vec<Permission>>, AppError> {
    payload.validate()?;

    let extras = app_state
        .rbac_service
        .assign_extra_permissions(admin_id, &payload.permission_ids)
        .await?;

    Ok(Json(extras))
}

#[utoipa::path(
    post,
    path = "/permission/{adminId}/remove",
    tag = "Permissions",
    request_body = PermissionIdsPayload,
    params(("adminId" = Uuid, Path, description = "Admin id")),
    responses(
        (status = 200, description = "The admin's remaining extra permissions", body = Vec<Permission>),
        (status = 404, description = "Admin not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_admin_permissions(
    State(app_state): State<AppState>,
    _guard: RequireSuperAdmin,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<PermissionIdsPayload>,
) -> Result<Json<Vec<Permission>>, AppError> {
    payload.validate()?;

    let extras = app_state
        .rbac_service
        .unassign_extra_permissions(admin_id, &payload.permission_ids)
        .await?;

    Ok(Json(extras))
}

#[utoipa::path(
    get,
    path = "/permission/{adminId}",
    tag = "Permissions",
    params(("adminId" = Uuid, Path, description = "Admin id")),
    responses(
        (status = 200, description = "Effective permissions", body = AdminPermissionsResponse),
        (status = 404, description = "Admin not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn fetch_admin_permissions(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
    Path(admin_id): Path<Uuid>,
) -> Result<Json<AdminPermissionsResponse>, AppError> {
    Ok(Json(app_state.rbac_service.fetch_admin_permissions(admin_id).await?))
}

// =============================================================================
//  ROLES
// =============================================================================

#[utoipa::path(
    post,
    path = "/role/create",
    tag = "Roles",
    request_body = CreateRolePayload,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 409, description = "A role with this name already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .create_role(&payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/role/fetch",
    tag = "Roles",
    responses(
        (status = 200, description = "Assignable roles with their permissions", body = Vec<RoleResponse>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    Ok(Json(app_state.rbac_service.list_roles().await?))
}

#[utoipa::path(
    get,
    path = "/role/fetch/single/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role with its permissions", body = RoleResponse),
        (status = 404, description = "Role not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleResponse>, AppError> {
    Ok(Json(app_state.rbac_service.get_role(id).await?))
}

#[utoipa::path(
    post,
    path = "/role/assign/{roleId}/permissions",
    tag = "Roles",
    request_body = PermissionIdsPayload,
    params(("roleId" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role with its permissions", body = RoleResponse),
        (status = 404, description = "Role or permission not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_role_permissions(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<PermissionIdsPayload>,
) -> Result<Json<RoleResponse>, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .assign_permissions(role_id, &payload.permission_ids)
        .await?;

    Ok(Json(role))
}

#[utoipa::path(
    patch,
    path = "/role/update",
    tag = "Roles",
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 403, description = "The system role cannot be edited"),
        (status = 404, description = "Role or permission not found"),
        (status = 409, description = "A role with this name already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<Json<RoleResponse>, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .update_role(
            payload.id,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.permission_ids.as_deref(),
        )
        .await?;

    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/role/delete/{id}",
    tag = "Roles",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 403, description = "The system role cannot be deleted"),
        (status = 409, description = "Role is still assigned to an admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageRoles>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.rbac_service.delete_role(id).await?;
    Ok(Json(MessageResponse {
        message: "Role deleted.".to_string(),
    }))
}
