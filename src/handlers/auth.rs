// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedAdmin, rbac::RequireSuperAdmin},
    models::auth::{Admin, AuthResponse, CreateAdminPayload, LoginPayload, MeResponse},
};

#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

#[utoipa::path(
    get,
    path = "/admin/me",
    tag = "Auth",
    responses(
        (status = 200, description = "The authenticated admin", body = MeResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
) -> Result<Json<MeResponse>, AppError> {
    let access = app_state.rbac_service.admin_access(admin.id).await?;

    Ok(Json(MeResponse {
        role_name: access.role.name.clone(),
        is_super_admin: access.is_super_admin(),
        permissions: access.effective_permissions(),
        admin,
    }))
}

#[utoipa::path(
    post,
    path = "/admin/create",
    tag = "Auth",
    request_body = CreateAdminPayload,
    responses(
        (status = 201, description = "Admin created", body = Admin),
        (status = 403, description = "Caller is not a super administrator"),
        (status = 404, description = "Role not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_admin(
    State(app_state): State<AppState>,
    _guard: RequireSuperAdmin,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let admin = app_state
        .auth_service
        .create_admin(&payload.name, &payload.email, &payload.password, payload.role_id)
        .await?;

    Ok((StatusCode::CREATED, Json(admin)))
}
