// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn app(app_state: AppState) -> Router {
    let guard = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Staff accounts: login is public, the rest is protected
    let admin_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/create", post(handlers::auth::create_admin))
        .layer(guard())
        .route("/login", post(handlers::auth::login));

    let permission_routes = Router::new()
        .route("/create", post(handlers::rbac::create_permission))
        .route("/fetch", get(handlers::rbac::list_permissions))
        .route("/update/{id}", patch(handlers::rbac::update_permission))
        .route("/delete/{id}", delete(handlers::rbac::delete_permission))
        .route("/assign/{adminId}/add", post(handlers::rbac::assign_admin_permissions))
        .route("/{adminId}/remove", post(handlers::rbac::remove_admin_permissions))
        .route("/{adminId}", get(handlers::rbac::fetch_admin_permissions))
        .layer(guard());

    let role_routes = Router::new()
        .route("/create", post(handlers::rbac::create_role))
        .route("/fetch", get(handlers::rbac::list_roles))
        .route("/fetch/single/{id}", get(handlers::rbac::get_role))
        .route("/assign/{roleId}/permissions", post(handlers::rbac::assign_role_permissions))
        .route("/update", patch(handlers::rbac::update_role))
        .route("/delete/{id}", delete(handlers::rbac::delete_role))
        .layer(guard());

    // Checkout and tracking face the storefront. Order details carry customer
    // contact data and are staff only.
    let order_routes = Router::new()
        .route("/{id}", get(handlers::order::get_order))
        .route("/{id}/status", patch(handlers::order::update_status))
        .layer(guard())
        .route("/checkout", post(handlers::order::checkout))
        .route("/{id}/tracking", get(handlers::order::get_tracking));

    // Verification is authenticated by the gateway signature. Failure and
    // attach carry no proof from the gateway and are staff only.
    let payment_routes = Router::new()
        .route("/failure", post(handlers::payment::payment_failure))
        .route("/attach/{orderId}", post(handlers::payment::attach_razorpay_order))
        .layer(guard())
        .route("/verify", post(handlers::payment::verify_payment));

    let shipping_routes = Router::new()
        .route("/pickup-location", post(handlers::shipping::create_pickup_location))
        .route("/shipment", post(handlers::shipping::create_shipment))
        .route("/track/{awb}", get(handlers::shipping::track))
        .route("/cancel/{awb}", post(handlers::shipping::cancel))
        .route("/manifest", post(handlers::shipping::manifest))
        .route("/waybill", get(handlers::shipping::generate_waybill))
        .layer(guard());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/admin", admin_routes)
        .nest("/permission", permission_routes)
        .nest("/role", role_routes)
        .nest("/order", order_routes)
        .nest("/payment", payment_routes)
        .nest("/shipping", shipping_routes)
        .with_state(app_state)
}
