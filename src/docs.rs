// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::create_admin,

        // --- Permissions ---
        handlers::rbac::create_permission,
        handlers::rbac::list_permissions,
        handlers::rbac::update_permission,
        handlers::rbac::delete_permission,
        handlers::rbac::assign_admin_permissions,
        handlers::rbac::remove_admin_permissions,
        handlers::rbac::fetch_admin_permissions,

        // --- Roles ---
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::get_role,
        handlers::rbac::assign_role_permissions,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,

        // --- Orders ---
        handlers::order::checkout,
        handlers::order::get_order,
        handlers::order::get_tracking,
        handlers::order::update_status,

        // --- Payments ---
        handlers::payment::verify_payment,
        handlers::payment::payment_failure,
        handlers::payment::attach_razorpay_order,

        // --- Shipping ---
        handlers::shipping::create_pickup_location,
        handlers::shipping::create_shipment,
        handlers::shipping::track,
        handlers::shipping::cancel,
        handlers::shipping::manifest,
        handlers::shipping::generate_waybill,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Admin,
            models::auth::LoginPayload,
            models::auth::CreateAdminPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,

            // --- RBAC ---
            models::rbac::Permission,
            models::rbac::Role,
            models::rbac::RoleResponse,
            models::rbac::AdminPermissionsResponse,
            models::rbac::CreatePermissionPayload,
            models::rbac::UpdatePermissionPayload,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::PermissionIdsPayload,

            // --- Orders ---
            models::order::PaymentStatus,
            models::order::OrderStatus,
            models::order::Customer,
            models::order::Order,
            models::order::OrderItem,
            models::order::PaymentHistory,
            models::order::OrderStatusEvent,
            models::order::OrderDetail,
            models::order::CheckoutCustomer,
            models::order::CheckoutItem,
            models::order::CheckoutPayload,
            models::order::UpdateOrderStatusPayload,
            models::order::TrackingStep,
            models::order::TrackingResponse,

            // --- Payments ---
            models::order::VerifyPaymentPayload,
            models::order::PaymentFailurePayload,
            models::order::AttachRazorpayOrderPayload,
            models::order::MessageResponse,

            // --- Shipping ---
            models::shipping::PickupLocationPayload,
            models::shipping::CreateShipmentPayload,
            models::shipping::ManifestPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Staff login and accounts"),
        (name = "Permissions", description = "Permission catalogue and per-admin overrides"),
        (name = "Roles", description = "Roles and their permission sets"),
        (name = "Orders", description = "Checkout, order status and tracking"),
        (name = "Payments", description = "Razorpay payment verification"),
        (name = "Shipping", description = "Delhivery courier operations")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/admin/login",
            "/permission/{adminId}",
            "/role/update",
            "/order/{id}/tracking",
            "/payment/verify",
            "/shipping/waybill",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("api_jwt"));
    }

    #[test]
    fn permission_id_examples_are_rendered() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("550e8400-e29b-41d4-a716-446655440001"));
    }

    #[test]
    fn staff_payment_routes_declare_bearer_auth() {
        let doc = ApiDoc::openapi();
        for (path, op) in [
            ("/payment/failure", "post"),
            ("/payment/attach/{orderId}", "post"),
            ("/order/{id}", "get"),
        ] {
            let item = serde_json::to_value(&doc.paths.paths[path]).unwrap();
            assert!(item[op]["security"].is_array(), "{} has no security", path);
        }
    }
}
