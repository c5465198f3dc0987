pub mod auth;
pub mod order;
pub mod rbac;
pub mod shipping;
