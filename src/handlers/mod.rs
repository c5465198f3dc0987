// src/handlers/mod.rs

pub mod auth;
pub mod order;
pub mod payment;
pub mod rbac;
pub mod shipping;
