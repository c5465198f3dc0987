// src/services/mod.rs

pub mod auth;
pub mod notification;
pub mod order_service;
pub mod payment_service;
pub mod rbac_service;
pub mod shipping;
pub mod tracking;
