// src/models/shipping.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PickupLocationPayload {
    #[validate(length(min = 1, message = "Warehouse name is required."))]
    #[schema(example = "Jaipur Studio")]
    pub name: String,
    #[validate(length(min = 1, message = "Phone is required."))]
    pub phone: String,
    #[validate(email(message = "The email provided is invalid."))]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required."))]
    pub address: String,
    pub city: String,
    #[validate(length(equal = 6, message = "PIN code must have 6 digits."))]
    pub pin: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub return_address: Option<String>,
    pub return_pin: Option<String>,
}

fn default_country() -> String {
    "India".to_string()
}

/// Shipment creation body. `shipments` is forwarded as-is to the courier.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateShipmentPayload {
    #[validate(length(min = 1, message = "At least one shipment is required."))]
    #[schema(value_type = Vec<Object>)]
    pub shipments: Vec<serde_json::Value>,

    #[validate(length(min = 1, message = "Pickup location name is required."))]
    pub pickup_location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ManifestPayload {
    #[validate(length(min = 1, message = "Pickup location name is required."))]
    pub pickup_location: String,
    /// YYYY-MM-DD
    #[validate(length(equal = 10, message = "Pickup date must be YYYY-MM-DD."))]
    pub pickup_date: String,
    /// HH:MM:SS
    pub pickup_time: String,
    #[validate(range(min = 1, message = "Expected package count must be at least 1."))]
    pub expected_package_count: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WaybillQuery {
    pub count: Option<u32>,
}
