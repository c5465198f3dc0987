// src/services/shipping.rs
//
// Delhivery REST client. Responses are passed through untouched.

use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    models::shipping::{CreateShipmentPayload, ManifestPayload, PickupLocationPayload},
};

pub const DEFAULT_BASE_URL: &str = "https://track.delhivery.com";

#[derive(Clone)]
pub struct DelhiveryClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl DelhiveryClient {
    pub fn new(base_url: String, api_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, AppError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or_else(|| AppError::Upstream("Delhivery API token is not configured".into()))?;
        Ok(request
            .header("Authorization", format!("Token {}", token))
            .header("Accept", "application/json"))
    }

    async fn send(&self, what: &str, request: RequestBuilder) -> Result<Value, AppError> {
        let response = self
            .authorized(request)?
            .send()
            .await
            .map_err(|e| upstream(what, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| upstream(what, e))?;

        if !status.is_success() {
            return Err(upstream(what, format!("HTTP {}: {}", status, body)));
        }

        // Some endpoints answer with plain text.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    pub async fn create_pickup_location(
        &self,
        payload: &PickupLocationPayload,
    ) -> Result<Value, AppError> {
        let body = json!({
            "name": payload.name,
            "phone": payload.phone,
            "email": payload.email,
            "address": payload.address,
            "city": payload.city,
            "pin": payload.pin,
            "country": payload.country,
            "return_address": payload.return_address.as_deref().unwrap_or(&payload.address),
            "return_pin": payload.return_pin.as_deref().unwrap_or(&payload.pin),
        });
        let request = self
            .http
            .post(self.url("/api/backend/clientwarehouse/create/"))
            .json(&body);
        self.send("create pickup location", request).await
    }

    pub async fn create_shipment(&self, payload: &CreateShipmentPayload) -> Result<Value, AppError> {
        let data = json!({
            "shipments": payload.shipments,
            "pickup_location": { "name": payload.pickup_location },
        });
        let request = self
            .http
            .post(self.url("/api/cmu/create.json"))
            .form(&[("format", "json".to_string()), ("data", data.to_string())]);
        self.send("create shipment", request).await
    }

    pub async fn track(&self, awb: &str) -> Result<Value, AppError> {
        let request = self
            .http
            .get(self.url("/api/v1/packages/json/"))
            .query(&[("waybill", awb)]);
        self.send("track shipment", request).await
    }

    pub async fn cancel(&self, awb: &str) -> Result<Value, AppError> {
        let request = self
            .http
            .post(self.url("/api/p/edit"))
            .json(&json!({ "waybill": awb, "cancellation": "true" }));
        self.send("cancel shipment", request).await
    }

    pub async fn manifest(&self, payload: &ManifestPayload) -> Result<Value, AppError> {
        let request = self.http.post(self.url("/fm/request/new/")).json(&json!({
            "pickup_location": payload.pickup_location,
            "pickup_date": payload.pickup_date,
            "pickup_time": payload.pickup_time,
            "expected_package_count": payload.expected_package_count,
        }));
        self.send("request pickup", request).await
    }

    pub async fn generate_waybill(&self, count: u32) -> Result<Value, AppError> {
        let request = self
            .http
            .get(self.url("/waybill/api/bulk/json/"))
            .query(&[("count", count.max(1))]);
        self.send("generate waybill", request).await
    }
}

fn upstream(what: &str, cause: impl std::fmt::Display) -> AppError {
    tracing::error!("Delhivery {} failed: {}", what, cause);
    AppError::Upstream(format!("Delhivery {} failed", what))
}
