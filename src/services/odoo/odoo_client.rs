// JSON-RPC 2.0 client for the Odoo external API. Two logical channels share
// one endpoint: the `common` service for authentication and the `object`
// service for generic model calls (`execute_kw` / `search_read`).
//
// Odoo encodes absent values as boolean `false` and many2one references as
// `[id, name]` pairs; both quirks are absorbed here so the rest of the
// pipeline sees ordinary Options.

use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::config::OdooConfig;

/// Upper bound on one bulk fetch.
pub const FETCH_LIMIT: usize = 5000;

#[derive(Error, Debug)]
pub enum OdooError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Odoo RPC fault: {0}")]
    Rpc(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, OdooError>;

/// Opaque session handle returned by `authenticate`, consumed by every
/// subsequent model call.
#[derive(Debug, Clone, Copy)]
pub struct OdooSession {
    pub uid: i64,
}

pub struct OdooClient {
    config: OdooConfig,
    endpoint: String,
    http_client: Client,
    next_request_id: AtomicU64,
}

impl OdooClient {
    pub fn new(config: OdooConfig) -> Self {
        let endpoint = format!("{}/jsonrpc", config.url.trim_end_matches('/'));
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            config,
            endpoint,
            http_client,
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Establish a session with the long-lived service credentials. Odoo
    /// answers `false` (not an error) for bad credentials.
    pub async fn authenticate(&self) -> Result<OdooSession> {
        let result = self
            .call(
                "common",
                "authenticate",
                json!([self.config.db, self.config.username, self.config.api_key, {}]),
            )
            .await
            .map_err(|e| OdooError::AuthenticationFailed(e.to_string()))?;

        match result.as_i64() {
            Some(uid) if uid > 0 => Ok(OdooSession { uid }),
            _ => Err(OdooError::AuthenticationFailed(
                "server did not return a session id".to_string(),
            )),
        }
    }

    pub async fn execute_kw(
        &self,
        session: &OdooSession,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        self.call(
            "object",
            "execute_kw",
            json!([
                self.config.db,
                session.uid,
                self.config.api_key,
                model,
                method,
                args,
                kwargs
            ]),
        )
        .await
    }

    /// Full category tree, ordered so parents precede children.
    pub async fn fetch_categories(&self, session: &OdooSession) -> Result<Vec<OdooCategory>> {
        let result = self
            .execute_kw(
                session,
                "product.category",
                "search_read",
                json!([[]]),
                json!({
                    "fields": ["id", "name", "parent_id", "complete_name"],
                    "order": "complete_name asc",
                }),
            )
            .await?;

        serde_json::from_value(result)
            .map_err(|e| OdooError::UnexpectedResponse(format!("category list: {}", e)))
    }

    /// Saleable products with a static field projection, capped at
    /// [`FETCH_LIMIT`].
    pub async fn fetch_products(&self, session: &OdooSession) -> Result<Vec<OdooProduct>> {
        let result = self
            .execute_kw(
                session,
                "product.product",
                "search_read",
                json!([[["sale_ok", "=", true]]]),
                json!({
                    "fields": [
                        "id", "name", "default_code", "list_price", "standard_price",
                        "qty_available", "categ_id", "image_1920", "description_sale",
                        "active", "type"
                    ],
                    "limit": FETCH_LIMIT,
                }),
            )
            .await?;

        serde_json::from_value(result)
            .map_err(|e| OdooError::UnexpectedResponse(format!("product list: {}", e)))
    }

    /// All person-type contacts that have an email address. Unlike products
    /// there is no cap; the partner set is small.
    pub async fn fetch_partners(&self, session: &OdooSession) -> Result<Vec<OdooPartner>> {
        let result = self
            .execute_kw(
                session,
                "res.partner",
                "search_read",
                json!([[["is_company", "=", false], ["email", "!=", false]]]),
                json!({
                    "fields": [
                        "id", "name", "email", "phone", "vat",
                        "street", "city", "zip", "country_id"
                    ],
                }),
            )
            .await?;

        serde_json::from_value(result)
            .map_err(|e| OdooError::UnexpectedResponse(format!("partner list: {}", e)))
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> Result<Value> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": request_id,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OdooError::Rpc(format!(
                "endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        if let Some(fault) = body.get("error") {
            let message = fault
                .pointer("/data/message")
                .and_then(Value::as_str)
                .or_else(|| fault.get("message").and_then(Value::as_str))
                .unwrap_or("unknown fault");
            return Err(OdooError::Rpc(message.to_string()));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

// ============================================================================
// Record shapes
// ============================================================================

/// Resolved many2one reference, decoded from Odoo's `[id, name]` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct OdooRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooCategory {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub parent_id: Option<OdooRef>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub complete_name: Option<String>,
}

impl OdooCategory {
    /// Path string like `All / Apparel / Shirts`; falls back to the bare
    /// name when the server omits it.
    pub fn full_path(&self) -> &str {
        self.complete_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooProduct {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub default_code: Option<String>,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default)]
    pub standard_price: f64,
    #[serde(default)]
    pub qty_available: f64,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub categ_id: Option<OdooRef>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub image_1920: Option<String>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub description_sale: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(rename = "type", default)]
    pub product_type: String,
}

impl OdooProduct {
    /// Service-type items are never materialized locally.
    pub fn is_service(&self) -> bool {
        self.product_type == "service"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdooPartner {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub vat: Option<String>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "deserialize_falsy_string")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "deserialize_many2one")]
    pub country_id: Option<OdooRef>,
}

fn default_true() -> bool {
    true
}

/// Odoo returns `false` where a text field is unset.
fn deserialize_falsy_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        Value::String(_) | Value::Bool(false) | Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "expected string or false, got {}",
            other
        ))),
    }
}

/// Odoo encodes many2one fields as `[id, name]`, or `false` when unset.
fn deserialize_many2one<'de, D>(deserializer: D) -> std::result::Result<Option<OdooRef>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => {
            let id = items
                .first()
                .and_then(Value::as_i64)
                .ok_or_else(|| serde::de::Error::custom("many2one pair missing numeric id"))?;
            let name = items
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(Some(OdooRef { id, name }))
        }
        Value::Bool(false) | Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "expected [id, name] or false, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_product_with_falsy_fields() {
        let product: OdooProduct = serde_json::from_value(json!({
            "id": 42,
            "name": "Desk Lamp",
            "default_code": false,
            "list_price": 100.0,
            "standard_price": 60.0,
            "qty_available": 3.0,
            "categ_id": false,
            "image_1920": false,
            "description_sale": false,
            "active": true,
            "type": "product"
        }))
        .unwrap();

        assert_eq!(product.default_code, None);
        assert_eq!(product.categ_id, None);
        assert_eq!(product.image_1920, None);
        assert!(!product.is_service());
    }

    #[test]
    fn decodes_many2one_pairs() {
        let product: OdooProduct = serde_json::from_value(json!({
            "id": 7,
            "name": "T-Shirt",
            "categ_id": [12, "All / Apparel"],
            "type": "service"
        }))
        .unwrap();

        assert_eq!(
            product.categ_id,
            Some(OdooRef {
                id: 12,
                name: "All / Apparel".to_string()
            })
        );
        assert!(product.is_service());
    }

    #[test]
    fn category_falls_back_to_name_when_path_missing() {
        let category: OdooCategory = serde_json::from_value(json!({
            "id": 3,
            "name": "Shoes",
            "parent_id": false,
            "complete_name": false
        }))
        .unwrap();

        assert_eq!(category.full_path(), "Shoes");

        let nested: OdooCategory = serde_json::from_value(json!({
            "id": 4,
            "name": "Sneakers",
            "parent_id": [3, "Shoes"],
            "complete_name": "All / Shoes / Sneakers"
        }))
        .unwrap();

        assert_eq!(nested.full_path(), "All / Shoes / Sneakers");
        assert_eq!(nested.parent_id.as_ref().unwrap().id, 3);
    }

    #[test]
    fn rejects_garbage_in_falsy_fields() {
        let result: std::result::Result<OdooProduct, _> = serde_json::from_value(json!({
            "id": 1,
            "name": "Bad",
            "default_code": 17
        }));
        assert!(result.is_err());
    }
}
