// Mock Odoo JSON-RPC server for testing the import client.
// Run with: cargo test --test odoo_mock_server

use axum::{extract::State, response::Json, routing::post, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use vitrine::config::OdooConfig;
use vitrine::services::odoo::{OdooClient, OdooError};

// ============================================================================
// Mock State
// ============================================================================

#[derive(Debug)]
pub struct MockOdooState {
    pub credentials_valid: bool,
    pub categories: Vec<Value>,
    pub products: Vec<Value>,
    pub partners: Vec<Value>,
}

impl Default for MockOdooState {
    fn default() -> Self {
        Self {
            credentials_valid: true,
            categories: vec![
                json!({
                    "id": 1,
                    "name": "All",
                    "parent_id": false,
                    "complete_name": "All"
                }),
                json!({
                    "id": 2,
                    "name": "Apparel",
                    "parent_id": [1, "All"],
                    "complete_name": "All / Apparel"
                }),
            ],
            products: vec![
                json!({
                    "id": 101,
                    "name": "Camiseta Básica",
                    "default_code": "TSHIRT-01",
                    "list_price": 100.0,
                    "standard_price": 60.0,
                    "qty_available": 12.0,
                    "categ_id": [2, "All / Apparel"],
                    "image_1920": false,
                    "description_sale": "Cotton t-shirt",
                    "active": true,
                    "type": "product"
                }),
                json!({
                    "id": 102,
                    "name": "Gift Wrapping",
                    "default_code": false,
                    "list_price": 5.0,
                    "standard_price": 5.0,
                    "qty_available": 0.0,
                    "categ_id": false,
                    "image_1920": false,
                    "description_sale": false,
                    "active": true,
                    "type": "service"
                }),
            ],
            partners: vec![json!({
                "id": 201,
                "name": "Ana Souza",
                "email": "ana.souza@example.com",
                "phone": "+55 11 99999-0000",
                "vat": false,
                "street": "Rua das Flores 10",
                "city": "São Paulo",
                "zip": "01000-000",
                "country_id": [31, "Brazil"]
            })],
        }
    }
}

type SharedState = Arc<RwLock<MockOdooState>>;

// ============================================================================
// JSON-RPC Endpoint
// ============================================================================

async fn jsonrpc_endpoint(State(state): State<SharedState>, Json(body): Json<Value>) -> Json<Value> {
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let params = body.get("params").cloned().unwrap_or_default();
    let service = params.get("service").and_then(Value::as_str).unwrap_or("");
    let method = params.get("method").and_then(Value::as_str).unwrap_or("");
    let args = params.get("args").cloned().unwrap_or(Value::Null);

    let state = state.read().await;

    let result = match (service, method) {
        ("common", "authenticate") => {
            if state.credentials_valid {
                json!(2)
            } else {
                json!(false)
            }
        }
        ("object", "execute_kw") => {
            let model = args.get(3).and_then(Value::as_str).unwrap_or("");
            match model {
                "product.category" => json!(state.categories),
                "product.product" => json!(state.products),
                "res.partner" => json!(state.partners),
                other => {
                    return Json(rpc_fault(id, &format!("Object {} doesn't exist", other)));
                }
            }
        }
        _ => {
            return Json(rpc_fault(id, "unsupported service"));
        }
    };

    Json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    }))
}

fn rpc_fault(id: Value, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": 200,
            "message": "Odoo Server Error",
            "data": { "message": message }
        }
    })
}

// ============================================================================
// Test Helpers
// ============================================================================

pub async fn start_mock_server() -> (String, SharedState) {
    let state = Arc::new(RwLock::new(MockOdooState::default()));

    let app = Router::new()
        .route("/jsonrpc", post(jsonrpc_endpoint))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    (format!("http://{}", addr), state)
}

fn client_for(url: &str) -> OdooClient {
    OdooClient::new(OdooConfig {
        url: url.to_string(),
        db: "vitrine".to_string(),
        username: "sync-bot".to_string(),
        api_key: "test-key".to_string(),
    })
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn authenticate_returns_a_session() {
    let (url, _state) = start_mock_server().await;

    let session = client_for(&url).authenticate().await.unwrap();
    assert_eq!(session.uid, 2);
}

#[tokio::test]
async fn bad_credentials_fail_authentication() {
    let (url, state) = start_mock_server().await;
    state.write().await.credentials_valid = false;

    let result = client_for(&url).authenticate().await;
    assert!(matches!(result, Err(OdooError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn fetches_products_with_falsy_fields_decoded() {
    let (url, _state) = start_mock_server().await;

    let client = client_for(&url);
    let session = client.authenticate().await.unwrap();
    let products = client.fetch_products(&session).await.unwrap();

    assert_eq!(products.len(), 2);

    let shirt = &products[0];
    assert_eq!(shirt.id, 101);
    assert_eq!(shirt.default_code.as_deref(), Some("TSHIRT-01"));
    assert_eq!(shirt.categ_id.as_ref().unwrap().id, 2);
    assert!(!shirt.is_service());

    let wrapping = &products[1];
    assert_eq!(wrapping.default_code, None);
    assert_eq!(wrapping.categ_id, None);
    assert!(wrapping.is_service());
}

#[tokio::test]
async fn fetches_the_category_tree_in_order() {
    let (url, _state) = start_mock_server().await;

    let client = client_for(&url);
    let session = client.authenticate().await.unwrap();
    let categories = client.fetch_categories(&session).await.unwrap();

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].full_path(), "All");
    assert_eq!(categories[1].full_path(), "All / Apparel");
    assert_eq!(categories[1].parent_id.as_ref().unwrap().id, 1);
}

#[tokio::test]
async fn fetches_partners_with_contact_fields() {
    let (url, _state) = start_mock_server().await;

    let client = client_for(&url);
    let session = client.authenticate().await.unwrap();
    let partners = client.fetch_partners(&session).await.unwrap();

    assert_eq!(partners.len(), 1);
    let ana = &partners[0];
    assert_eq!(ana.email.as_deref(), Some("ana.souza@example.com"));
    assert_eq!(ana.vat, None);
    assert_eq!(ana.country_id.as_ref().unwrap().name, "Brazil");
}

#[tokio::test]
async fn rpc_faults_surface_the_server_message() {
    let (url, state) = start_mock_server().await;
    // Drop the product model from the mock to force a fault.
    state.write().await.products.clear();

    let client = client_for(&url);
    let session = client.authenticate().await.unwrap();

    // An empty result set is not a fault; exercise the fault path through
    // an unsupported call instead.
    let fault = client
        .execute_kw(&session, "account.move", "search_read", json!([[]]), json!({}))
        .await;

    match fault {
        Err(OdooError::Rpc(message)) => assert!(message.contains("account.move")),
        other => panic!("expected RPC fault, got {:?}", other),
    }
}
