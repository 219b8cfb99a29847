use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine::config::AppConfig;
use vitrine::handlers::{
    catalog::{get_product, list_categories, search_products},
    odoo_sync::{get_sync_logs, import_consultants, import_products},
};
use vitrine::middleware::{admin_middleware, auth_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "vitrine=info,tower_http=info,sqlx=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().await?;

    sqlx::migrate!().run(&config.database_pool).await?;

    let addr = config.server_address();
    let app = create_app(config);

    tracing::info!("Starting vitrine server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_app(config: AppConfig) -> Router {
    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_credentials(true)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
        ]);

    Router::new()
        .route("/api/health", get(health_check))
        .nest(
            "/api/catalog",
            Router::new()
                .route("/products", get(search_products))
                .route("/products/:slug", get(get_product))
                .route("/categories", get(list_categories)),
        )
        .nest(
            "/api/odoo",
            Router::new()
                .route("/import-products", post(import_products))
                .route("/import-consultants", post(import_consultants))
                .route("/sync-logs", get(get_sync_logs))
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    config.clone(),
                    auth_middleware,
                )),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(config)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
