use std::env;
use anyhow::Result;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("DATABASE_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()?,
            username: env::var("DATABASE_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: env::var("DATABASE_PASSWORD")?,
            database: env::var("DATABASE_NAME").unwrap_or_else(|_| "vitrine".to_string()),
            ssl_mode: env::var("DATABASE_SSL_MODE").unwrap_or_else(|_| "prefer".to_string()),
        })
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

/// Service credentials for the Odoo JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct OdooConfig {
    pub url: String,
    pub db: String,
    pub username: String,
    pub api_key: String,
}

impl OdooConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("ODOO_URL")?,
            db: env::var("ODOO_DB")?,
            username: env::var("ODOO_USERNAME")?,
            api_key: env::var("ODOO_API_KEY")?,
        })
    }
}

/// Object storage bucket for product images.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub service_key: String,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env::var("STORAGE_URL")?,
            bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "product-images".to_string()),
            service_key: env::var("STORAGE_SERVICE_KEY")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub odoo: OdooConfig,
    pub storage: StorageConfig,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_pool: PgPool,
}

impl AppConfig {
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let database_config = DatabaseConfig::from_env()?;
        let database_pool = sqlx::PgPool::connect(&database_config.connection_string()).await?;

        Ok(Self {
            database: database_config,
            odoo: OdooConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            jwt_secret: env::var("JWT_SECRET")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cors_origins,
            database_pool,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
