// Public storefront reads over the synchronized catalog.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::config::AppConfig;
use crate::middleware::error_handling::{AppError, Result};
use crate::models::catalog::{CategoryListResponse, ProductListResponse, SearchProductsRequest};
use crate::repositories::{CategoryRepository, ProductRepository};

/// GET /api/catalog/products
pub async fn search_products(
    State(config): State<AppConfig>,
    Query(request): Query<SearchProductsRequest>,
) -> Result<impl IntoResponse> {
    request.validate()?;

    let repo = ProductRepository::new(config.database_pool.clone());
    let products = repo.search(&request).await?;

    Ok(Json(ProductListResponse {
        total: products.len(),
        products,
    }))
}

/// GET /api/catalog/products/:slug
pub async fn get_product(
    State(config): State<AppConfig>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let repo = ProductRepository::new(config.database_pool.clone());
    let product = repo
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {}", slug)))?;

    Ok(Json(product))
}

/// GET /api/catalog/categories
pub async fn list_categories(State(config): State<AppConfig>) -> Result<impl IntoResponse> {
    let repo = CategoryRepository::new(config.database_pool.clone());
    let categories = repo.list_all().await?;

    Ok(Json(CategoryListResponse {
        total: categories.len(),
        categories,
    }))
}
