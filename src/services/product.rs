//! Product services - Endpoint HTTP per la gestione dei prodotti

use crate::core::{AppError, AppState};
use crate::dtos::ProductListQuery;
use crate::entities::Product;
use crate::repositories::{Attributes, BaseRepository, Paginator};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Relazioni caricate sul dettaglio di un prodotto
const PRODUCT_DETAIL_RELATIONS: &[&str] = &["category", "supplier", "images"];

#[instrument(skip(state, params))]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>, // /products?page=2&page_size=10&is_active=true
) -> Result<Json<Paginator<Product>>, AppError> {
    debug!("Listing products");
    // 1. Separare page/page_size dai filtri
    // 2. Contare e leggere la pagina richiesta (colonne sconosciute -> 400)
    let query = ProductListQuery::from_params(params)?;
    let page = state
        .product
        .get_all_paginated(&query.search, query.page)
        .await?;

    info!(
        "Returning page {} of {} ({} products in total)",
        page.current_page, page.last_page, page.total
    );
    Ok(Json(page))
}

#[instrument(skip(state), fields(product_id = %product_id))]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    debug!("Fetching product with relations");
    let product = state
        .product
        .with(PRODUCT_DETAIL_RELATIONS)
        .find_or_fail(json!(product_id), None)
        .await?;

    Ok(Json(product))
}

#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Attributes>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating product");
    // i campi fuori dal FILLABLE vengono ignorati dal repository
    let product = state.product.create(&body).await?.ok_or_else(|| {
        warn!("Product creation rejected");
        AppError::unprocessable_entity("Product could not be created")
    })?;

    info!("Product {} created", product.product_id);
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, body), fields(product_id = %product_id))]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(body): Json<Attributes>,
) -> Result<Json<Product>, AppError> {
    debug!("Updating product");
    let product = state
        .product
        .update(product_id, &body)
        .await?
        .ok_or_else(|| {
            warn!("Product update rejected");
            AppError::unprocessable_entity("Product could not be updated")
        })?;

    info!("Product updated");
    Ok(Json(product))
}

#[instrument(skip(state, body), fields(sku = %sku))]
pub async fn upsert_product_by_sku(
    State(state): State<Arc<AppState>>,
    Path(sku): Path<String>,
    Json(body): Json<Attributes>,
) -> Result<Json<Product>, AppError> {
    debug!("Updating or creating product by SKU");
    let mut lookup = Attributes::new();
    lookup.insert("sku".to_string(), Value::String(sku));

    let product = state
        .product
        .update_or_create(&lookup, &body)
        .await?
        .ok_or_else(|| {
            warn!("Product upsert rejected");
            AppError::unprocessable_entity("Product could not be saved")
        })?;

    info!("Product {} saved", product.product_id);
    Ok(Json(product))
}

#[instrument(skip(state), fields(product_id = %product_id))]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    debug!("Deleting product");
    if !state.product.delete(product_id).await? {
        warn!("Product vanished before it could be deleted");
        return Err(AppError::not_found("Product not found"));
    }

    info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
