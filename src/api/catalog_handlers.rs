//! Catalog Handlers
//!
//! CRUD endpoints for products, categories, and variants, plus the
//! visibility toggles and stock adjustments.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::catalog::{Category, Product, Variant},
    models::requests::*,
    utils::error::AppResult,
};

use super::handlers::{handle_validation_error, AppState, SuccessResponse};

pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> AppResult<Json<SuccessResponse<Product>>> {
    request.validate().map_err(handle_validation_error)?;
    let product = state.catalog_service.create_product(request).await?;
    Ok(Json(SuccessResponse::new(product)))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<Product>>>> {
    let products = state.catalog_service.list_products().await?;
    Ok(Json(SuccessResponse::new(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Product>>> {
    let product = state.catalog_service.get_product(product_id).await?;
    Ok(Json(SuccessResponse::new(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> AppResult<Json<SuccessResponse<Product>>> {
    request.validate().map_err(handle_validation_error)?;
    let product = state
        .catalog_service
        .update_product(product_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(product)))
}

pub async fn set_product_active(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<SetFlagRequest>,
) -> AppResult<Json<SuccessResponse<Product>>> {
    let product = state
        .catalog_service
        .set_product_active(product_id, request.value)
        .await?;
    Ok(Json(SuccessResponse::new(product)))
}

pub async fn set_product_featured(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<SetFlagRequest>,
) -> AppResult<Json<SuccessResponse<Product>>> {
    let product = state
        .catalog_service
        .set_product_featured(product_id, request.value)
        .await?;
    Ok(Json(SuccessResponse::new(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<()>>> {
    state.catalog_service.delete_product(product_id).await?;
    Ok(Json(SuccessResponse::new(())))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> AppResult<Json<SuccessResponse<Category>>> {
    request.validate().map_err(handle_validation_error)?;
    let category = state.catalog_service.create_category(request).await?;
    Ok(Json(SuccessResponse::new(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<Category>>>> {
    let categories = state.catalog_service.list_categories().await?;
    Ok(Json(SuccessResponse::new(categories)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Category>>> {
    let category = state.catalog_service.get_category(category_id).await?;
    Ok(Json(SuccessResponse::new(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> AppResult<Json<SuccessResponse<Category>>> {
    request.validate().map_err(handle_validation_error)?;
    let category = state
        .catalog_service
        .update_category(category_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(category)))
}

pub async fn set_category_active(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(request): Json<SetFlagRequest>,
) -> AppResult<Json<SuccessResponse<Category>>> {
    let category = state
        .catalog_service
        .set_category_active(category_id, request.value)
        .await?;
    Ok(Json(SuccessResponse::new(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<()>>> {
    state.catalog_service.delete_category(category_id).await?;
    Ok(Json(SuccessResponse::new(())))
}

pub async fn create_variant(
    State(state): State<AppState>,
    Json(request): Json<CreateVariantRequest>,
) -> AppResult<Json<SuccessResponse<Variant>>> {
    request.validate().map_err(handle_validation_error)?;
    let variant = state.catalog_service.create_variant(request).await?;
    Ok(Json(SuccessResponse::new(variant)))
}

pub async fn list_variants(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Vec<Variant>>>> {
    let variants = state.catalog_service.list_variants(product_id).await?;
    Ok(Json(SuccessResponse::new(variants)))
}

pub async fn get_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Variant>>> {
    let variant = state.catalog_service.get_variant(variant_id).await?;
    Ok(Json(SuccessResponse::new(variant)))
}

pub async fn update_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Json(request): Json<UpdateVariantRequest>,
) -> AppResult<Json<SuccessResponse<Variant>>> {
    request.validate().map_err(handle_validation_error)?;
    let variant = state
        .catalog_service
        .update_variant(variant_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(variant)))
}

pub async fn set_variant_active(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Json(request): Json<SetFlagRequest>,
) -> AppResult<Json<SuccessResponse<Variant>>> {
    let variant = state
        .catalog_service
        .set_variant_active(variant_id, request.value)
        .await?;
    Ok(Json(SuccessResponse::new(variant)))
}

pub async fn delete_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<()>>> {
    state.catalog_service.delete_variant(variant_id).await?;
    Ok(Json(SuccessResponse::new(())))
}

/// Adjust variant stock by a signed delta
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Json(request): Json<AdjustStockRequest>,
) -> AppResult<Json<SuccessResponse<Variant>>> {
    request.validate().map_err(handle_validation_error)?;
    let variant = state
        .catalog_service
        .adjust_stock(variant_id, request.delta)
        .await?;
    Ok(Json(SuccessResponse::new(variant)))
}
