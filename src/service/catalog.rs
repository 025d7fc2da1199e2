//! Catalog Service
//!
//! CRUD over products, categories, and variants, plus the flag toggles and
//! stock adjustments the admin surface needs. Stock adjustments go through
//! the store's guarded update so stock can never be driven negative.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::models::catalog::{Category, Product, Variant};
use crate::models::requests::{
    CreateCategoryRequest, CreateProductRequest, CreateVariantRequest, UpdateCategoryRequest,
    UpdateProductRequest, UpdateVariantRequest,
};
use crate::store::{CatalogStore, StoreError};
use crate::utils::error::AppError;

/// Catalog service errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} is already in use")]
    Duplicate(String),

    #[error("Stock cannot go negative")]
    StockGuard,

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CatalogServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => CatalogServiceError::Duplicate(field),
            other => CatalogServiceError::Store(other),
        }
    }
}

impl From<CatalogServiceError> for AppError {
    fn from(err: CatalogServiceError) -> Self {
        match err {
            CatalogServiceError::NotFound(entity) => {
                AppError::NotFound(format!("{} not found", entity))
            }
            CatalogServiceError::Duplicate(field) => {
                AppError::Conflict(format!("{} is already in use", field))
            }
            CatalogServiceError::StockGuard => {
                AppError::Conflict("Stock cannot go negative".to_string())
            }
            CatalogServiceError::Store(e) => e.into(),
        }
    }
}

/// Service managing the product catalog
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<Product, CatalogServiceError> {
        if let Some(category_id) = request.category_id {
            self.catalog
                .find_category(category_id)
                .await?
                .ok_or(CatalogServiceError::NotFound("Category"))?;
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: request.name,
            slug: request.slug,
            description: request.description,
            category_id: request.category_id,
            active: true,
            featured: false,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_product(product.clone()).await?;
        info!("Product {} created ({})", product.id, product.slug);
        Ok(product)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<Product, CatalogServiceError> {
        self.catalog
            .find_product(product_id)
            .await?
            .ok_or(CatalogServiceError::NotFound("Product"))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogServiceError> {
        Ok(self.catalog.list_products().await?)
    }

    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<Product, CatalogServiceError> {
        let mut product = self.get_product(product_id).await?;
        if let Some(category_id) = request.category_id {
            self.catalog
                .find_category(category_id)
                .await?
                .ok_or(CatalogServiceError::NotFound("Category"))?;
            product.category_id = Some(category_id);
        }
        if let Some(name) = request.name {
            product.name = name;
        }
        if let Some(description) = request.description {
            product.description = Some(description);
        }
        product.updated_at = Utc::now();

        if !self.catalog.update_product(&product).await? {
            return Err(CatalogServiceError::NotFound("Product"));
        }
        Ok(product)
    }

    pub async fn set_product_active(
        &self,
        product_id: Uuid,
        active: bool,
    ) -> Result<Product, CatalogServiceError> {
        let mut product = self.get_product(product_id).await?;
        product.active = active;
        product.updated_at = Utc::now();
        if !self.catalog.update_product(&product).await? {
            return Err(CatalogServiceError::NotFound("Product"));
        }
        Ok(product)
    }

    pub async fn set_product_featured(
        &self,
        product_id: Uuid,
        featured: bool,
    ) -> Result<Product, CatalogServiceError> {
        let mut product = self.get_product(product_id).await?;
        product.featured = featured;
        product.updated_at = Utc::now();
        if !self.catalog.update_product(&product).await? {
            return Err(CatalogServiceError::NotFound("Product"));
        }
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), CatalogServiceError> {
        if !self.catalog.delete_product(product_id).await? {
            return Err(CatalogServiceError::NotFound("Product"));
        }
        info!("Product {} deleted", product_id);
        Ok(())
    }

    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<Category, CatalogServiceError> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: request.name,
            slug: request.slug,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_category(category.clone()).await?;
        Ok(category)
    }

    pub async fn get_category(&self, category_id: Uuid) -> Result<Category, CatalogServiceError> {
        self.catalog
            .find_category(category_id)
            .await?
            .ok_or(CatalogServiceError::NotFound("Category"))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogServiceError> {
        Ok(self.catalog.list_categories().await?)
    }

    pub async fn update_category(
        &self,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CatalogServiceError> {
        let mut category = self.get_category(category_id).await?;
        if let Some(name) = request.name {
            category.name = name;
        }
        category.updated_at = Utc::now();
        if !self.catalog.update_category(&category).await? {
            return Err(CatalogServiceError::NotFound("Category"));
        }
        Ok(category)
    }

    pub async fn set_category_active(
        &self,
        category_id: Uuid,
        active: bool,
    ) -> Result<Category, CatalogServiceError> {
        let mut category = self.get_category(category_id).await?;
        category.active = active;
        category.updated_at = Utc::now();
        if !self.catalog.update_category(&category).await? {
            return Err(CatalogServiceError::NotFound("Category"));
        }
        Ok(category)
    }

    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), CatalogServiceError> {
        if !self.catalog.delete_category(category_id).await? {
            return Err(CatalogServiceError::NotFound("Category"));
        }
        Ok(())
    }

    pub async fn create_variant(
        &self,
        request: CreateVariantRequest,
    ) -> Result<Variant, CatalogServiceError> {
        self.catalog
            .find_product(request.product_id)
            .await?
            .ok_or(CatalogServiceError::NotFound("Product"))?;

        let now = Utc::now();
        let variant = Variant {
            id: Uuid::new_v4(),
            product_id: request.product_id,
            sku: request.sku,
            name: request.name,
            price_cents: request.price_cents,
            stock: request.stock,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_variant(variant.clone()).await?;
        info!("Variant {} created ({})", variant.id, variant.sku);
        Ok(variant)
    }

    pub async fn get_variant(&self, variant_id: Uuid) -> Result<Variant, CatalogServiceError> {
        self.catalog
            .find_variant(variant_id)
            .await?
            .ok_or(CatalogServiceError::NotFound("Variant"))
    }

    pub async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<Variant>, CatalogServiceError> {
        self.catalog
            .find_product(product_id)
            .await?
            .ok_or(CatalogServiceError::NotFound("Product"))?;
        Ok(self.catalog.list_variants_for_product(product_id).await?)
    }

    pub async fn update_variant(
        &self,
        variant_id: Uuid,
        request: UpdateVariantRequest,
    ) -> Result<Variant, CatalogServiceError> {
        let mut variant = self.get_variant(variant_id).await?;
        if let Some(name) = request.name {
            variant.name = name;
        }
        if let Some(price_cents) = request.price_cents {
            variant.price_cents = price_cents;
        }
        variant.updated_at = Utc::now();
        if !self.catalog.update_variant(&variant).await? {
            return Err(CatalogServiceError::NotFound("Variant"));
        }
        Ok(variant)
    }

    pub async fn set_variant_active(
        &self,
        variant_id: Uuid,
        active: bool,
    ) -> Result<Variant, CatalogServiceError> {
        let mut variant = self.get_variant(variant_id).await?;
        variant.active = active;
        variant.updated_at = Utc::now();
        if !self.catalog.update_variant(&variant).await? {
            return Err(CatalogServiceError::NotFound("Variant"));
        }
        Ok(variant)
    }

    pub async fn delete_variant(&self, variant_id: Uuid) -> Result<(), CatalogServiceError> {
        if !self.catalog.delete_variant(variant_id).await? {
            return Err(CatalogServiceError::NotFound("Variant"));
        }
        Ok(())
    }

    /// Adjust stock by a signed delta; a delta that would drive stock
    /// negative is refused
    pub async fn adjust_stock(
        &self,
        variant_id: Uuid,
        delta: i32,
    ) -> Result<Variant, CatalogServiceError> {
        match self.catalog.adjust_stock(variant_id, delta).await? {
            Some(variant) => Ok(variant),
            None => {
                // Distinguish a missing variant from a failed guard
                if self.catalog.find_variant(variant_id).await?.is_none() {
                    Err(CatalogServiceError::NotFound("Variant"))
                } else {
                    Err(CatalogServiceError::StockGuard)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryStore::new()))
    }

    fn product_request(slug: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: "Widget".to_string(),
            slug: slug.to_string(),
            description: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_product_crud() {
        let service = service();
        let product = service
            .create_product(product_request("widget"))
            .await
            .unwrap();
        assert!(product.active);
        assert!(!product.featured);

        let updated = service
            .update_product(
                product.id,
                UpdateProductRequest {
                    name: Some("Better Widget".to_string()),
                    description: Some("Now better".to_string()),
                    category_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Better Widget");

        service.delete_product(product.id).await.unwrap();
        assert!(matches!(
            service.get_product(product.id).await,
            Err(CatalogServiceError::NotFound("Product"))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let service = service();
        service.create_product(product_request("widget")).await.unwrap();
        let result = service.create_product(product_request("widget")).await;
        assert!(matches!(result, Err(CatalogServiceError::Duplicate(f)) if f == "slug"));
    }

    #[tokio::test]
    async fn test_flag_toggles() {
        let service = service();
        let product = service
            .create_product(product_request("widget"))
            .await
            .unwrap();

        let featured = service.set_product_featured(product.id, true).await.unwrap();
        assert!(featured.featured);
        let hidden = service.set_product_active(product.id, false).await.unwrap();
        assert!(!hidden.active);
        assert!(hidden.featured);
    }

    #[tokio::test]
    async fn test_variant_requires_existing_product() {
        let service = service();
        let result = service
            .create_variant(CreateVariantRequest {
                product_id: Uuid::new_v4(),
                sku: "SKU-1".to_string(),
                name: "Blue".to_string(),
                price_cents: 1000,
                stock: 5,
            })
            .await;
        assert!(matches!(result, Err(CatalogServiceError::NotFound("Product"))));
    }

    #[tokio::test]
    async fn test_stock_adjustment_guard() {
        let service = service();
        let product = service
            .create_product(product_request("widget"))
            .await
            .unwrap();
        let variant = service
            .create_variant(CreateVariantRequest {
                product_id: product.id,
                sku: "SKU-1".to_string(),
                name: "Blue".to_string(),
                price_cents: 1000,
                stock: 5,
            })
            .await
            .unwrap();

        let adjusted = service.adjust_stock(variant.id, -5).await.unwrap();
        assert_eq!(adjusted.stock, 0);

        let result = service.adjust_stock(variant.id, -1).await;
        assert!(matches!(result, Err(CatalogServiceError::StockGuard)));

        let result = service.adjust_stock(Uuid::new_v4(), 1).await;
        assert!(matches!(result, Err(CatalogServiceError::NotFound("Variant"))));
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let service = service();
        let category = service
            .create_category(CreateCategoryRequest {
                name: "Tools".to_string(),
                slug: "tools".to_string(),
            })
            .await
            .unwrap();

        let product = service
            .create_product(CreateProductRequest {
                name: "Hammer".to_string(),
                slug: "hammer".to_string(),
                description: None,
                category_id: Some(category.id),
            })
            .await
            .unwrap();
        assert_eq!(product.category_id, Some(category.id));

        service.delete_category(category.id).await.unwrap();
        let orphan = service.get_product(product.id).await.unwrap();
        assert_eq!(orphan.category_id, None);
    }
}
