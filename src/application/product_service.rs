use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    application::dto::{CreateProductRequest, UpdateProductRequest},
    domain::{Product, ProductError},
    storage::{JsonFileStorage, ProductStorage},
};

/// CRUD operations over the stored product collection.
///
/// Every call reloads the full collection from storage. Mutating calls hold
/// the storage's mutation lock across load, change and store. The lock is
/// shared by every handle to the same medium, so services opened separately
/// on one data file cannot overwrite each other's changes. Reads never take
/// the lock.
#[derive(Clone)]
pub struct ProductService {
    storage: Arc<dyn ProductStorage>,
}

impl ProductService {
    pub fn new(storage: Arc<dyn ProductStorage>) -> Self {
        Self { storage }
    }

    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileStorage::new(path)))
    }

    pub fn storage_location(&self) -> String {
        self.storage.location()
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.storage.load().await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i64) -> Result<Product, ProductError> {
        ensure_positive_id(id)?;

        self.storage
            .load()
            .await?
            .into_iter()
            .find(|product| product.id == id)
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<Product, ProductError> {
        request.validate()?;

        let _guard = self.storage.mutation_lock().lock_owned().await;
        let mut products = self.storage.load().await?;

        let created = request.into_product(next_id(&products)?);
        products.push(created.clone());
        self.storage.store(&products).await?;

        info!(product_id = created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: i64,
        request: UpdateProductRequest,
    ) -> Result<Product, ProductError> {
        ensure_positive_id(id)?;

        let _guard = self.storage.mutation_lock().lock_owned().await;
        let mut products = self.storage.load().await?;

        let Some(product) = products.iter_mut().find(|product| product.id == id) else {
            return Err(ProductError::NotFound(id));
        };

        request.validate()?;
        if !request.apply_to(product) {
            debug!("no fields supplied, nothing to store");
            return Ok(product.clone());
        }

        let updated = product.clone();
        self.storage.store(&products).await?;

        info!(product_id = id, "product updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> Result<(), ProductError> {
        ensure_positive_id(id)?;

        let _guard = self.storage.mutation_lock().lock_owned().await;
        let mut products = self.storage.load().await?;

        let Some(index) = products.iter().position(|product| product.id == id) else {
            return Err(ProductError::NotFound(id));
        };

        products.remove(index);
        self.storage.store(&products).await?;

        info!(product_id = id, "product deleted");
        Ok(())
    }
}

fn ensure_positive_id(id: i64) -> Result<(), ProductError> {
    if id <= 0 {
        return Err(ProductError::invalid_id());
    }
    Ok(())
}

/// One past the largest id in use, or 1 for an empty collection.
fn next_id(products: &[Product]) -> Result<i64, ProductError> {
    let Some(max) = products.iter().map(|product| product.id).max() else {
        return Ok(1);
    };

    max.max(0)
        .checked_add(1)
        .ok_or_else(|| ProductError::internal("product id space exhausted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn product(id: i64, name: &str, price: Decimal) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
            category: "Office".to_string(),
        }
    }

    fn create_request(name: &str, price: Decimal, category: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            price,
            category: category.to_string(),
        }
    }

    fn service_with(products: Vec<Product>) -> (ProductService, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::with_products(products));
        (ProductService::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let (service, _) = service_with(Vec::new());

        let pen = service
            .create_product(create_request("Pen", Decimal::new(150, 2), "Office"))
            .await
            .unwrap();
        assert_eq!(pen, product(1, "Pen", Decimal::new(150, 2)));

        let mug = service
            .create_product(create_request("Mug", Decimal::new(500, 2), "Office"))
            .await
            .unwrap();
        assert_eq!(mug.id, 2);
    }

    #[tokio::test]
    async fn test_create_uses_max_existing_id() {
        let (service, storage) = service_with(vec![
            product(7, "Lamp", Decimal::TEN),
            product(3, "Desk", Decimal::TEN),
        ]);

        let created = service
            .create_product(create_request("Chair", Decimal::ONE, "Home"))
            .await
            .unwrap();

        assert_eq!(created.id, 8);
        let ids = storage
            .snapshot()
            .await
            .iter()
            .map(|product| product.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![7, 3, 8]);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (service, storage) = service_with(Vec::new());

        let err = service
            .create_product(create_request("", Decimal::new(5, 0), "X"))
            .await
            .unwrap_err();

        let ProductError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.fields(), vec!["name"]);
        assert_eq!(storage.store_count(), 0);
    }

    #[tokio::test]
    async fn test_created_product_is_readable() {
        let (service, _) = service_with(Vec::new());
        let created = service
            .create_product(create_request("Pen", Decimal::ONE, "Office"))
            .await
            .unwrap();

        assert_eq!(service.get_product(created.id).await.unwrap(), created);
        assert_eq!(service.list_products().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_get_rejects_non_positive_ids() {
        let (service, _) = service_with(vec![product(1, "Pen", Decimal::ONE)]);

        for id in [0, -5] {
            let err = service.get_product(id).await.unwrap_err();
            let ProductError::Validation(errors) = err else {
                panic!("expected validation error for id {id}, got {err:?}");
            };
            assert_eq!(errors.to_string(), "id must be positive");
        }
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let (service, _) = service_with(vec![product(1, "Pen", Decimal::ONE)]);

        let err = service.get_product(2).await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(2)));
    }

    #[tokio::test]
    async fn test_update_with_no_fields_is_noop() {
        let existing = product(4, "Pen", Decimal::ONE);
        let (service, storage) = service_with(vec![existing.clone()]);

        let returned = service
            .update_product(4, UpdateProductRequest::default())
            .await
            .unwrap();

        assert_eq!(returned, existing);
        assert_eq!(storage.store_count(), 0);
    }

    #[tokio::test]
    async fn test_update_applies_present_fields() {
        let (service, storage) = service_with(vec![
            product(1, "Pen", Decimal::ONE),
            product(2, "Mug", Decimal::TWO),
        ]);

        let updated = service
            .update_product(
                2,
                UpdateProductRequest {
                    name: Some("Big Mug".to_string()),
                    ..UpdateProductRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated, product(2, "Big Mug", Decimal::TWO));
        assert_eq!(
            storage.snapshot().await,
            vec![product(1, "Pen", Decimal::ONE), product(2, "Big Mug", Decimal::TWO)]
        );
    }

    #[tokio::test]
    async fn test_update_invalid_price_leaves_record_unchanged() {
        let existing = product(7, "Lamp", Decimal::TEN);
        let (service, storage) = service_with(vec![existing.clone()]);

        let err = service
            .update_product(
                7,
                UpdateProductRequest {
                    price: Some(Decimal::NEGATIVE_ONE),
                    ..UpdateProductRequest::default()
                },
            )
            .await
            .unwrap_err();

        let ProductError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.fields(), vec!["price"]);
        assert_eq!(storage.snapshot().await, vec![existing]);
    }

    #[tokio::test]
    async fn test_update_checks_id_before_lookup_and_lookup_before_fields() {
        let (service, _) = service_with(vec![product(1, "Pen", Decimal::ONE)]);
        let invalid = UpdateProductRequest {
            name: Some(String::new()),
            ..UpdateProductRequest::default()
        };

        let err = service.update_product(0, invalid.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            ProductError::Validation(ref errors) if errors.fields() == vec!["id"]
        ));

        let err = service.update_product(9, invalid).await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(9)));
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let (service, _) = service_with(vec![product(3, "Desk", Decimal::TEN)]);

        service.delete_product(3).await.unwrap();
        assert!(service.list_products().await.unwrap().is_empty());

        let err = service.delete_product(3).await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(3)));
    }

    #[tokio::test]
    async fn test_delete_rejects_non_positive_id() {
        let (service, _) = service_with(Vec::new());

        let err = service.delete_product(-1).await.unwrap_err();
        assert!(matches!(err, ProductError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ids_below_max_are_not_reused() {
        let (service, _) = service_with(vec![
            product(1, "Pen", Decimal::ONE),
            product(2, "Mug", Decimal::ONE),
        ]);

        service.delete_product(1).await.unwrap();
        let created = service
            .create_product(create_request("Cup", Decimal::ONE, "Kitchen"))
            .await
            .unwrap();

        assert_eq!(created.id, 3);
    }

    #[tokio::test]
    async fn test_failed_store_surfaces_io_error() {
        let existing = product(1, "Pen", Decimal::ONE);
        let (service, storage) = service_with(vec![existing.clone()]);
        storage.fail_stores(true);

        let err = service
            .create_product(create_request("Mug", Decimal::ONE, "Office"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Io(_)));

        let err = service.delete_product(1).await.unwrap_err();
        assert!(matches!(err, ProductError::Io(_)));

        assert_eq!(storage.snapshot().await, vec![existing]);
    }

    #[tokio::test]
    async fn test_id_space_exhaustion_is_reported() {
        let (service, _) = service_with(vec![product(i64::MAX, "Last", Decimal::ONE)]);

        let err = service
            .create_product(create_request("Overflow", Decimal::ONE, "Office"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::Internal(_)));
    }

    #[tokio::test]
    async fn test_decode_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("products.json");
        std::fs::write(&path, "{broken").unwrap();
        let service = ProductService::open_file(&path);

        let err = service.list_products().await.unwrap_err();
        assert!(matches!(err, ProductError::Decode(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_do_not_lose_updates() {
        let temp_dir = TempDir::new().unwrap();
        let service = Arc::new(ProductService::open_file(
            temp_dir.path().join("products.json"),
        ));

        let mut handles = Vec::new();
        for index in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_product(create_request(
                        &format!("Item {index}"),
                        Decimal::ONE,
                        "Bulk",
                    ))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut ids = service
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|product| product.id)
            .collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_services_on_same_file_do_not_lose_updates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("products.json");
        let services = [
            Arc::new(ProductService::open_file(&path)),
            Arc::new(ProductService::open_file(&path)),
        ];

        let mut handles = Vec::new();
        for index in 0..40 {
            let service = services[index % 2].clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_product(create_request(
                        &format!("Item {index}"),
                        Decimal::ONE,
                        "Bulk",
                    ))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut ids = ProductService::open_file(&path)
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|product| product.id)
            .collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, (1..=40).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_file_backed_round_trip_through_service() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Data Source").join("products.json");

        let created = ProductService::open_file(&path)
            .create_product(create_request("Pen", Decimal::new(150, 2), "Office"))
            .await
            .unwrap();

        let reopened = ProductService::open_file(&path);
        assert_eq!(reopened.get_product(1).await.unwrap(), created);
        assert_eq!(reopened.storage_location(), path.display().to_string());
    }
}
