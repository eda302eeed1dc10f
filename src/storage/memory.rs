use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::{ProductStorage, StorageError};
use crate::domain::Product;

const LOCATION: &str = ":memory:";

/// Storage backend that keeps the collection in process memory.
///
/// Used to exercise the service without touching the file system. Stores can
/// be switched to fail so error paths are reachable in tests.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    products: RwLock<Vec<Product>>,
    fail_stores: AtomicBool,
    store_count: AtomicUsize,
    mutation_lock: Arc<Mutex<()>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            ..Self::default()
        }
    }

    /// Makes every following `store` fail with an I/O error until reset.
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }

    /// Number of successful stores so far.
    pub fn store_count(&self) -> usize {
        self.store_count.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }
}

#[async_trait]
impl ProductStorage for InMemoryStorage {
    async fn load(&self) -> Result<Vec<Product>, StorageError> {
        Ok(self.products.read().await.clone())
    }

    async fn store(&self, products: &[Product]) -> Result<(), StorageError> {
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                "write",
                LOCATION,
                io::Error::other("store disabled"),
            ));
        }

        *self.products.write().await = products.to_vec();
        self.store_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }

    fn mutation_lock(&self) -> Arc<Mutex<()>> {
        self.mutation_lock.clone()
    }
}
