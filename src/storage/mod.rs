//! Whole-collection persistence for product records.
//!
//! A storage backend only moves the full record list between memory and its
//! medium. It applies no validation and knows nothing about identifiers.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{Product, ProductError};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStorage;
pub use memory::InMemoryStorage;

#[async_trait]
pub trait ProductStorage: Send + Sync {
    /// Reads every stored record, in stored order.
    async fn load(&self) -> Result<Vec<Product>, StorageError>;

    /// Replaces the stored collection with `products`.
    async fn store(&self, products: &[Product]) -> Result<(), StorageError>;

    /// Where the records live, for log output.
    fn location(&self) -> String;

    /// Serializes load-modify-store cycles on the underlying medium.
    ///
    /// Every handle to the same medium returns the same lock.
    fn mutation_lock(&self) -> Arc<Mutex<()>>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON format in {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode products: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<StorageError> for ProductError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Decode { .. } => Self::Decode(err.to_string()),
            StorageError::Io { .. } | StorageError::Encode(_) => Self::Io(err.to_string()),
            StorageError::Task(message) => Self::Internal(message),
        }
    }
}
