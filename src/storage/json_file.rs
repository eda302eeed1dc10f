use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, Weak};

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::de::Error as _;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ProductStorage, StorageError};
use crate::domain::{Product, product::fold_key_case};

// Mutation locks of the data files opened in this process, keyed by absolute path.
lazy_static! {
    static ref FILE_LOCKS: std::sync::Mutex<HashMap<PathBuf, Weak<Mutex<()>>>> =
        std::sync::Mutex::new(HashMap::new());
}

/// Keeps the whole collection as a pretty-printed JSON array in one file.
///
/// A missing file reads as an empty collection. Writes go to a temporary
/// file in the same directory which is then renamed over the target, so a
/// failed or interrupted write never leaves a truncated store behind.
///
/// Every `JsonFileStorage` opened on the same path shares one mutation lock.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    mutation_lock: Arc<Mutex<()>>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mutation_lock = file_lock(&path);
        Self {
            path,
            mutation_lock,
        }
    }
}

fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.retain(|_, lock| lock.strong_count() > 0);

    if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
        return lock;
    }

    let lock = Arc::new(Mutex::new(()));
    locks.insert(key, Arc::downgrade(&lock));
    lock
}

#[async_trait]
impl ProductStorage for JsonFileStorage {
    async fn load(&self) -> Result<Vec<Product>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "data file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(StorageError::io("read", &self.path, err)),
        };

        let products = std::str::from_utf8(&bytes)
            .map_err(serde_json::Error::custom)
            .and_then(decode_products)
            .map_err(|source| StorageError::Decode {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = products.len(), "loaded products");
        Ok(products)
    }

    async fn store(&self, products: &[Product]) -> Result<(), StorageError> {
        let payload = serde_json::to_string_pretty(products).map_err(StorageError::Encode)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, payload.as_bytes()))
            .await
            .map_err(|err| StorageError::Task(err.to_string()))??;

        debug!(path = %self.path.display(), count = products.len(), "stored products");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn mutation_lock(&self) -> Arc<Mutex<()>> {
        self.mutation_lock.clone()
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&directory)
        .map_err(|err| StorageError::io("create directory", &directory, err))?;

    let mut temp = NamedTempFile::new_in(&directory)
        .map_err(|err| StorageError::io("create temporary file in", &directory, err))?;
    temp.write_all(bytes)
        .map_err(|err| StorageError::io("write", temp.path(), err))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| StorageError::io("sync", temp.path(), err))?;

    // The temporary file is removed on drop if the rename fails.
    temp.persist(path)
        .map_err(|err| StorageError::io("replace", path, err.error))?;
    Ok(())
}

fn decode_products(raw: &str) -> Result<Vec<Product>, serde_json::Error> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Ok(Vec::new());
    }

    let items = match serde_json::from_str::<Value>(trimmed)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(serde_json::Error::custom(
                "expected a JSON array of products",
            ));
        }
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(fold_key_case(item)))
        .collect()
}
