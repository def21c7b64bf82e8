//! Opaque blob-store boundary for uploaded document files.

pub trait FileStore: Send + Sync {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
    fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("stored object '{0}' not found")]
    Missing(String),
    #[error("file store backend error: {0}")]
    Backend(String),
}
