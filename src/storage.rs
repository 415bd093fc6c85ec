use std::sync::Arc;

// Re-export core storage types so callers only need this crate
pub use invoicedb_core::storage::{StorageBackend, StorageError};
pub use invoicedb_memory::InMemoryStorage;
pub use invoicedb_sqlite::SqliteStorage;

use crate::config::{BackendKind, DatabaseConfig};

/// Opens the backend named by the configuration.
pub fn open(config: &DatabaseConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    let storage: Arc<dyn StorageBackend> = match config.backend {
        BackendKind::Memory => Arc::new(InMemoryStorage::new()),
        BackendKind::Sqlite => Arc::new(SqliteStorage::new(&config.path)?),
    };
    tracing::debug!(backend = ?config.backend, path = %config.path, "Storage opened");
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicedb_core::{InvoiceFilter, InvoiceVariant};

    #[test]
    fn test_open_backends() {
        for backend in [BackendKind::Memory, BackendKind::Sqlite] {
            let storage = open(&DatabaseConfig {
                backend,
                path: ":memory:".to_string(),
            })
            .unwrap();
            assert!(storage.query_invoices(&InvoiceFilter::new()).unwrap().is_empty());
            assert_eq!(storage.next_number(InvoiceVariant::Outward).unwrap(), 1);
        }
    }

    #[test]
    fn test_open_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            backend: BackendKind::Sqlite,
            path: dir.path().join("missing").join("invoices.db").to_string_lossy().into_owned(),
        };
        assert!(open(&config).is_err());
    }
}
