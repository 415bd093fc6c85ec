use crate::models::{
    write::{InvoiceChanges, InvoiceDraft},
    Invoice, InvoiceId, InvoiceNumber, InvoiceVariant,
};
use crate::filter::InvoiceFilter;
use crate::validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),
    #[error("invalid invoice: {0}")]
    Invalid(#[from] ValidationError),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("{0}")]
    Other(String),
}

/// Durable home for invoices. Each call is atomic on its own; nothing spans
/// more than one call.
pub trait StorageBackend: Send + Sync {
    /// Assigns the next number for the draft's variant and stores it.
    fn create_invoice(&self, draft: &InvoiceDraft) -> Result<Invoice, StorageError>;
    fn update_invoice(&self, id: InvoiceId, changes: &InvoiceChanges) -> Result<Invoice, StorageError>;
    fn delete_invoice(&self, id: InvoiceId) -> Result<(), StorageError>;
    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError>;
    /// Matching invoices in the order of [`crate::filter::sort_invoices`].
    fn query_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StorageError>;
    /// Number the next created invoice of `variant` would receive.
    fn next_number(&self, variant: InvoiceVariant) -> Result<InvoiceNumber, StorageError>;
}
