//! Core types and traits for InvoiceDB storage backends.
//!
//! This crate provides the invoice model, the `StorageBackend` trait and the
//! rules every backend shares (numbering, filtering, validation), so that
//! storage implementations can live in separate crates.

pub mod filter;
pub mod models;
pub mod numbering;
pub mod storage;
pub mod validation;

// Re-export key types at crate root for convenience
pub use filter::{sort_invoices, InvoiceFilter, RangeFilter};
pub use models::{
    format_date, normalize_notes, parse_date, sum_amounts, Invoice, InvoiceId, InvoiceListing, InvoiceNumber,
    InvoiceVariant, LineItem, ParseVariantError,
};
pub use models::write::{InvoiceChanges, InvoiceDraft};
pub use numbering::next_number;
pub use storage::{StorageBackend, StorageError};
pub use validation::{validate_draft, validate_invoice, ValidationError};
