//! InvoiceDB: a register of inward (purchase) and outward (sales) invoices
//! with per-type numbering, search, and CSV/PDF export.

pub mod commands;
pub mod config;
pub mod export;
pub mod form;
pub mod logging;
pub mod search;
pub mod service;
pub mod storage;

pub use invoicedb_core::{
    format_date, parse_date, Invoice, InvoiceChanges, InvoiceDraft, InvoiceFilter, InvoiceId, InvoiceNumber,
    InvoiceVariant, LineItem, RangeFilter, ValidationError,
};
