use crate::{models::InvoiceNumber, storage::StorageError};

/// Next number for a variant: one past the larger of the highest number
/// currently stored and the highest number ever issued. Starts at 1.
///
/// Counting the issued high-water mark keeps numbers from being reused when
/// the newest invoice of a variant is deleted.
pub fn next_number(
    current_max: Option<InvoiceNumber>,
    last_issued: Option<InvoiceNumber>,
) -> Result<InvoiceNumber, StorageError> {
    match current_max.max(last_issued) {
        None => Ok(1),
        Some(n) => n
            .checked_add(1)
            .ok_or_else(|| StorageError::Other("invoice number space exhausted".to_string())),
    }
}
