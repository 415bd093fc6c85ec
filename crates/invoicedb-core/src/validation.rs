use rust_decimal::Decimal;
use thiserror::Error;
use time::Date;

use crate::models::{sum_amounts, write::InvoiceDraft, Invoice, LineItem};

/// Years a stored date may carry; dates are kept as `YYYY-MM-DD` text.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("party name is required")]
    BlankParty,
    #[error("total must not be negative: {0}")]
    NegativeTotal(Decimal),
    #[error("line item {position} has a negative amount: {amount}")]
    NegativeItemAmount { position: usize, amount: Decimal },
    #[error("line item {0} has no description")]
    BlankItemDescription(usize),
    #[error("total {total} does not match the sum of line items {items}")]
    TotalMismatch { total: Decimal, items: Decimal },
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("nothing to change")]
    NoChanges,
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn amount_too_large() -> Self {
        Self::invalid("total", "amount too large")
    }
}

pub fn validate_draft(draft: &InvoiceDraft) -> Result<(), ValidationError> {
    check_fields(draft.date, &draft.party, &draft.items, draft.resolved_total()?)
}

pub fn validate_invoice(invoice: &Invoice) -> Result<(), ValidationError> {
    check_fields(invoice.date, &invoice.party, &invoice.items, invoice.total)
}

fn check_fields(date: Date, party: &str, items: &[LineItem], total: Decimal) -> Result<(), ValidationError> {
    if !YEARS.contains(&date.year()) {
        return Err(ValidationError::invalid("date", format!("year {} is out of range", date.year())));
    }

    if party.trim().is_empty() {
        return Err(ValidationError::BlankParty);
    }

    // Positions are reported 1-based, as the user sees them.
    for (idx, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(ValidationError::BlankItemDescription(idx + 1));
        }
        if item.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeItemAmount {
                position: idx + 1,
                amount: item.amount,
            });
        }
    }

    if total < Decimal::ZERO {
        return Err(ValidationError::NegativeTotal(total));
    }

    if !items.is_empty() {
        let sum = sum_amounts(items).ok_or_else(ValidationError::amount_too_large)?;
        if sum != total {
            return Err(ValidationError::TotalMismatch { total, items: sum });
        }
    }

    Ok(())
}
