use rust_decimal::Decimal;
use time::Date;

use super::{normalize_notes, sum_amounts, Invoice, InvoiceId, InvoiceNumber, InvoiceVariant, LineItem};
use crate::validation::ValidationError;

/// A new invoice as entered by the user, before a number is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub variant: InvoiceVariant,
    pub date: Date,
    pub party: String,
    pub items: Vec<LineItem>,
    /// Falls back to the sum of `items` when absent.
    pub total: Option<Decimal>,
    pub description: Option<String>,
}

impl InvoiceDraft {
    pub fn new(variant: InvoiceVariant, date: Date, party: impl Into<String>) -> Self {
        Self {
            variant,
            date,
            party: party.into(),
            items: Vec::new(),
            total: None,
            description: None,
        }
    }

    pub fn with_item(mut self, description: impl Into<String>, amount: Decimal) -> Self {
        self.items.push(LineItem::new(description, amount));
        self
    }

    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_notes(Some(description.into()));
        self
    }

    pub fn resolved_total(&self) -> Result<Decimal, ValidationError> {
        match self.total {
            Some(total) => Ok(total),
            None => sum_amounts(&self.items).ok_or_else(ValidationError::amount_too_large),
        }
    }

    /// The stored form of this draft under the given id and number.
    pub fn to_invoice(&self, id: InvoiceId, number: InvoiceNumber) -> Result<Invoice, ValidationError> {
        Ok(Invoice {
            id,
            number,
            variant: self.variant,
            date: self.date,
            party: self.party.clone(),
            items: self.items.clone(),
            total: self.resolved_total()?,
            description: normalize_notes(self.description.clone()),
        })
    }
}

/// Partial edit of an existing invoice. `None` leaves a field untouched;
/// the variant and number cannot be changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceChanges {
    pub date: Option<Date>,
    pub party: Option<String>,
    pub items: Option<Vec<LineItem>>,
    pub total: Option<Decimal>,
    pub description: Option<Option<String>>,
}

impl InvoiceChanges {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.party.is_none()
            && self.items.is_none()
            && self.total.is_none()
            && self.description.is_none()
    }

    /// Returns `invoice` with the changes applied. Replacing a non-empty
    /// item list without an explicit total recomputes the total.
    pub fn apply_to(&self, invoice: &Invoice) -> Result<Invoice, ValidationError> {
        let mut updated = invoice.clone();
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(party) = &self.party {
            updated.party = party.clone();
        }
        if let Some(items) = &self.items {
            updated.items = items.clone();
            if self.total.is_none() && !items.is_empty() {
                updated.total = updated.items_total().ok_or_else(ValidationError::amount_too_large)?;
            }
        }
        if let Some(total) = self.total {
            updated.total = total;
        }
        if let Some(description) = &self.description {
            updated.description = normalize_notes(description.clone());
        }
        Ok(updated)
    }
}
