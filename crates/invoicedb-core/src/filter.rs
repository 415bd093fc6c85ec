use std::cmp::Reverse;

use time::Date;

use crate::models::{Invoice, InvoiceNumber, InvoiceVariant};

/// Inclusive range with optional ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter<T> {
    pub from: Option<T>,
    pub to: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self { from: None, to: None }
    }
}

impl<T> RangeFilter<T> {
    pub fn between(from: T, to: T) -> Self {
        Self { from: Some(from), to: Some(to) }
    }

    pub fn starting(from: T) -> Self {
        Self { from: Some(from), to: None }
    }

    pub fn ending(to: T) -> Self {
        Self { from: None, to: Some(to) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

impl<T: Copy> RangeFilter<T> {
    pub fn exact(value: T) -> Self {
        Self::between(value, value)
    }
}

impl<T: PartialOrd> RangeFilter<T> {
    pub fn contains(&self, value: &T) -> bool {
        if let Some(from) = &self.from {
            if value < from {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if value > to {
                return false;
            }
        }
        true
    }
}

/// Search criteria over invoices. Every option is optional; an empty filter
/// matches every invoice of both variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub variant: Option<InvoiceVariant>,
    /// Case-insensitive substring of the party name.
    pub party: Option<String>,
    pub number: RangeFilter<InvoiceNumber>,
    pub date: RangeFilter<Date>,
}

impl InvoiceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variant(mut self, variant: InvoiceVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Blank input clears the party criterion.
    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        let party = party.into();
        self.party = if party.trim().is_empty() { None } else { Some(party.trim().to_string()) };
        self
    }

    pub fn with_number(mut self, number: RangeFilter<InvoiceNumber>) -> Self {
        self.number = number;
        self
    }

    pub fn with_date(mut self, date: RangeFilter<Date>) -> Self {
        self.date = date;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.variant.is_none() && self.party.is_none() && self.number.is_unbounded() && self.date.is_unbounded()
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(variant) = self.variant {
            if invoice.variant != variant {
                return false;
            }
        }
        if let Some(party) = &self.party {
            // ASCII folding only, the same as SQLite's lower()
            let needle = party.to_ascii_lowercase();
            if !invoice.party.to_ascii_lowercase().contains(&needle) {
                return false;
            }
        }
        self.number.contains(&invoice.number) && self.date.contains(&invoice.date)
    }
}

/// Result order shared by every backend: newest date first, then inward
/// before outward, then highest number first.
pub fn sort_invoices(invoices: &mut [Invoice]) {
    invoices.sort_by_key(|inv| (Reverse(inv.date), inv.variant, Reverse(inv.number)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_date;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn invoice(variant: InvoiceVariant, number: InvoiceNumber, date: &str, party: &str) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            number,
            variant,
            date: parse_date(date).unwrap(),
            party: party.to_string(),
            items: Vec::new(),
            total: Decimal::ONE,
            description: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = InvoiceFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-01", "Acme")));
        assert!(filter.matches(&invoice(InvoiceVariant::Outward, 7, "1999-12-31", "")));
        assert!(InvoiceFilter::new().with_party("  ").is_empty());
    }

    #[test]
    fn test_party_is_case_insensitive_substring() {
        let filter = InvoiceFilter::new().with_party("acme");
        assert!(filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-01", "ACME Holdings")));
        assert!(filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-01", "The Acme Co")));
        assert!(!filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-01", "Globex")));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = InvoiceFilter::new().with_date(RangeFilter::between(
            parse_date("2024-01-05").unwrap(),
            parse_date("2024-01-10").unwrap(),
        ));
        assert!(!filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-04", "A")));
        assert!(filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-05", "A")));
        assert!(filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-10", "A")));
        assert!(!filter.matches(&invoice(InvoiceVariant::Inward, 1, "2024-01-11", "A")));
    }

    #[test]
    fn test_number_and_variant() {
        let filter = InvoiceFilter::new()
            .with_variant(InvoiceVariant::Outward)
            .with_number(RangeFilter::starting(3));
        assert!(!filter.matches(&invoice(InvoiceVariant::Outward, 2, "2024-01-01", "A")));
        assert!(filter.matches(&invoice(InvoiceVariant::Outward, 3, "2024-01-01", "A")));
        assert!(!filter.matches(&invoice(InvoiceVariant::Inward, 3, "2024-01-01", "A")));

        let exact = InvoiceFilter::new().with_number(RangeFilter::exact(2));
        assert!(exact.matches(&invoice(InvoiceVariant::Inward, 2, "2024-01-01", "A")));
        assert!(!exact.matches(&invoice(InvoiceVariant::Inward, 3, "2024-01-01", "A")));

        let inverted = InvoiceFilter::new().with_number(RangeFilter::between(5, 2));
        assert!(!inverted.matches(&invoice(InvoiceVariant::Inward, 3, "2024-01-01", "A")));
    }

    #[test]
    fn test_sort_order() {
        let mut list = vec![
            invoice(InvoiceVariant::Outward, 1, "2024-01-05", "A"),
            invoice(InvoiceVariant::Inward, 1, "2024-01-01", "A"),
            invoice(InvoiceVariant::Inward, 2, "2024-01-05", "A"),
            invoice(InvoiceVariant::Inward, 3, "2024-01-05", "A"),
        ];
        sort_invoices(&mut list);
        let order: Vec<String> = list.iter().map(|i| i.label()).collect();
        assert_eq!(order, vec!["IN-00003", "IN-00002", "OUT-00001", "IN-00001"]);
    }
}
