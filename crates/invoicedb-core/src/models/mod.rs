use std::{fmt::Display, str::FromStr};

use prettytable::{row, Table};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Month};
use uuid::Uuid;

pub mod write;

pub type InvoiceId = Uuid;
pub type InvoiceNumber = u32;

/// Inward invoices record purchases, outward invoices record sales. Each
/// variant owns an independent numbering sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvoiceVariant {
    Inward,
    Outward,
}

impl InvoiceVariant {
    /// Stable storage key. Inward sorts before outward.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceVariant::Inward => "INWARD",
            InvoiceVariant::Outward => "OUTWARD",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            InvoiceVariant::Inward => "IN",
            InvoiceVariant::Outward => "OUT",
        }
    }
}

impl Display for InvoiceVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceVariant::Inward => f.write_str("Inward"),
            InvoiceVariant::Outward => f.write_str("Outward"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown invoice type: {0} (expected inward or outward)")]
pub struct ParseVariantError(pub String);

impl FromStr for InvoiceVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inward" | "in" => Ok(InvoiceVariant::Inward),
            "outward" | "out" => Ok(InvoiceVariant::Outward),
            _ => Err(ParseVariantError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: InvoiceNumber,
    pub variant: InvoiceVariant,
    pub date: Date,
    pub party: String,
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub description: Option<String>,
}

impl Invoice {
    /// Human facing number, e.g. `IN-00042`.
    pub fn label(&self) -> String {
        format!("{}-{:05}", self.variant.prefix(), self.number)
    }

    /// `None` when the line amounts overflow a `Decimal`.
    pub fn items_total(&self) -> Option<Decimal> {
        sum_amounts(&self.items)
    }
}

/// Checked sum of line amounts.
pub fn sum_amounts(items: &[LineItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount))
}

/// Blank notes are stored as no notes.
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

/// Tabular rendering of a list of invoices for terminal output.
pub struct InvoiceListing<'a>(pub &'a [Invoice]);

impl Display for InvoiceListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table.add_row(row!["Id", "Number", "Type", "Date", "Party", "Total"]);
        table.add_empty_row();

        for inv in self.0 {
            table.add_row(row![inv.id, inv.label(), inv.variant, format_date(inv.date), inv.party, inv.total]);
        }

        write!(f, "\n{}\n", table)
    }
}

pub fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
}

/// Parses an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<Date, String> {
    let invalid = || format!("invalid date: {} (expected YYYY-MM-DD)", s);
    let parts: Vec<&str> = s.trim().split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return Err(invalid());
    }
    let year = parts[0].parse::<i32>().map_err(|_| invalid())?;
    let month = parts[1].parse::<u8>().map_err(|_| invalid())?;
    let day = parts[2].parse::<u8>().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}
