use std::{fs::File, io, path::Path, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use invoicedb_core::{format_date, parse_date, Invoice, InvoiceNumber, InvoiceVariant, LineItem};

use super::ExportError;

pub const HEADER: [&str; 8] = ["id", "number", "type", "date", "party", "items", "total", "description"];

/// One CSV row. Field order is the column order of [`HEADER`].
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: Uuid,
    number: InvoiceNumber,
    #[serde(rename = "type")]
    variant: InvoiceVariant,
    date: String,
    party: String,
    /// JSON array of `{description, amount}`.
    items: String,
    // Kept as text so the decimal scale survives the trip.
    total: String,
    description: Option<String>,
}

impl CsvRow {
    fn from_invoice(invoice: &Invoice) -> Result<Self, ExportError> {
        Ok(Self {
            id: invoice.id,
            number: invoice.number,
            variant: invoice.variant,
            date: format_date(invoice.date),
            party: invoice.party.clone(),
            items: serde_json::to_string(&invoice.items)?,
            total: invoice.total.to_string(),
            description: invoice.description.clone(),
        })
    }

    fn into_invoice(self) -> Result<Invoice, ExportError> {
        let items: Vec<LineItem> = serde_json::from_str(&self.items)?;
        Ok(Invoice {
            id: self.id,
            number: self.number,
            variant: self.variant,
            date: parse_date(&self.date).map_err(ExportError::Format)?,
            party: self.party,
            items,
            total: Decimal::from_str(&self.total)
                .map_err(|e| ExportError::Format(format!("invalid total {}: {}", self.total, e)))?,
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

/// Writes the header and one row per invoice, in the order given.
pub fn write_invoices<W: io::Write>(writer: W, invoices: &[Invoice]) -> Result<(), ExportError> {
    let mut wtr = ::csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;
    for invoice in invoices {
        wtr.serialize(CsvRow::from_invoice(invoice)?)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `invoices` to it. On error the
/// file may be left partially written.
pub fn export_invoices(path: &Path, invoices: &[Invoice]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_invoices(io::BufWriter::new(file), invoices)?;
    tracing::info!(path = %path.display(), count = invoices.len(), "CSV export written");
    Ok(())
}

pub fn read_invoices<R: io::Read>(reader: R) -> Result<Vec<Invoice>, ExportError> {
    let mut rdr = ::csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(ExportError::Format(format!("unexpected header: {:?}", headers)));
    }

    let mut invoices = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        invoices.push(row?.into_invoice()?);
    }
    Ok(invoices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(variant: InvoiceVariant, number: InvoiceNumber, party: &str) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            number,
            variant,
            date: parse_date("2024-01-05").unwrap(),
            party: party.to_string(),
            items: Vec::new(),
            total: dec!(100.00),
            description: None,
        }
    }

    #[test]
    fn test_header_and_quoting() {
        let mut inv = invoice(InvoiceVariant::Outward, 3, "Acme, Inc.");
        inv.description = Some("said \"thanks\"".to_string());

        let mut out = Vec::new();
        write_invoices(&mut out, &[inv.clone()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), "id,number,type,date,party,items,total,description");
        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!("{},3,Outward,2024-01-05,\"Acme, Inc.\",[],100.00,", inv.id)));
        assert!(row.ends_with("\"said \"\"thanks\"\"\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let mut out = Vec::new();
        write_invoices(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,number,type,date,party,items,total,description\n");
    }

    #[test]
    fn test_round_trip_with_items() {
        let mut inv = invoice(InvoiceVariant::Inward, 1, "Acme");
        inv.items = vec![LineItem::new("Bolts, steel", dec!(60.00)), LineItem::new("Nuts \"M8\"", dec!(40.00))];
        inv.description = Some("line one\nline two".to_string());
        let other = invoice(InvoiceVariant::Outward, 2, "Globex");

        let mut out = Vec::new();
        write_invoices(&mut out, &[inv.clone(), other.clone()]).unwrap();
        let parsed = read_invoices(out.as_slice()).unwrap();

        assert_eq!(parsed, vec![inv, other]);
        assert_eq!(parsed[0].total.to_string(), "100.00");
    }

    #[test]
    fn test_rejects_foreign_header() {
        let data = "a,b,c\n1,2,3\n";
        assert!(matches!(read_invoices(data.as_bytes()), Err(ExportError::Format(_))));
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let result = export_invoices(&path, &[invoice(InvoiceVariant::Inward, 1, "Acme")]);
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
