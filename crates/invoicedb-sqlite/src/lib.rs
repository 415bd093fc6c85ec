//! SQLite storage backend for InvoiceDB.

use std::{
    str::FromStr,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;
use uuid::Uuid;

use invoicedb_core::{
    format_date, next_number, parse_date, Invoice, InvoiceChanges, InvoiceDraft, InvoiceFilter, InvoiceId,
    InvoiceNumber, InvoiceVariant, LineItem, StorageBackend, StorageError,
};

mod query;

const INVOICE_COLUMNS: &str = "id, variant, number, date, party, total, description";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(db_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(db_err)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        tracing::debug!(path, "SQLite invoice store opened");
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS invoices (
                id TEXT PRIMARY KEY,
                variant TEXT NOT NULL CHECK (variant IN ('INWARD', 'OUTWARD')),
                number INTEGER NOT NULL,
                date TEXT NOT NULL,
                party TEXT NOT NULL,
                total TEXT NOT NULL,
                description TEXT,
                UNIQUE (variant, number)
            );

            CREATE TABLE IF NOT EXISTS invoice_items (
                invoice_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                PRIMARY KEY (invoice_id, position),
                FOREIGN KEY (invoice_id) REFERENCES invoices(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS invoice_sequences (
                variant TEXT PRIMARY KEY,
                last_issued INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_invoices_date
                ON invoices(date);
            ",
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Other("connection lock poisoned".to_string()))
    }

    fn compute_next_number(conn: &Connection, variant: InvoiceVariant) -> Result<InvoiceNumber, StorageError> {
        let current_max: Option<InvoiceNumber> = conn
            .query_row(
                "SELECT MAX(number) FROM invoices WHERE variant = ?1",
                params![variant.as_str()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        let last_issued: Option<InvoiceNumber> = conn
            .query_row(
                "SELECT last_issued FROM invoice_sequences WHERE variant = ?1",
                params![variant.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        next_number(current_max, last_issued)
    }

    fn insert_items(conn: &Connection, id: &str, items: &[LineItem]) -> Result<(), StorageError> {
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO invoice_items (invoice_id, position, description, amount)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?;
        for (position, item) in items.iter().enumerate() {
            stmt.execute(params![id, position as i64, item.description, item.amount.to_string()])
                .map_err(db_err)?;
        }
        Ok(())
    }

    fn load_items(conn: &Connection, id: &str) -> Result<Vec<LineItem>, StorageError> {
        let mut stmt = conn
            .prepare_cached("SELECT description, amount FROM invoice_items WHERE invoice_id = ?1 ORDER BY position")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(db_err)?;

        let mut items = Vec::new();
        for row in rows {
            let (description, amount) = row.map_err(db_err)?;
            items.push(LineItem {
                description,
                amount: parse_decimal(&amount)?,
            });
        }
        Ok(items)
    }

    fn load_invoice(conn: &Connection, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS),
                params![id.to_string()],
                RawInvoice::from_row,
            )
            .optional()
            .map_err(db_err)?;
        match raw {
            Some(raw) => Ok(Some(raw.into_invoice(conn)?)),
            None => Ok(None),
        }
    }
}

/// Row of the `invoices` table before conversion to domain types.
struct RawInvoice {
    id: String,
    variant: String,
    number: InvoiceNumber,
    date: String,
    party: String,
    total: String,
    description: Option<String>,
}

impl RawInvoice {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            variant: row.get(1)?,
            number: row.get(2)?,
            date: row.get(3)?,
            party: row.get(4)?,
            total: row.get(5)?,
            description: row.get(6)?,
        })
    }

    fn into_invoice(self, conn: &Connection) -> Result<Invoice, StorageError> {
        let items = SqliteStorage::load_items(conn, &self.id)?;
        Ok(Invoice {
            id: Uuid::parse_str(&self.id).map_err(|e| StorageError::Corrupt(format!("invoice id {}: {}", self.id, e)))?,
            number: self.number,
            variant: str_to_variant(&self.variant)?,
            date: parse_date(&self.date).map_err(StorageError::Corrupt)?,
            party: self.party,
            items,
            total: parse_decimal(&self.total)?,
            description: self.description,
        })
    }
}

fn db_err(e: rusqlite::Error) -> StorageError {
    StorageError::Other(e.to_string())
}

fn parse_decimal(s: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(s).map_err(|e| StorageError::Corrupt(format!("invalid decimal {}: {}", s, e)))
}

fn str_to_variant(s: &str) -> Result<InvoiceVariant, StorageError> {
    match s {
        "INWARD" => Ok(InvoiceVariant::Inward),
        "OUTWARD" => Ok(InvoiceVariant::Outward),
        _ => Err(StorageError::Corrupt(format!("unknown invoice variant: {}", s))),
    }
}

impl StorageBackend for SqliteStorage {
    fn create_invoice(&self, draft: &InvoiceDraft) -> Result<Invoice, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let number = Self::compute_next_number(&tx, draft.variant)?;
        let invoice = draft.to_invoice(Uuid::new_v4(), number)?;
        let id = invoice.id.to_string();

        tx.execute(
            &format!("INSERT INTO invoices ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", INVOICE_COLUMNS),
            params![
                id,
                invoice.variant.as_str(),
                invoice.number,
                format_date(invoice.date),
                invoice.party,
                invoice.total.to_string(),
                invoice.description,
            ],
        )
        .map_err(db_err)?;
        Self::insert_items(&tx, &id, &invoice.items)?;
        tx.execute(
            "INSERT INTO invoice_sequences (variant, last_issued) VALUES (?1, ?2)
             ON CONFLICT(variant) DO UPDATE SET last_issued = excluded.last_issued",
            params![invoice.variant.as_str(), number],
        )
        .map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        tracing::debug!(%id, number, variant = %invoice.variant, "invoice inserted");
        Ok(invoice)
    }

    fn update_invoice(&self, id: InvoiceId, changes: &InvoiceChanges) -> Result<Invoice, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        let existing = Self::load_invoice(&tx, id)?.ok_or(StorageError::InvoiceNotFound(id))?;
        let updated = changes.apply_to(&existing)?;
        let id_str = id.to_string();

        tx.execute(
            "UPDATE invoices SET date = ?1, party = ?2, total = ?3, description = ?4 WHERE id = ?5",
            params![
                format_date(updated.date),
                updated.party,
                updated.total.to_string(),
                updated.description,
                id_str,
            ],
        )
        .map_err(db_err)?;

        if changes.items.is_some() {
            tx.execute("DELETE FROM invoice_items WHERE invoice_id = ?1", params![id_str])
                .map_err(db_err)?;
            Self::insert_items(&tx, &id_str, &updated.items)?;
        }

        tx.commit().map_err(db_err)?;
        tracing::debug!(id = %id_str, "invoice updated");
        Ok(updated)
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let id_str = id.to_string();

        tx.execute("DELETE FROM invoice_items WHERE invoice_id = ?1", params![id_str])
            .map_err(db_err)?;
        let deleted = tx
            .execute("DELETE FROM invoices WHERE id = ?1", params![id_str])
            .map_err(db_err)?;
        if deleted == 0 {
            // dropping the transaction rolls it back
            return Err(StorageError::InvoiceNotFound(id));
        }

        tx.commit().map_err(db_err)?;
        tracing::debug!(id = %id_str, "invoice deleted");
        Ok(())
    }

    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        let conn = self.lock()?;
        Self::load_invoice(&conn, id)
    }

    fn query_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StorageError> {
        let conn = self.lock()?;
        let clause = query::where_clause(filter);
        let sql = format!(
            "SELECT {} FROM invoices{} ORDER BY date DESC, variant ASC, number DESC",
            INVOICE_COLUMNS, clause.sql
        );
        tracing::debug!(%sql, "querying invoices");

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(clause.params.iter()), RawInvoice::from_row)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut result = Vec::with_capacity(rows.len());
        for raw in rows {
            result.push(raw.into_invoice(&conn)?);
        }
        Ok(result)
    }

    fn next_number(&self, variant: InvoiceVariant) -> Result<InvoiceNumber, StorageError> {
        let conn = self.lock()?;
        Self::compute_next_number(&conn, variant)
    }
}
