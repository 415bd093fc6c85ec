use rusqlite::types::Value;

use invoicedb_core::{format_date, InvoiceFilter};

/// Parameterized `WHERE` clause built from an [`InvoiceFilter`]. Must select
/// exactly what `InvoiceFilter::matches` accepts.
#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

pub(crate) fn where_clause(filter: &InvoiceFilter) -> WhereClause {
    let mut conds: Vec<&'static str> = Vec::new();
    let mut params = Vec::new();

    if let Some(variant) = filter.variant {
        conds.push("variant = ?");
        params.push(Value::Text(variant.as_str().to_string()));
    }
    if let Some(party) = &filter.party {
        conds.push("instr(lower(party), lower(?)) > 0");
        params.push(Value::Text(party.clone()));
    }
    if let Some(from) = filter.number.from {
        conds.push("number >= ?");
        params.push(Value::Integer(i64::from(from)));
    }
    if let Some(to) = filter.number.to {
        conds.push("number <= ?");
        params.push(Value::Integer(i64::from(to)));
    }
    // ISO dates compare correctly as text
    if let Some(from) = filter.date.from {
        conds.push("date >= ?");
        params.push(Value::Text(format_date(from)));
    }
    if let Some(to) = filter.date.to {
        conds.push("date <= ?");
        params.push(Value::Text(format_date(to)));
    }

    if conds.is_empty() {
        return WhereClause::default();
    }

    WhereClause {
        sql: format!(" WHERE {}", conds.join(" AND ")),
        params,
    }
}
