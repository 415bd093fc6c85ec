//! Compact search expressions for the invoice list, e.g.
//! `type:inward customer:"Acme Ltd" number:3..7 date:2024-01-01..2024-01-31`.

use std::collections::HashSet;

use peg::{error::ParseError, str::LineCol};
use thiserror::Error;
use time::Date;

use invoicedb_core::{parse_date, InvoiceFilter, InvoiceNumber, InvoiceVariant, RangeFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    Variant(InvoiceVariant),
    Party(String),
    Number(RangeFilter<InvoiceNumber>),
    Date(RangeFilter<Date>),
}

impl SearchTerm {
    pub fn key(&self) -> &'static str {
        match self {
            SearchTerm::Variant(_) => "type",
            SearchTerm::Party(_) => "customer",
            SearchTerm::Number(_) => "number",
            SearchTerm::Date(_) => "date",
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search expression: {0}")]
    Syntax(#[from] ParseError<LineCol>),
    #[error("search key given more than once: {0}")]
    DuplicateKey(&'static str),
}

peg::parser! {
    grammar search_expr() for str {
        rule kw_type()      = ("type" / "TYPE" / "variant" / "VARIANT")
        rule kw_customer()  = ("customer" / "CUSTOMER" / "party" / "PARTY")
        rule kw_number()    = ("number" / "NUMBER" / "no" / "NO")
        rule kw_date()      = ("date" / "DATE")

        rule __()
            = [' ' | '\n' | '\t']

        rule num()
            = ['0'..='9']

        // e.g. '42'
        rule number() -> InvoiceNumber
            = n:$(num()+) {? n.parse().or(Err("invoice number")) }

        // e.g. '2024-01-31'
        rule date() -> Date
            = d:$(num()*<4,4> "-" num()*<2,2> "-" num()*<2,2>) {? parse_date(d).or(Err("valid date")) }

        rule variant() -> InvoiceVariant
            = v:$(['a'..='z' | 'A'..='Z']+) {? v.parse().or(Err("inward or outward")) }

        // e.g. 'Acme', '"Acme Ltd"'
        rule text() -> String
            = "\"" t:$([^ '"' | '\n' | '\r']*) "\"" { t.to_string() }
            / t:$([^ ' ' | '\t' | '\n' | '"']+) { t.to_string() }

        // e.g. '3', '3..7', '3..', '..7'
        rule number_range() -> RangeFilter<InvoiceNumber>
            = a:number() ".." b:number() { RangeFilter::between(a, b) }
            / a:number() ".." { RangeFilter::starting(a) }
            / ".." b:number() { RangeFilter::ending(b) }
            / a:number() { RangeFilter::exact(a) }

        rule date_range() -> RangeFilter<Date>
            = a:date() ".." b:date() { RangeFilter::between(a, b) }
            / a:date() ".." { RangeFilter::starting(a) }
            / ".." b:date() { RangeFilter::ending(b) }
            / a:date() { RangeFilter::exact(a) }

        rule term() -> SearchTerm
            = kw_type() ":" v:variant() { SearchTerm::Variant(v) }
            / kw_customer() ":" t:text() { SearchTerm::Party(t) }
            / kw_number() ":" r:number_range() { SearchTerm::Number(r) }
            / kw_date() ":" r:date_range() { SearchTerm::Date(r) }

        pub rule terms() -> Vec<SearchTerm>
            = __* t:(term() ** (__+)) __* { t }
    }
}

pub fn parse_terms(input: &str) -> Result<Vec<SearchTerm>, SearchError> {
    Ok(search_expr::terms(input)?)
}

/// Parses a search expression into a filter. An empty expression yields the
/// empty filter.
pub fn parse(input: &str) -> Result<InvoiceFilter, SearchError> {
    let mut seen = HashSet::new();
    let mut filter = InvoiceFilter::new();

    for term in parse_terms(input)? {
        if !seen.insert(term.key()) {
            return Err(SearchError::DuplicateKey(term.key()));
        }
        filter = match term {
            SearchTerm::Variant(v) => filter.with_variant(v),
            SearchTerm::Party(p) => filter.with_party(p),
            SearchTerm::Number(r) => filter.with_number(r),
            SearchTerm::Date(r) => filter.with_date(r),
        };
    }

    Ok(filter)
}
