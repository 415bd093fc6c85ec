//! Mapping between raw form input (`key=value` strings from the command
//! line) and invoice fields.
//!
//! Every field the presentation layer can set is listed once in
//! [`STANDARD_FIELDS`]. The table is checked when an [`InvoiceForm`] is built,
//! so a missing or duplicated binding fails at startup rather than on the
//! first submission.

use std::{collections::HashSet, str::FromStr};

use rust_decimal::Decimal;
use time::Date;

use invoicedb_core::{
    format_date, parse_date, Invoice, InvoiceChanges, InvoiceDraft, InvoiceVariant, LineItem, ValidationError,
};

/// Values collected from one form submission, before they become a draft or
/// a change set.
#[derive(Debug, Default)]
pub struct FormValues {
    pub variant: Option<InvoiceVariant>,
    pub date: Option<Date>,
    pub party: Option<String>,
    pub items: Option<Vec<LineItem>>,
    pub total: Option<Decimal>,
    pub notes: Option<Option<String>>,
}

type ApplyFn = fn(&mut FormValues, &str) -> Result<(), ValidationError>;
type DisplayFn = fn(&Invoice) -> String;

#[derive(Clone, Copy)]
pub struct FieldBinding {
    pub key: &'static str,
    pub label: &'static str,
    /// Must be supplied when creating an invoice.
    pub required: bool,
    /// May be supplied when editing an invoice.
    pub editable: bool,
    /// May appear more than once in one submission.
    pub repeatable: bool,
    pub apply: ApplyFn,
    pub display: DisplayFn,
}

pub const STANDARD_FIELDS: &[FieldBinding] = &[
    FieldBinding {
        key: "type",
        label: "Type",
        required: true,
        editable: false,
        repeatable: false,
        apply: apply_variant,
        display: |inv| inv.variant.to_string(),
    },
    FieldBinding {
        key: "number",
        label: "Invoice No",
        required: false,
        editable: false,
        repeatable: false,
        apply: reject_number,
        display: |inv| inv.label(),
    },
    FieldBinding {
        key: "date",
        label: "Date",
        required: false,
        editable: true,
        repeatable: false,
        apply: apply_date,
        display: |inv| format_date(inv.date),
    },
    FieldBinding {
        key: "party",
        label: "Customer",
        required: true,
        editable: true,
        repeatable: false,
        apply: apply_party,
        display: |inv| inv.party.clone(),
    },
    FieldBinding {
        key: "item",
        label: "Items",
        required: false,
        editable: true,
        repeatable: true,
        apply: apply_item,
        display: |inv| {
            inv.items
                .iter()
                .map(|i| format!("{} = {}", i.description, i.amount))
                .collect::<Vec<_>>()
                .join("\n")
        },
    },
    FieldBinding {
        key: "total",
        label: "Total",
        required: false,
        editable: true,
        repeatable: false,
        apply: apply_total,
        display: |inv| inv.total.to_string(),
    },
    FieldBinding {
        key: "notes",
        label: "Notes",
        required: false,
        editable: true,
        repeatable: false,
        apply: apply_notes,
        display: |inv| inv.description.clone().unwrap_or_default(),
    },
];

fn apply_variant(values: &mut FormValues, raw: &str) -> Result<(), ValidationError> {
    let variant = InvoiceVariant::from_str(raw).map_err(|e| ValidationError::invalid("type", e.to_string()))?;
    values.variant = Some(variant);
    Ok(())
}

fn reject_number(_values: &mut FormValues, _raw: &str) -> Result<(), ValidationError> {
    Err(ValidationError::invalid("number", "invoice numbers are assigned automatically"))
}

fn apply_date(values: &mut FormValues, raw: &str) -> Result<(), ValidationError> {
    values.date = Some(parse_date(raw).map_err(|e| ValidationError::invalid("date", e))?);
    Ok(())
}

fn apply_party(values: &mut FormValues, raw: &str) -> Result<(), ValidationError> {
    values.party = Some(raw.trim().to_string());
    Ok(())
}

/// `description=amount`. An empty value starts an empty item list, which
/// clears the items of an invoice being edited.
fn apply_item(values: &mut FormValues, raw: &str) -> Result<(), ValidationError> {
    let items = values.items.get_or_insert_with(Vec::new);
    if raw.trim().is_empty() {
        return Ok(());
    }

    let (description, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| ValidationError::invalid("item", format!("expected description=amount, got {}", raw)))?;
    items.push(LineItem::new(description.trim(), parse_amount("item amount", amount)?));
    Ok(())
}

fn apply_total(values: &mut FormValues, raw: &str) -> Result<(), ValidationError> {
    values.total = Some(parse_amount("total", raw)?);
    Ok(())
}

fn apply_notes(values: &mut FormValues, raw: &str) -> Result<(), ValidationError> {
    let notes = raw.trim();
    values.notes = Some(if notes.is_empty() { None } else { Some(notes.to_string()) });
    Ok(())
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(raw.trim()).map_err(|_| ValidationError::invalid(field, format!("not a number: {}", raw.trim())))
}

/// A checked set of field bindings.
pub struct InvoiceForm {
    fields: Vec<FieldBinding>,
}

impl InvoiceForm {
    pub fn new(fields: &[FieldBinding]) -> Result<Self, ValidationError> {
        let mut keys = HashSet::new();
        for field in fields {
            if !keys.insert(field.key) {
                return Err(ValidationError::invalid("form", format!("field {} is bound twice", field.key)));
            }
        }
        for required in ["type", "party"] {
            if !keys.contains(required) {
                return Err(ValidationError::invalid("form", format!("field {} is not bound", required)));
            }
        }
        Ok(Self {
            fields: fields.to_vec(),
        })
    }

    pub fn standard() -> Result<Self, ValidationError> {
        Self::new(STANDARD_FIELDS)
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    fn collect<'a>(
        &self,
        input: impl IntoIterator<Item = (&'a str, &'a str)>,
        editing: bool,
    ) -> Result<FormValues, ValidationError> {
        let mut values = FormValues::default();
        let mut seen = HashSet::new();

        for (key, raw) in input {
            let field = self
                .fields
                .iter()
                .find(|f| f.key == key)
                .ok_or_else(|| ValidationError::invalid("form", format!("unknown field {}", key)))?;
            if editing && !field.editable {
                return Err(ValidationError::invalid(field.key, "cannot be changed after creation"));
            }
            if !seen.insert(field.key) && !field.repeatable {
                return Err(ValidationError::invalid(field.key, "given more than once"));
            }
            (field.apply)(&mut values, raw)?;
        }

        Ok(values)
    }

    /// Builds a draft for a new invoice. `today` is used when no date is
    /// given.
    pub fn draft<'a>(
        &self,
        input: impl IntoIterator<Item = (&'a str, &'a str)>,
        today: Date,
    ) -> Result<InvoiceDraft, ValidationError> {
        let values = self.collect(input, false)?;

        let variant = values.variant.ok_or(ValidationError::MissingField("type"))?;
        let party = values.party.ok_or(ValidationError::MissingField("party"))?;

        Ok(InvoiceDraft {
            variant,
            date: values.date.unwrap_or(today),
            party,
            items: values.items.unwrap_or_default(),
            total: values.total,
            description: values.notes.flatten(),
        })
    }

    /// Builds a change set for an existing invoice.
    pub fn changes<'a>(
        &self,
        input: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<InvoiceChanges, ValidationError> {
        let values = self.collect(input, true)?;
        Ok(InvoiceChanges {
            date: values.date,
            party: values.party,
            items: values.items,
            total: values.total,
            description: values.notes,
        })
    }

    /// Label/value pairs for displaying an invoice, in table order.
    pub fn render(&self, invoice: &Invoice) -> Vec<(&'static str, String)> {
        self.fields.iter().map(|f| (f.label, (f.display)(invoice))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn today() -> Date {
        parse_date("2024-06-30").unwrap()
    }

    #[test]
    fn test_standard_form_is_valid() {
        let form = InvoiceForm::standard().unwrap();
        assert_eq!(form.fields().len(), STANDARD_FIELDS.len());
    }

    #[test]
    fn test_rejects_bad_tables() {
        let duplicated = [STANDARD_FIELDS[0], STANDARD_FIELDS[0], STANDARD_FIELDS[3]];
        assert!(InvoiceForm::new(&duplicated).is_err());

        let no_party: Vec<FieldBinding> = STANDARD_FIELDS.iter().copied().filter(|f| f.key != "party").collect();
        assert!(InvoiceForm::new(&no_party).is_err());
    }

    #[test]
    fn test_draft_from_input() {
        let form = InvoiceForm::standard().unwrap();
        let draft = form
            .draft(
                [
                    ("type", "inward"),
                    ("party", " Acme "),
                    ("date", "2024-01-05"),
                    ("item", "Bolts = 60.00"),
                    ("item", "Nuts=40"),
                    ("notes", "net 30"),
                ],
                today(),
            )
            .unwrap();
        assert_eq!(draft.variant, InvoiceVariant::Inward);
        assert_eq!(draft.party, "Acme");
        assert_eq!(draft.date, parse_date("2024-01-05").unwrap());
        assert_eq!(draft.items, vec![LineItem::new("Bolts", dec!(60.00)), LineItem::new("Nuts", dec!(40))]);
        assert_eq!(draft.resolved_total(), Ok(dec!(100.00)));
        assert_eq!(draft.description.as_deref(), Some("net 30"));
    }

    #[test]
    fn test_draft_defaults_and_missing_fields() {
        let form = InvoiceForm::standard().unwrap();
        let draft = form.draft([("type", "outward"), ("party", "Globex"), ("total", "12.5")], today()).unwrap();
        assert_eq!(draft.date, today());
        assert_eq!(draft.total, Some(dec!(12.5)));

        assert_eq!(
            form.draft([("party", "Globex")], today()).unwrap_err(),
            ValidationError::MissingField("type")
        );
        assert_eq!(
            form.draft([("type", "outward")], today()).unwrap_err(),
            ValidationError::MissingField("party")
        );
    }

    #[test]
    fn test_rejects_non_numeric_amounts() {
        let form = InvoiceForm::standard().unwrap();
        let err = form
            .draft([("type", "inward"), ("party", "Acme"), ("total", "ten")], today())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "total", .. }));

        let err = form
            .draft([("type", "inward"), ("party", "Acme"), ("item", "Bolts=1O")], today())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "item amount", .. }));

        let err = form
            .draft([("type", "inward"), ("party", "Acme"), ("item", "Bolts")], today())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "item", .. }));
    }

    #[test]
    fn test_rejects_unknown_repeated_and_fixed_fields() {
        let form = InvoiceForm::standard().unwrap();
        assert!(form.draft([("type", "inward"), ("colour", "red")], today()).is_err());
        assert!(form.draft([("type", "inward"), ("type", "outward")], today()).is_err());
        assert!(form.draft([("type", "inward"), ("party", "Acme"), ("number", "7")], today()).is_err());
        assert!(form.changes([("type", "outward")]).is_err());
    }

    #[test]
    fn test_changes() {
        let form = InvoiceForm::standard().unwrap();
        assert!(form.changes(std::iter::empty()).unwrap().is_empty());

        let changes = form.changes([("item", ""), ("notes", "")]).unwrap();
        assert_eq!(changes.items, Some(Vec::new()));
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.party, None);

        let changes = form.changes([("party", "Initech"), ("total", "99.99")]).unwrap();
        assert_eq!(changes.party.as_deref(), Some("Initech"));
        assert_eq!(changes.total, Some(dec!(99.99)));
    }

    #[test]
    fn test_render() {
        let form = InvoiceForm::standard().unwrap();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            number: 4,
            variant: InvoiceVariant::Inward,
            date: parse_date("2024-01-05").unwrap(),
            party: "Acme".to_string(),
            items: vec![LineItem::new("Bolts", dec!(100.00))],
            total: dec!(100.00),
            description: None,
        };
        let rendered = form.render(&invoice);
        assert_eq!(rendered[0], ("Type", "Inward".to_string()));
        assert_eq!(rendered[1], ("Invoice No", "IN-00004".to_string()));
        assert_eq!(rendered[4], ("Items", "Bolts = 100.00".to_string()));
        assert_eq!(rendered[6], ("Notes", String::new()));
    }
}
