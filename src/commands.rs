use prettytable::{row, Table};
use time::Date;
use uuid::Uuid;

use invoicedb_core::{Invoice, InvoiceId, InvoiceListing, InvoiceVariant, ValidationError};

use crate::{
    config::{AddArgs, Command, Config, EditArgs},
    form::InvoiceForm,
    service::{InvoiceService, ServiceError},
};

fn parse_id(raw: &str) -> Result<InvoiceId, ValidationError> {
    Uuid::parse_str(raw.trim()).map_err(|e| ValidationError::invalid("id", format!("{}: {}", raw, e)))
}

fn add_pairs(args: &AddArgs) -> Vec<(&str, &str)> {
    let mut pairs = vec![("type", args.variant.as_str()), ("party", args.party.as_str())];
    if let Some(date) = &args.date {
        pairs.push(("date", date.as_str()));
    }
    pairs.extend(args.items.iter().map(|i| ("item", i.as_str())));
    if let Some(total) = &args.total {
        pairs.push(("total", total.as_str()));
    }
    if let Some(notes) = &args.notes {
        pairs.push(("notes", notes.as_str()));
    }
    pairs
}

fn edit_pairs(args: &EditArgs) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    if let Some(party) = &args.party {
        pairs.push(("party", party.as_str()));
    }
    if let Some(date) = &args.date {
        pairs.push(("date", date.as_str()));
    }
    if args.clear_items {
        pairs.push(("item", ""));
    }
    pairs.extend(args.items.iter().map(|i| ("item", i.as_str())));
    if let Some(total) = &args.total {
        pairs.push(("total", total.as_str()));
    }
    if let Some(notes) = &args.notes {
        pairs.push(("notes", notes.as_str()));
    }
    if args.clear_notes {
        pairs.push(("notes", ""));
    }
    pairs
}

/// Invoices named by `--id`, or else those matching the search expression.
fn select(service: &InvoiceService, ids: &[String], filter: Option<&str>) -> Result<Vec<Invoice>, ServiceError> {
    if ids.is_empty() {
        return service.search(filter.unwrap_or(""));
    }
    let ids = ids.iter().map(|id| parse_id(id)).collect::<Result<Vec<_>, _>>()?;
    service.get_many(&ids)
}

fn detail_table(form: &InvoiceForm, invoice: &Invoice) -> String {
    let mut table = Table::new();
    table.add_row(row!["Id", invoice.id]);
    for (label, value) in form.render(invoice) {
        table.add_row(row![label, value]);
    }
    table.to_string()
}

/// Runs one command and returns the text to print on success.
pub fn execute(
    service: &InvoiceService,
    form: &InvoiceForm,
    config: &Config,
    command: &Command,
    today: Date,
) -> Result<String, ServiceError> {
    match command {
        Command::Add(args) => {
            let draft = form.draft(add_pairs(args), today)?;
            let invoice = service.create(&draft)?;
            Ok(format!("Created {} ({})", invoice.label(), invoice.id))
        }
        Command::Edit(args) => {
            let id = parse_id(&args.id)?;
            let changes = form.changes(edit_pairs(args))?;
            let invoice = service.update(id, &changes)?;
            Ok(format!("Updated {} ({})", invoice.label(), invoice.id))
        }
        Command::Delete { id } => {
            let id = parse_id(id)?;
            service.delete(id)?;
            Ok(format!("Deleted {}", id))
        }
        Command::Show { id } => {
            let invoice = service.get(parse_id(id)?)?;
            Ok(detail_table(form, &invoice))
        }
        Command::List { query } => {
            let invoices = service.search(&query.join(" "))?;
            if invoices.is_empty() {
                return Ok("No invoices found".to_string());
            }
            Ok(InvoiceListing(&invoices).to_string())
        }
        Command::ExportCsv { path, ids, filter } => {
            let invoices = select(service, ids, filter.as_deref())?;
            let path = path.clone().unwrap_or_else(|| config.export.directory.join("invoices.csv"));
            service.export_csv(&path, &invoices)?;
            Ok(format!("Exported {} invoices to {}", invoices.len(), path.display()))
        }
        Command::ExportPdf { path, ids, filter } => {
            let invoices = select(service, ids, filter.as_deref())?;
            let path = match (path, invoices.as_slice()) {
                (Some(path), _) => path.clone(),
                (None, [single]) => config.export.directory.join(format!("{}.pdf", single.label())),
                (None, _) => config.export.directory.join("invoices.pdf"),
            };
            service.export_pdf(&path, &invoices)?;
            Ok(format!("Rendered {} invoices to {}", invoices.len(), path.display()))
        }
        Command::NextNumber { variant } => {
            let variant = variant
                .parse::<InvoiceVariant>()
                .map_err(|e| ValidationError::invalid("type", e.to_string()))?;
            let number = service.next_number(variant)?;
            Ok(format!("{}-{:05}", variant.prefix(), number))
        }
        Command::Sample => {
            let created = service.insert_samples(today)?;
            let labels: Vec<String> = created.iter().map(|i| i.label()).collect();
            Ok(format!("Inserted {} sample invoices: {}", created.len(), labels.join(", ")))
        }
    }
}
