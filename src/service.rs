use std::{path::Path, sync::Arc};

use rust_decimal::Decimal;
use thiserror::Error;
use time::{Date, Duration};

use invoicedb_core::{
    validate_draft, validate_invoice, Invoice, InvoiceChanges, InvoiceDraft, InvoiceFilter, InvoiceId,
    InvoiceNumber, InvoiceVariant, StorageBackend, StorageError, ValidationError,
};

use crate::{
    export::{self, ExportError},
    search::{self, SearchError},
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("invoice not found: {0}")]
    NotFound(InvoiceId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render error: {0}")]
    Render(String),
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvoiceNotFound(id) => ServiceError::NotFound(id),
            StorageError::IOError(io) => ServiceError::Io(io),
            StorageError::Invalid(e) => ServiceError::Validation(e),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<ExportError> for ServiceError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Io(io) => ServiceError::Io(io),
            ExportError::Render(msg) => ServiceError::Render(msg),
            ExportError::Format(msg) => {
                ServiceError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
            }
        }
    }
}

impl From<SearchError> for ServiceError {
    fn from(e: SearchError) -> Self {
        ServiceError::Validation(ValidationError::invalid("search", e.to_string()))
    }
}

/// Invoice operations on top of a storage backend. Input is validated here,
/// before anything reaches storage, so a rejected request leaves the store
/// untouched.
pub struct InvoiceService {
    storage: Arc<dyn StorageBackend>,
}

impl InvoiceService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub fn create(&self, draft: &InvoiceDraft) -> Result<Invoice, ServiceError> {
        validate_draft(draft).map_err(|e| {
            tracing::warn!(error = %e, party = %draft.party, "Invoice draft rejected");
            e
        })?;
        let invoice = self.storage.create_invoice(draft)?;
        tracing::info!(id = %invoice.id, label = %invoice.label(), "Invoice created");
        Ok(invoice)
    }

    pub fn update(&self, id: InvoiceId, changes: &InvoiceChanges) -> Result<Invoice, ServiceError> {
        if changes.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }
        let current = self.get(id)?;
        changes
            .apply_to(&current)
            .and_then(|updated| validate_invoice(&updated))
            .map_err(|e| {
                tracing::warn!(error = %e, %id, "Invoice changes rejected");
                e
            })?;

        let invoice = self.storage.update_invoice(id, changes)?;
        tracing::info!(id = %invoice.id, label = %invoice.label(), "Invoice updated");
        Ok(invoice)
    }

    pub fn delete(&self, id: InvoiceId) -> Result<(), ServiceError> {
        self.storage.delete_invoice(id)?;
        tracing::info!(%id, "Invoice deleted");
        Ok(())
    }

    pub fn get(&self, id: InvoiceId) -> Result<Invoice, ServiceError> {
        self.storage.get_invoice(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Fetches each id in turn, failing on the first one that is missing.
    pub fn get_many(&self, ids: &[InvoiceId]) -> Result<Vec<Invoice>, ServiceError> {
        ids.iter().map(|id| self.get(*id)).collect()
    }

    pub fn query(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, ServiceError> {
        Ok(self.storage.query_invoices(filter)?)
    }

    pub fn search(&self, expr: &str) -> Result<Vec<Invoice>, ServiceError> {
        let filter = search::parse(expr)?;
        self.query(&filter)
    }

    pub fn next_number(&self, variant: InvoiceVariant) -> Result<InvoiceNumber, ServiceError> {
        Ok(self.storage.next_number(variant)?)
    }

    pub fn export_csv(&self, path: &Path, invoices: &[Invoice]) -> Result<(), ServiceError> {
        export::csv::export_invoices(path, invoices)?;
        Ok(())
    }

    pub fn export_pdf(&self, path: &Path, invoices: &[Invoice]) -> Result<(), ServiceError> {
        export::pdf::export_invoices(path, invoices)?;
        Ok(())
    }

    /// Seeds the store with a few demonstration invoices, alternating
    /// outward and inward and dated back from `today`.
    pub fn insert_samples(&self, today: Date) -> Result<Vec<Invoice>, ServiceError> {
        let parties = ["Acme Ltd", "Globex Corporation", "Initech"];
        let mut created = Vec::with_capacity(parties.len());

        for (idx, party) in parties.iter().enumerate() {
            let variant = if idx % 2 == 0 { InvoiceVariant::Outward } else { InvoiceVariant::Inward };
            let date = today - Duration::days(idx as i64);
            let draft = InvoiceDraft::new(variant, date, *party)
                .with_item("Item A x1", Decimal::new(100_00, 2))
                .with_item("Item B x2", Decimal::new(200_00, 2))
                .with_description("Sample invoice");
            created.push(self.create(&draft)?);
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicedb_core::{parse_date, LineItem};
    use invoicedb_memory::InMemoryStorage;
    use rust_decimal_macros::dec;

    fn service() -> InvoiceService {
        InvoiceService::new(Arc::new(InMemoryStorage::new()))
    }

    fn date(s: &str) -> Date {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_create_validates_before_storing() {
        let service = service();
        let draft = InvoiceDraft::new(InvoiceVariant::Inward, date("2024-01-05"), "Acme").with_total(dec!(-1));
        assert!(matches!(
            service.create(&draft),
            Err(ServiceError::Validation(ValidationError::NegativeTotal(_)))
        ));
        assert!(service.query(&InvoiceFilter::new()).unwrap().is_empty());
        assert_eq!(service.next_number(InvoiceVariant::Inward).unwrap(), 1);
    }

    #[test]
    fn test_create_rejects_overflowing_total() {
        let service = service();
        let form = crate::form::InvoiceForm::standard().unwrap();
        let draft = form
            .draft(
                [
                    ("type", "inward"),
                    ("party", "Acme"),
                    ("item", "a=79228162514264337593543950335"),
                    ("item", "b=1"),
                ],
                date("2024-01-05"),
            )
            .unwrap();
        assert!(matches!(
            service.create(&draft),
            Err(ServiceError::Validation(ValidationError::InvalidField { field: "total", .. }))
        ));
        assert!(service.query(&InvoiceFilter::new()).unwrap().is_empty());

        let created = service
            .create(&InvoiceDraft::new(InvoiceVariant::Inward, date("2024-01-05"), "Acme").with_total(dec!(1)))
            .unwrap();
        let changes = InvoiceChanges {
            items: Some(vec![LineItem::new("a", Decimal::MAX), LineItem::new("b", Decimal::ONE)]),
            ..Default::default()
        };
        assert!(matches!(
            service.update(created.id, &changes),
            Err(ServiceError::Validation(ValidationError::InvalidField { field: "total", .. }))
        ));
        assert_eq!(service.get(created.id).unwrap(), created);
    }

    #[test]
    fn test_create_rejects_out_of_range_year() {
        let service = service();
        let mut draft = InvoiceDraft::new(InvoiceVariant::Outward, date("2024-01-05"), "Acme");
        draft.date = Date::from_calendar_date(-1, time::Month::March, 1).unwrap();
        assert!(matches!(
            service.create(&draft),
            Err(ServiceError::Validation(ValidationError::InvalidField { field: "date", .. }))
        ));
        assert!(service.query(&InvoiceFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_update_rules() {
        let service = service();
        let created = service
            .create(&InvoiceDraft::new(InvoiceVariant::Outward, date("2024-01-05"), "Acme").with_total(dec!(50)))
            .unwrap();

        assert!(matches!(
            service.update(created.id, &InvoiceChanges::default()),
            Err(ServiceError::Validation(ValidationError::NoChanges))
        ));

        let blank = InvoiceChanges {
            party: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(created.id, &blank),
            Err(ServiceError::Validation(ValidationError::BlankParty))
        ));
        assert_eq!(service.get(created.id).unwrap(), created);

        let changes = InvoiceChanges {
            items: Some(vec![LineItem::new("Consulting", dec!(75.00))]),
            ..Default::default()
        };
        let updated = service.update(created.id, &changes).unwrap();
        assert_eq!(updated.total, dec!(75.00));
        assert_eq!(updated.number, created.number);

        let missing = uuid::Uuid::new_v4();
        assert!(matches!(
            service.update(missing, &changes),
            Err(ServiceError::NotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_delete_and_get_missing() {
        let service = service();
        let missing = uuid::Uuid::new_v4();
        assert!(matches!(service.delete(missing), Err(ServiceError::NotFound(_))));
        assert!(matches!(service.get(missing), Err(ServiceError::NotFound(_))));
        assert!(matches!(service.get_many(&[missing]), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_search() {
        let service = service();
        service.insert_samples(date("2024-03-10")).unwrap();

        let inward = service.search("type:inward").unwrap();
        assert_eq!(inward.len(), 1);
        assert_eq!(inward[0].party, "Globex Corporation");

        let acme = service.search("customer:acme").unwrap();
        assert_eq!(acme.len(), 1);

        assert!(matches!(
            service.search("type:sideways"),
            Err(ServiceError::Validation(ValidationError::InvalidField { field: "search", .. }))
        ));
    }

    #[test]
    fn test_samples() {
        let service = service();
        let samples = service.insert_samples(date("2024-03-10")).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples.iter().map(|s| s.label()).collect::<Vec<_>>(),
            vec!["OUT-00001", "IN-00001", "OUT-00002"]
        );
        assert!(samples.iter().all(|s| s.total == dec!(300.00)));
        assert_eq!(samples[2].date, date("2024-03-08"));
    }

    #[test]
    fn test_export_errors_map() {
        let service = service();
        assert!(matches!(
            service.export_pdf(Path::new("unused.pdf"), &[]),
            Err(ServiceError::Render(_))
        ));
    }
}
