//! In-memory storage backend for InvoiceDB.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use uuid::Uuid;

use invoicedb_core::{
    next_number, sort_invoices, Invoice, InvoiceChanges, InvoiceDraft, InvoiceFilter, InvoiceId, InvoiceNumber,
    InvoiceVariant, StorageBackend, StorageError,
};

#[derive(Default)]
struct State {
    invoices: BTreeMap<InvoiceId, Invoice>,
    last_issued: HashMap<InvoiceVariant, InvoiceNumber>,
}

impl State {
    fn next_number(&self, variant: InvoiceVariant) -> Result<InvoiceNumber, StorageError> {
        let current_max = self
            .invoices
            .values()
            .filter(|inv| inv.variant == variant)
            .map(|inv| inv.number)
            .max();
        next_number(current_max, self.last_issued.get(&variant).copied())
    }
}

pub struct InMemoryStorage {
    state: RwLock<State>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StorageError> {
        self.state
            .read()
            .map_err(|_| StorageError::Other("storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StorageError> {
        self.state
            .write()
            .map_err(|_| StorageError::Other("storage lock poisoned".to_string()))
    }
}

impl StorageBackend for InMemoryStorage {
    fn create_invoice(&self, draft: &InvoiceDraft) -> Result<Invoice, StorageError> {
        let mut state = self.write()?;
        let number = state.next_number(draft.variant)?;

        let invoice = draft.to_invoice(Uuid::new_v4(), number)?;

        state.last_issued.insert(draft.variant, number);
        state.invoices.insert(invoice.id, invoice.clone());
        tracing::debug!(id = %invoice.id, number, variant = %draft.variant, "invoice stored in memory");
        Ok(invoice)
    }

    fn update_invoice(&self, id: InvoiceId, changes: &InvoiceChanges) -> Result<Invoice, StorageError> {
        let mut state = self.write()?;
        let existing = state.invoices.get_mut(&id).ok_or(StorageError::InvoiceNotFound(id))?;
        *existing = changes.apply_to(existing)?;
        Ok(existing.clone())
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<(), StorageError> {
        let mut state = self.write()?;
        match state.invoices.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::InvoiceNotFound(id)),
        }
    }

    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StorageError> {
        Ok(self.read()?.invoices.get(&id).cloned())
    }

    fn query_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, StorageError> {
        let state = self.read()?;
        let mut result: Vec<Invoice> = state.invoices.values().filter(|inv| filter.matches(inv)).cloned().collect();
        sort_invoices(&mut result);
        Ok(result)
    }

    fn next_number(&self, variant: InvoiceVariant) -> Result<InvoiceNumber, StorageError> {
        self.read()?.next_number(variant)
    }
}
