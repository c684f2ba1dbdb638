use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::{LedgerStore, Result, StoreDocument};
use crate::{
    errors::LedgerError,
    ledger::{FlowRole, OneOffEntry, OpeningBalance, RecurringDefinition},
};

/// Process-local store, used by tests and as a scratch backend.
#[derive(Debug)]
pub struct MemoryStore {
    document: RwLock<StoreDocument>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_document(StoreDocument::new())
    }

    pub fn from_document(document: StoreDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreDocument>> {
        self.document
            .read()
            .map_err(|_| LedgerError::Storage("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreDocument>> {
        self.document
            .write()
            .map_err(|_| LedgerError::Storage("memory store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn list_income_definitions(&self) -> Result<Vec<RecurringDefinition>> {
        Ok(self.read()?.income_sources.clone())
    }

    fn list_bill_definitions(&self) -> Result<Vec<RecurringDefinition>> {
        Ok(self.read()?.bills.clone())
    }

    fn list_one_off_entries(&self) -> Result<Vec<OneOffEntry>> {
        Ok(self.read()?.misc_spending.clone())
    }

    fn get_opening_balance(&self) -> Result<Option<OpeningBalance>> {
        Ok(self.read()?.opening)
    }

    fn set_opening_balance(&self, opening: OpeningBalance) -> Result<()> {
        self.write()?.opening = Some(opening);
        Ok(())
    }

    fn upsert_definition(&self, role: FlowRole, definition: &RecurringDefinition) -> Result<()> {
        self.write()?.upsert_definition(role, definition);
        Ok(())
    }

    fn delete_definition(&self, id: Uuid) -> Result<bool> {
        Ok(self.write()?.delete_definition(id))
    }

    fn insert_one_off(&self, entry: &OneOffEntry) -> Result<()> {
        self.write()?.insert_one_off(entry);
        Ok(())
    }

    fn delete_one_off(&self, id: Uuid) -> Result<bool> {
        Ok(self.write()?.delete_one_off(id))
    }
}
