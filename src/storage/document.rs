use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{FlowRole, OneOffEntry, OpeningBalance, RecurringDefinition};

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Everything a backend persists, grouped the way the record store indexes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreDocument {
    #[serde(default = "StoreDocument::schema_version_default")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening: Option<OpeningBalance>,
    #[serde(default)]
    pub income_sources: Vec<RecurringDefinition>,
    #[serde(default)]
    pub bills: Vec<RecurringDefinition>,
    #[serde(default)]
    pub misc_spending: Vec<OneOffEntry>,
}

impl StoreDocument {
    pub fn new() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            ..Self::default()
        }
    }

    pub fn schema_version_default() -> u32 {
        STORE_SCHEMA_VERSION
    }

    fn table_mut(&mut self, role: FlowRole) -> &mut Vec<RecurringDefinition> {
        match role {
            FlowRole::Income => &mut self.income_sources,
            FlowRole::Bill => &mut self.bills,
        }
    }

    /// Inserts or replaces by id. A definition never lives in both tables, so
    /// any copy under the other role is dropped.
    pub fn upsert_definition(&mut self, role: FlowRole, definition: &RecurringDefinition) {
        let other = match role {
            FlowRole::Income => FlowRole::Bill,
            FlowRole::Bill => FlowRole::Income,
        };
        self.table_mut(other).retain(|def| def.id != definition.id);
        let table = self.table_mut(role);
        match table.iter_mut().find(|def| def.id == definition.id) {
            Some(existing) => *existing = definition.clone(),
            None => table.push(definition.clone()),
        }
    }

    pub fn delete_definition(&mut self, id: Uuid) -> bool {
        let before = self.income_sources.len() + self.bills.len();
        self.income_sources.retain(|def| def.id != id);
        self.bills.retain(|def| def.id != id);
        before != self.income_sources.len() + self.bills.len()
    }

    pub fn insert_one_off(&mut self, entry: &OneOffEntry) {
        match self.misc_spending.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => self.misc_spending.push(entry.clone()),
        }
    }

    pub fn delete_one_off(&mut self, id: Uuid) -> bool {
        let before = self.misc_spending.len();
        self.misc_spending.retain(|entry| entry.id != id);
        before != self.misc_spending.len()
    }
}
