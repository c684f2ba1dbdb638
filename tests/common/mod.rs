#![allow(dead_code)]

use cashflow_core::{
    ledger::{BudgetState, OpeningBalance, RecurringDefinition, Schedule},
    storage::{persist, MemoryStore},
    utils::SequentialIds,
};
use chrono::NaiveDate;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}

pub fn definition(
    id: u128,
    label: &str,
    amount: i64,
    schedule: Schedule,
    start: NaiveDate,
) -> RecurringDefinition {
    RecurringDefinition::new(Uuid::from_u128(id), label, amount, schedule, start)
}

/// Empty state anchored on 2025-01-01 plus the store and id source that back it.
pub struct Harness {
    pub state: BudgetState,
    pub store: MemoryStore,
    pub ids: SequentialIds,
}

impl Harness {
    pub fn new(opening_amount: i64) -> Self {
        Self {
            state: BudgetState::new(OpeningBalance::new(opening_amount, date(2025, 1, 1))),
            store: MemoryStore::new(),
            ids: SequentialIds::new(),
        }
    }

    pub fn apply(&mut self, action: cashflow_core::ledger::Action) {
        let mutations = self.state.apply(action, &self.ids).expect("action applies");
        persist(&self.store, &mutations).expect("mutations persist");
    }
}
