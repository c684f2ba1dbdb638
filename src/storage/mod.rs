//! Persistence contract for definitions, one-off entries, and the opening balance.

pub mod document;
pub mod json_backend;
pub mod memory;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::LedgerError,
    ledger::{
        BudgetState, FlowRole, Mutation, OneOffEntry, OpeningBalance, RecurringDefinition,
    },
};

pub use document::{StoreDocument, STORE_SCHEMA_VERSION};
pub use json_backend::JsonStore;
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Record store keyed by entity id. Each call is one atomic per-entity operation.
pub trait LedgerStore: Send + Sync {
    fn list_income_definitions(&self) -> Result<Vec<RecurringDefinition>>;
    fn list_bill_definitions(&self) -> Result<Vec<RecurringDefinition>>;
    fn list_one_off_entries(&self) -> Result<Vec<OneOffEntry>>;
    fn get_opening_balance(&self) -> Result<Option<OpeningBalance>>;
    fn set_opening_balance(&self, opening: OpeningBalance) -> Result<()>;
    fn upsert_definition(&self, role: FlowRole, definition: &RecurringDefinition) -> Result<()>;
    /// Returns whether a definition with `id` existed.
    fn delete_definition(&self, id: Uuid) -> Result<bool>;
    fn insert_one_off(&self, entry: &OneOffEntry) -> Result<()>;
    /// Returns whether an entry with `id` existed.
    fn delete_one_off(&self, id: Uuid) -> Result<bool>;
}

/// Reads a full snapshot, falling back to `default_opening` when the store has
/// no opening balance yet.
pub fn load_state(store: &dyn LedgerStore, default_opening: OpeningBalance) -> Result<BudgetState> {
    let opening = store.get_opening_balance()?.unwrap_or(default_opening);
    let state = BudgetState {
        opening,
        incomes: store.list_income_definitions()?,
        bills: store.list_bill_definitions()?,
        misc: store.list_one_off_entries()?,
    };
    for warning in state_warnings(&state) {
        warn!("{warning}");
    }
    Ok(state)
}

/// Forwards reducer output to the store, in order.
pub fn persist(store: &dyn LedgerStore, mutations: &[Mutation]) -> Result<()> {
    for mutation in mutations {
        match mutation {
            Mutation::UpsertDefinition { role, definition } => {
                store.upsert_definition(*role, definition)?
            }
            Mutation::DeleteDefinition { id, .. } => {
                if !store.delete_definition(*id)? {
                    warn!(definition = %id, "definition already absent from store");
                }
            }
            Mutation::InsertOneOff(entry) => store.insert_one_off(entry)?,
            Mutation::DeleteOneOff(id) => {
                if !store.delete_one_off(*id)? {
                    warn!(entry = %id, "one-off entry already absent from store");
                }
            }
            Mutation::SetOpeningBalance(opening) => store.set_opening_balance(*opening)?,
        }
    }
    info!(count = mutations.len(), "persisted mutations");
    Ok(())
}

/// Detects records that load fine but will never produce what a user expects.
pub fn state_warnings(state: &BudgetState) -> Vec<String> {
    let mut warnings = Vec::new();
    for (role, defs) in [
        (FlowRole::Income, &state.incomes),
        (FlowRole::Bill, &state.bills),
    ] {
        for def in defs.iter() {
            if !def.schedule.is_implemented() {
                warnings.push(format!(
                    "{role} {} uses schedule `{}` which is not expanded",
                    def.id, def.schedule
                ));
            }
            if def.end_date.is_some_and(|end| end <= def.start_date) {
                warnings.push(format!("{role} {} ends before it starts", def.id));
            }
            if def.amount < 0 {
                warnings.push(format!("{role} {} has a negative amount", def.id));
            }
        }
    }
    for entry in &state.misc {
        if entry.amount < 0 {
            warnings.push(format!("one-off {} has a negative amount", entry.id));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Action, Schedule};
    use crate::utils::SequentialIds;
    use crate::utils::ids::IdGenerator;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn persisted_session_reloads_identically() {
        let store = MemoryStore::new();
        let opening = OpeningBalance::new(100_000, date(2025, 1, 1));
        let ids = SequentialIds::new();
        let mut state = load_state(&store, opening).unwrap();

        let rent = RecurringDefinition::new(
            ids.next_id(),
            "Rent",
            80_000,
            Schedule::Monthly,
            date(2025, 1, 3),
        );
        let coffee = OneOffEntry::new(ids.next_id(), date(2025, 1, 2), 500, "Coffee");
        for action in [
            Action::SetOpeningBalance(opening),
            Action::AddDefinition {
                role: FlowRole::Bill,
                definition: rent,
            },
            Action::AddOneOff(coffee),
        ] {
            let mutations = state.apply(action, &ids).unwrap();
            persist(&store, &mutations).unwrap();
        }

        let reloaded = load_state(&store, OpeningBalance::new(0, date(2030, 1, 1))).unwrap();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn warnings_flag_unexpandable_definitions() {
        let mut state = BudgetState::new(OpeningBalance::new(0, date(2025, 1, 1)));
        state.bills.push(RecurringDefinition::new(
            Uuid::from_u128(1),
            "Insurance",
            1_000,
            Schedule::TwiceMonthly,
            date(2025, 1, 1),
        ));
        state.incomes.push(
            RecurringDefinition::new(
                Uuid::from_u128(2),
                "Pay",
                1_000,
                Schedule::Weekly,
                date(2025, 1, 10),
            )
            .with_end_date(date(2025, 1, 10)),
        );
        let warnings = state_warnings(&state);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("ends before it starts"));
        assert!(warnings[1].contains("twicemonthly"));
    }
}
