//! Application state as a plain value plus a reducer step per user action.
//!
//! `apply` validates and plans the change first, then commits it; a failing
//! action leaves the state exactly as it was. The returned mutations are what a
//! storage adapter needs to mirror the change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::dates::DateWindow;
use super::definition::{
    ensure_valid_amount, FlowRole, OneOffEntry, OpeningBalance, RecurringDefinition,
};
use super::series::{DeleteRequest, EditRequest, SeriesEditor};
use super::timeline::{events_on, project, Timeline, TimelineRow};
use crate::errors::{LedgerError, Result};
use crate::utils::IdGenerator;

/// A single persistence-level change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mutation {
    UpsertDefinition {
        role: FlowRole,
        definition: RecurringDefinition,
    },
    DeleteDefinition {
        role: FlowRole,
        id: Uuid,
    },
    InsertOneOff(OneOffEntry),
    DeleteOneOff(Uuid),
    SetOpeningBalance(OpeningBalance),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    AddDefinition {
        role: FlowRole,
        definition: RecurringDefinition,
    },
    AddOneOff(OneOffEntry),
    DeleteOneOff(Uuid),
    Delete(DeleteRequest),
    Edit(EditRequest),
    SetOpeningBalance(OpeningBalance),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetState {
    pub opening: OpeningBalance,
    #[serde(default)]
    pub incomes: Vec<RecurringDefinition>,
    #[serde(default)]
    pub bills: Vec<RecurringDefinition>,
    #[serde(default)]
    pub misc: Vec<OneOffEntry>,
}

impl BudgetState {
    pub fn new(opening: OpeningBalance) -> Self {
        Self {
            opening,
            incomes: Vec::new(),
            bills: Vec::new(),
            misc: Vec::new(),
        }
    }

    pub fn definitions(&self, role: FlowRole) -> &[RecurringDefinition] {
        match role {
            FlowRole::Income => &self.incomes,
            FlowRole::Bill => &self.bills,
        }
    }

    fn definitions_mut(&mut self, role: FlowRole) -> &mut Vec<RecurringDefinition> {
        match role {
            FlowRole::Income => &mut self.incomes,
            FlowRole::Bill => &mut self.bills,
        }
    }

    pub fn find_definition(&self, id: Uuid) -> Option<(FlowRole, &RecurringDefinition)> {
        [FlowRole::Income, FlowRole::Bill]
            .into_iter()
            .find_map(|role| {
                self.definitions(role)
                    .iter()
                    .find(|def| def.id == id)
                    .map(|def| (role, def))
            })
    }

    pub fn one_off(&self, id: Uuid) -> Option<&OneOffEntry> {
        self.misc.iter().find(|entry| entry.id == id)
    }

    pub fn timeline(&self, window: DateWindow) -> Timeline {
        project(&self.opening, &self.incomes, &self.bills, &self.misc, window)
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<TimelineRow> {
        events_on(&self.opening, &self.incomes, &self.bills, &self.misc, date)
    }

    /// Pure form of [`BudgetState::apply`].
    pub fn reduce(
        mut self,
        action: Action,
        ids: &dyn IdGenerator,
    ) -> Result<(Self, Vec<Mutation>)> {
        let mutations = self.apply(action, ids)?;
        Ok((self, mutations))
    }

    /// Validates `action`, commits it, and returns the mutations to persist.
    pub fn apply(&mut self, action: Action, ids: &dyn IdGenerator) -> Result<Vec<Mutation>> {
        let mutations = self.plan(action, ids)?;
        self.commit(&mutations);
        Ok(mutations)
    }

    fn plan(&self, action: Action, ids: &dyn IdGenerator) -> Result<Vec<Mutation>> {
        match action {
            Action::AddDefinition { role, definition } => {
                ensure_valid_amount(definition.amount)?;
                // Ids are unique across both roles; the store keys on id alone.
                if self.find_definition(definition.id).is_some() {
                    return Err(LedgerError::DuplicateId(definition.id));
                }
                Ok(vec![Mutation::UpsertDefinition { role, definition }])
            }
            Action::AddOneOff(entry) => {
                ensure_valid_amount(entry.amount)?;
                if self.one_off(entry.id).is_some() {
                    return Err(LedgerError::DuplicateId(entry.id));
                }
                Ok(vec![Mutation::InsertOneOff(entry)])
            }
            Action::DeleteOneOff(id) => {
                if self.one_off(id).is_none() {
                    return Err(LedgerError::EntryNotFound(id));
                }
                Ok(vec![Mutation::DeleteOneOff(id)])
            }
            Action::Delete(request) => {
                let (role, def) = self
                    .find_definition(request.definition_id)
                    .ok_or(LedgerError::DefinitionNotFound(request.definition_id))?;
                Ok(SeriesEditor::delete(def, request.scope)?.into_mutations(role))
            }
            Action::Edit(request) => {
                let (role, def) = self
                    .find_definition(request.definition_id)
                    .ok_or(LedgerError::DefinitionNotFound(request.definition_id))?;
                Ok(SeriesEditor::edit(def, &request, ids)?.into_mutations(role))
            }
            Action::SetOpeningBalance(opening) => {
                ensure_valid_amount(opening.amount.saturating_abs())?;
                Ok(vec![Mutation::SetOpeningBalance(opening)])
            }
        }
    }

    /// Mirrors already-validated mutations into the in-memory state.
    pub fn commit(&mut self, mutations: &[Mutation]) {
        for mutation in mutations {
            debug!(?mutation, "committing mutation");
            match mutation {
                Mutation::UpsertDefinition { role, definition } => {
                    let defs = self.definitions_mut(*role);
                    match defs.iter_mut().find(|def| def.id == definition.id) {
                        Some(existing) => *existing = definition.clone(),
                        None => defs.push(definition.clone()),
                    }
                }
                Mutation::DeleteDefinition { role, id } => {
                    let defs = self.definitions_mut(*role);
                    let before = defs.len();
                    defs.retain(|def| def.id != *id);
                    if defs.len() == before {
                        warn!(definition = %id, "delete requested for unknown definition");
                    }
                }
                Mutation::InsertOneOff(entry) => {
                    match self.misc.iter_mut().find(|existing| existing.id == entry.id) {
                        Some(existing) => *existing = entry.clone(),
                        None => self.misc.push(entry.clone()),
                    }
                }
                Mutation::DeleteOneOff(id) => self.misc.retain(|entry| entry.id != *id),
                Mutation::SetOpeningBalance(opening) => self.opening = *opening,
            }
        }
    }
}
