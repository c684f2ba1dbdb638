//! Series editing: "this occurrence" versus "this and future" changes.
//!
//! Every transition leaves the original definition's expansion before the
//! target date untouched. Edits only ever narrow the original (an exception or
//! an earlier end date) and put the new values on a fresh definition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::definition::{ensure_valid_amount, FlowRole, RecurringDefinition, Schedule};
use super::money::MinorUnits;
use super::recurring::occurs_on;
use super::state::Mutation;
use crate::errors::{LedgerError, Result};
use crate::utils::IdGenerator;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeleteScope {
    EntireSeries,
    ThisOccurrence(NaiveDate),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteRequest {
    pub definition_id: Uuid,
    pub scope: DeleteScope,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EditScope {
    ThisOccurrence,
    ThisAndFuture,
}

/// New field values; `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefinitionChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<MinorUnits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autopay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl DefinitionChanges {
    pub fn amount(amount: MinorUnits) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            ensure_valid_amount(amount)?;
        }
        Ok(())
    }

    /// Applies everything except the schedule.
    fn apply_values(&self, def: &mut RecurringDefinition) {
        if let Some(label) = &self.label {
            def.label = label.clone();
        }
        if let Some(amount) = self.amount {
            def.amount = amount;
        }
        if let Some(autopay) = self.autopay {
            def.autopay = autopay;
        }
        if let Some(tags) = &self.tags {
            def.tags = tags.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditRequest {
    pub definition_id: Uuid,
    pub target_date: NaiveDate,
    pub changes: DefinitionChanges,
    pub scope: EditScope,
}

/// What happened to the original definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesOutcome {
    Updated(RecurringDefinition),
    Removed(Uuid),
}

/// Result of one editor transition, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesChange {
    pub original: SeriesOutcome,
    pub created: Option<RecurringDefinition>,
}

impl SeriesChange {
    pub fn into_mutations(self, role: FlowRole) -> Vec<Mutation> {
        let mut mutations = Vec::with_capacity(2);
        match self.original {
            SeriesOutcome::Updated(definition) => {
                mutations.push(Mutation::UpsertDefinition { role, definition })
            }
            SeriesOutcome::Removed(id) => mutations.push(Mutation::DeleteDefinition { role, id }),
        }
        if let Some(definition) = self.created {
            mutations.push(Mutation::UpsertDefinition { role, definition });
        }
        mutations
    }
}

/// State transitions for recurring definitions.
pub struct SeriesEditor;

impl SeriesEditor {
    pub fn delete(def: &RecurringDefinition, scope: DeleteScope) -> Result<SeriesChange> {
        match scope {
            DeleteScope::EntireSeries => {
                info!(definition = %def.id, "deleting entire series");
                Ok(SeriesChange {
                    original: SeriesOutcome::Removed(def.id),
                    created: None,
                })
            }
            DeleteScope::ThisOccurrence(date) => {
                Self::ensure_occurrence(def, date)?;
                let mut updated = def.clone();
                updated.exceptions.insert(date);
                info!(definition = %def.id, %date, "suppressed single occurrence");
                Ok(SeriesChange {
                    original: SeriesOutcome::Updated(updated),
                    created: None,
                })
            }
        }
    }

    pub fn edit(
        def: &RecurringDefinition,
        request: &EditRequest,
        ids: &dyn IdGenerator,
    ) -> Result<SeriesChange> {
        if request.definition_id != def.id {
            return Err(LedgerError::DefinitionNotFound(request.definition_id));
        }
        request.changes.validate()?;
        Self::ensure_occurrence(def, request.target_date)?;

        match request.scope {
            EditScope::ThisOccurrence => Ok(Self::replace_occurrence(def, request, ids)),
            EditScope::ThisAndFuture => Self::split(def, request, ids),
        }
    }

    /// Rejects targets the expander would not actually produce.
    pub fn ensure_occurrence(def: &RecurringDefinition, date: NaiveDate) -> Result<()> {
        if occurs_on(def, date) {
            Ok(())
        } else {
            Err(LedgerError::MissingOccurrence {
                definition_id: def.id,
                date,
            })
        }
    }

    fn replace_occurrence(
        def: &RecurringDefinition,
        request: &EditRequest,
        ids: &dyn IdGenerator,
    ) -> SeriesChange {
        let target = request.target_date;
        let mut original = def.clone();
        original.exceptions.insert(target);

        let mut replacement = RecurringDefinition::new(
            ids.next_id(),
            def.label.clone(),
            def.amount,
            Schedule::OneOff,
            target,
        );
        replacement.autopay = def.autopay;
        replacement.tags = def.tags.clone();
        request.changes.apply_values(&mut replacement);

        info!(
            definition = %def.id,
            replacement = %replacement.id,
            date = %target,
            "replaced single occurrence"
        );
        SeriesChange {
            original: SeriesOutcome::Updated(original),
            created: Some(replacement),
        }
    }

    fn split(
        def: &RecurringDefinition,
        request: &EditRequest,
        ids: &dyn IdGenerator,
    ) -> Result<SeriesChange> {
        let target = request.target_date;
        let closing_day = target
            .pred_opt()
            .ok_or_else(|| LedgerError::InvalidDate(target.to_string()))?;

        let mut original = def.clone();
        original.end_date = Some(closing_day);

        let mut successor = def.clone();
        successor.id = ids.next_id();
        successor.start_date = target;
        successor.exceptions = def.exceptions.range(target..).copied().collect();
        if let Some(schedule) = request.changes.schedule {
            successor.schedule = schedule;
        }
        request.changes.apply_values(&mut successor);

        info!(
            definition = %def.id,
            successor = %successor.id,
            split_at = %target,
            "split series"
        );
        Ok(SeriesChange {
            original: SeriesOutcome::Updated(original),
            created: Some(successor),
        })
    }
}
