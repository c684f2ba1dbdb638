//! Recurring definitions, expansion, timeline projection, and series editing.

pub mod dates;
pub mod definition;
pub mod money;
pub mod recurring;
pub mod series;
pub mod state;
pub mod timeline;

pub use dates::{format_iso_date, parse_iso_date, DateWindow};
pub use definition::{FlowRole, OneOffEntry, OpeningBalance, RecurringDefinition, Schedule};
pub use money::{format_minor_units, parse_amount, parse_signed_amount, MinorUnits, MAX_AMOUNT};
pub use recurring::{expand, next_occurrence, occurs_on};
pub use series::{
    DefinitionChanges, DeleteRequest, DeleteScope, EditRequest, EditScope, SeriesChange,
    SeriesEditor, SeriesOutcome,
};
pub use state::{Action, BudgetState, Mutation};
pub use timeline::{events_on, project, EventKind, Timeline, TimelineRow, TimelineTotals};
