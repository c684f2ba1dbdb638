//! Timeline projection: merges expanded occurrences with one-off spending and
//! folds them into a running balance.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::dates::DateWindow;
use super::definition::{FlowRole, OneOffEntry, OpeningBalance, RecurringDefinition};
use super::money::MinorUnits;
use super::recurring::expand;

/// Event category. Declaration order is the same-day posting order: income
/// lands before outflows so a payday never shows a transient shortfall.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Income,
    Bill,
    Misc,
}

impl From<FlowRole> for EventKind {
    fn from(role: FlowRole) -> Self {
        match role {
            FlowRole::Income => EventKind::Income,
            FlowRole::Bill => EventKind::Bill,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Income => "income",
            EventKind::Bill => "bill",
            EventKind::Misc => "misc",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineRow {
    pub date: NaiveDate,
    pub kind: EventKind,
    pub label: String,
    /// Definition or one-off entry that produced the row.
    pub source_id: Uuid,
    pub delta: MinorUnits,
    /// Balance after applying `delta`.
    pub running_balance: MinorUnits,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineTotals {
    pub events: usize,
    pub inflow: MinorUnits,
    pub outflow: MinorUnits,
    pub net: MinorUnits,
}

impl TimelineTotals {
    fn from_rows(rows: &[TimelineRow]) -> Self {
        let mut totals = TimelineTotals {
            events: rows.len(),
            ..TimelineTotals::default()
        };
        for row in rows {
            if row.delta >= 0 {
                totals.inflow = totals.inflow.saturating_add(row.delta);
            } else {
                totals.outflow = totals.outflow.saturating_sub(row.delta);
            }
        }
        totals.net = totals.inflow.saturating_sub(totals.outflow);
        totals
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timeline {
    pub window: DateWindow,
    pub opening: OpeningBalance,
    /// Balance entering the window: the opening amount plus everything dated
    /// between the opening date and the window start.
    pub starting_balance: MinorUnits,
    pub rows: Vec<TimelineRow>,
    pub final_balance: MinorUnits,
    pub totals: TimelineTotals,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row at which the balance reaches its minimum.
    pub fn lowest_balance(&self) -> Option<&TimelineRow> {
        self.rows.iter().reduce(|lowest, row| {
            if row.running_balance < lowest.running_balance {
                row
            } else {
                lowest
            }
        })
    }

    pub fn rows_on(&self, date: NaiveDate) -> impl Iterator<Item = &TimelineRow> {
        self.rows.iter().filter(move |row| row.date == date)
    }
}

struct PendingEvent<'a> {
    date: NaiveDate,
    kind: EventKind,
    label: &'a str,
    source_id: Uuid,
    delta: MinorUnits,
}

/// Projects every event inside `window` and the running balance after each.
///
/// Nothing dated before `opening.date` is ever counted. Same inputs always
/// produce the same timeline. Balances saturate at the `i64` bounds instead of
/// overflowing; entered amounts are capped well below that.
pub fn project(
    opening: &OpeningBalance,
    incomes: &[RecurringDefinition],
    bills: &[RecurringDefinition],
    one_offs: &[OneOffEntry],
    window: DateWindow,
) -> Timeline {
    let carry_in = window
        .start
        .checked_sub_signed(Duration::days(1))
        .filter(|last_day| *last_day >= opening.date)
        .map(|last_day| {
            let span = DateWindow {
                start: opening.date,
                end: last_day,
            };
            collect_events(incomes, bills, one_offs, span)
                .iter()
                .fold(0, |sum: MinorUnits, event| sum.saturating_add(event.delta))
        })
        .unwrap_or(0);
    let starting_balance = opening.amount.saturating_add(carry_in);

    let events = match window.clamp_start(opening.date) {
        Some(visible) => collect_events(incomes, bills, one_offs, visible),
        None => Vec::new(),
    };

    let mut balance = starting_balance;
    let rows: Vec<TimelineRow> = events
        .into_iter()
        .map(|event| {
            balance = balance.saturating_add(event.delta);
            TimelineRow {
                date: event.date,
                kind: event.kind,
                label: event.label.to_string(),
                source_id: event.source_id,
                delta: event.delta,
                running_balance: balance,
            }
        })
        .collect();

    debug!(
        start = %window.start,
        end = %window.end,
        rows = rows.len(),
        carry_in,
        "projected timeline"
    );

    Timeline {
        window,
        opening: *opening,
        starting_balance,
        totals: TimelineTotals::from_rows(&rows),
        final_balance: balance,
        rows,
    }
}

/// Rows for a single calendar day, with balances that account for everything
/// since the opening date.
pub fn events_on(
    opening: &OpeningBalance,
    incomes: &[RecurringDefinition],
    bills: &[RecurringDefinition],
    one_offs: &[OneOffEntry],
    date: NaiveDate,
) -> Vec<TimelineRow> {
    project(opening, incomes, bills, one_offs, DateWindow::single_day(date)).rows
}

fn collect_events<'a>(
    incomes: &'a [RecurringDefinition],
    bills: &'a [RecurringDefinition],
    one_offs: &'a [OneOffEntry],
    window: DateWindow,
) -> Vec<PendingEvent<'a>> {
    let mut events = Vec::new();
    for (role, defs) in [(FlowRole::Income, incomes), (FlowRole::Bill, bills)] {
        for def in defs {
            events.extend(expand(def, window).into_iter().map(move |date| PendingEvent {
                date,
                kind: role.into(),
                label: &def.label,
                source_id: def.id,
                delta: role.signed(def.amount),
            }));
        }
    }
    events.extend(
        one_offs
            .iter()
            .filter(|entry| window.contains(entry.date))
            .map(|entry| PendingEvent {
                date: entry.date,
                kind: EventKind::Misc,
                label: &entry.description,
                source_id: entry.id,
                delta: entry.amount.saturating_neg(),
            }),
    );
    // Stable: same-date, same-kind events keep input order.
    events.sort_by_key(|event| (event.date, event.kind));
    events
}
