//! Recurrence expansion: turns a definition into the concrete dates it occurs on.
//!
//! Expansion is stateless and total. Every caller gets the same bounds and
//! exception handling, so suppressed dates never leak into a timeline through
//! a side path.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::dates::{add_months, months_between, periods_to_reach, DateWindow};
use super::definition::{RecurringDefinition, Schedule};

/// Horizon used when searching for the next occurrence of an open series.
const NEXT_OCCURRENCE_LOOKAHEAD_DAYS: i64 = 366 * 2;

/// Returns every date in `window` (inclusive) on which `def` occurs, ascending.
pub fn expand(def: &RecurringDefinition, window: DateWindow) -> Vec<NaiveDate> {
    if !def.active || def.start_date > window.end {
        return Vec::new();
    }
    if def.end_date.is_some_and(|end| end <= window.start) {
        return Vec::new();
    }

    let candidates = match def.schedule {
        Schedule::OneOff => expand_one_off(def, window),
        Schedule::Weekly | Schedule::Biweekly => match def.schedule.period_days() {
            Some(period) => expand_fixed_period(def, window, period),
            None => Vec::new(),
        },
        Schedule::Monthly => expand_monthly(def, window),
        Schedule::TwiceMonthly | Schedule::Custom | Schedule::Unrecognized => {
            debug!(
                definition = %def.id,
                schedule = %def.schedule,
                "schedule kind not expanded"
            );
            Vec::new()
        }
    };

    candidates
        .into_iter()
        .filter(|date| !def.is_exception(*date))
        .collect()
}

/// Whether `def` produces an occurrence exactly on `date`.
pub fn occurs_on(def: &RecurringDefinition, date: NaiveDate) -> bool {
    !expand(def, DateWindow::single_day(date)).is_empty()
}

/// First occurrence on or after `from`, looking ahead a bounded horizon.
pub fn next_occurrence(def: &RecurringDefinition, from: NaiveDate) -> Option<NaiveDate> {
    let end = from + Duration::days(NEXT_OCCURRENCE_LOOKAHEAD_DAYS);
    expand(def, DateWindow { start: from, end }).into_iter().next()
}

fn expand_one_off(def: &RecurringDefinition, window: DateWindow) -> Vec<NaiveDate> {
    if window.contains(def.start_date) && def.within_bounds(def.start_date) {
        vec![def.start_date]
    } else {
        Vec::new()
    }
}

fn expand_fixed_period(
    def: &RecurringDefinition,
    window: DateWindow,
    period_days: i64,
) -> Vec<NaiveDate> {
    let mut result = Vec::new();
    let step = Duration::days(period_days);
    let skipped = periods_to_reach(def.start_date, window.start, period_days);
    let mut candidate = def.start_date + Duration::days(skipped * period_days);

    while candidate <= window.end && def.within_bounds(candidate) {
        result.push(candidate);
        candidate += step;
    }
    result
}

fn expand_monthly(def: &RecurringDefinition, window: DateWindow) -> Vec<NaiveDate> {
    let mut result = Vec::new();
    // Candidates are always offsets from the original start so a clamped
    // February never drags later months down to the 28th.
    let mut index = months_between(def.start_date, window.start).max(0);

    loop {
        let Ok(offset) = u32::try_from(index) else {
            break;
        };
        let Some(candidate) = add_months(def.start_date, offset) else {
            break;
        };
        if candidate > window.end || !def.within_bounds(candidate) {
            break;
        }
        if candidate >= window.start {
            result.push(candidate);
        }
        index += 1;
    }
    result
}
