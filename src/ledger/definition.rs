use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{MinorUnits, MAX_AMOUNT};
use crate::errors::LedgerError;

/// Which side of the ledger a recurring definition belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FlowRole {
    Income,
    Bill,
}

impl FlowRole {
    /// Applies the role's sign to a stored (always non-negative) amount.
    pub fn signed(self, amount: MinorUnits) -> MinorUnits {
        match self {
            FlowRole::Income => amount,
            FlowRole::Bill => amount.saturating_neg(),
        }
    }
}

impl fmt::Display for FlowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowRole::Income => f.write_str("income"),
            FlowRole::Bill => f.write_str("bill"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    OneOff,
    Weekly,
    Biweekly,
    Monthly,
    /// Reserved in the persisted model; not expanded yet.
    TwiceMonthly,
    /// Reserved in the persisted model; not expanded yet.
    Custom,
    /// Any tag this build does not know about.
    #[serde(other)]
    Unrecognized,
}

impl Schedule {
    /// Fixed step for day-based schedules.
    pub fn period_days(self) -> Option<i64> {
        match self {
            Schedule::Weekly => Some(7),
            Schedule::Biweekly => Some(14),
            _ => None,
        }
    }

    pub fn is_implemented(self) -> bool {
        matches!(
            self,
            Schedule::OneOff | Schedule::Weekly | Schedule::Biweekly | Schedule::Monthly
        )
    }

    pub fn tag(self) -> &'static str {
        match self {
            Schedule::OneOff => "oneoff",
            Schedule::Weekly => "weekly",
            Schedule::Biweekly => "biweekly",
            Schedule::Monthly => "monthly",
            Schedule::TwiceMonthly => "twicemonthly",
            Schedule::Custom => "custom",
            Schedule::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Schedule {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "oneoff" | "once" => Ok(Schedule::OneOff),
            "weekly" => Ok(Schedule::Weekly),
            "biweekly" => Ok(Schedule::Biweekly),
            "monthly" => Ok(Schedule::Monthly),
            "twicemonthly" => Ok(Schedule::TwiceMonthly),
            "custom" => Ok(Schedule::Custom),
            _ => Err(LedgerError::UnknownSchedule(raw.to_string())),
        }
    }
}

/// A recurring income source or bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringDefinition {
    pub id: Uuid,
    pub label: String,
    pub amount: MinorUnits,
    pub schedule: Schedule,
    pub start_date: NaiveDate,
    /// Exclusive: nothing on or after this date is generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub exceptions: BTreeSet<NaiveDate>,
    #[serde(default = "RecurringDefinition::default_active")]
    pub active: bool,
    #[serde(default)]
    pub autopay: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RecurringDefinition {
    pub fn new(
        id: Uuid,
        label: impl Into<String>,
        amount: MinorUnits,
        schedule: Schedule,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            amount,
            schedule,
            start_date,
            end_date: None,
            exceptions: BTreeSet::new(),
            active: true,
            autopay: false,
            tags: Vec::new(),
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_exception(mut self, date: NaiveDate) -> Self {
        self.exceptions.insert(date);
        self
    }

    pub fn is_exception(&self, date: NaiveDate) -> bool {
        self.exceptions.contains(&date)
    }

    /// Whether `candidate` lies inside the definition's lifetime bounds.
    pub fn within_bounds(&self, candidate: NaiveDate) -> bool {
        if candidate < self.start_date {
            return false;
        }
        match self.end_date {
            Some(end) => candidate < end,
            None => true,
        }
    }

    pub fn default_active() -> bool {
        true
    }
}

/// Miscellaneous spending recorded once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OneOffEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: MinorUnits,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl OneOffEntry {
    pub fn new(
        id: Uuid,
        date: NaiveDate,
        amount: MinorUnits,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            amount,
            description: description.into(),
            tags: Vec::new(),
        }
    }
}

/// Starting accumulator for projection, anchored at `date`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpeningBalance {
    pub amount: MinorUnits,
    pub date: NaiveDate,
}

impl OpeningBalance {
    pub fn new(amount: MinorUnits, date: NaiveDate) -> Self {
        Self { amount, date }
    }
}

/// Entered amounts are non-negative and no larger than [`MAX_AMOUNT`].
pub(crate) fn ensure_valid_amount(amount: MinorUnits) -> Result<MinorUnits, LedgerError> {
    if !(0..=MAX_AMOUNT).contains(&amount) {
        return Err(LedgerError::InvalidAmount(amount.to_string()));
    }
    Ok(amount)
}
