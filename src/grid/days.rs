use std::collections::BTreeSet;

use crate::models::Weekday;

/// The weekdays the business schedules on. Columns for absent days are
/// inert: the engine rejects placements targeting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationalDays {
    days: BTreeSet<Weekday>,
}

impl OperationalDays {
    /// All seven days, the fallback when no configuration is stored.
    pub fn all() -> Self {
        Self {
            days: Weekday::ALL.into_iter().collect(),
        }
    }

    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    pub fn is_operational(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn toggle(&mut self, day: Weekday) {
        if !self.days.remove(&day) {
            self.days.insert(day);
        }
    }

    /// Immutable ordered view for rendering.
    pub fn snapshot(&self) -> Vec<Weekday> {
        self.days.iter().copied().collect()
    }
}
