use serde::{Deserialize, Serialize};

use super::day::Weekday;

/// Opening/closing times and slot granularity for the business, as stored
/// in the settings row. Times are `HH:MM` strings at this boundary; the
/// slot catalog parses them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalHours {
    pub opening_time: String,
    pub closing_time: String,
    pub slot_duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalDaysRequest {
    pub days: Vec<Weekday>,
}
