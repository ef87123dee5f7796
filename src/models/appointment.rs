use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::day::Weekday;

/// Identifies one grid cell: a weekday column and a time-slot row label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: Weekday,
    pub time_slot: String,
}

impl SlotKey {
    pub fn new(day: Weekday, time_slot: impl Into<String>) -> Self {
        Self {
            day,
            time_slot: time_slot.into(),
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.day, self.time_slot)
    }
}

/// Persistence lifecycle of an appointment within a grid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Created locally, create request not yet confirmed.
    Pending,
    /// A move/edit was issued and its ack is outstanding.
    InFlight,
    /// Record store and grid agree.
    Confirmed,
    /// Deleted locally while a request was still outstanding; late
    /// responses for it must not be applied.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Session-local identity, assigned at add time and stable thereafter.
    pub id: Uuid,
    /// Identity in the record store, assigned on first confirmed create.
    pub record_id: Option<Uuid>,
    pub staff_name: String,
    pub class_type_id: i64,
    pub class_type: String,
    pub day: Weekday,
    pub time_slot: String,
    pub sync: SyncState,
}

impl Appointment {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.day, self.time_slot.clone())
    }
}
