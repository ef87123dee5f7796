use chrono::NaiveTime;

use crate::error::AppError;
use crate::models::OperationalHours;

/// Ordered catalog of bookable time-slot labels for one day. All days of a
/// week share the same catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCatalog {
    labels: Vec<String>,
}

impl SlotCatalog {
    /// Builds the catalog by fixed-duration strides from the opening time.
    /// A slot is included only if it ends at or before closing, so a final
    /// partial slot is dropped. An inverted or empty interval yields an
    /// empty catalog; an unconfigured day is valid and renders without
    /// slots.
    pub fn new(opening: NaiveTime, closing: NaiveTime, slot_minutes: i64) -> Self {
        let mut labels = Vec::new();
        if slot_minutes > 0 {
            let opening_min = opening.signed_duration_since(midnight()).num_minutes();
            let closing_min = closing.signed_duration_since(midnight()).num_minutes();
            let mut cursor = opening_min;
            while cursor + slot_minutes <= closing_min {
                labels.push(label_for(cursor));
                cursor += slot_minutes;
            }
        }
        Self { labels }
    }

    pub fn from_hours(hours: &OperationalHours) -> Result<Self, AppError> {
        let opening = parse_hhmm(&hours.opening_time)?;
        let closing = parse_hhmm(&hours.closing_time)?;
        Ok(Self::new(opening, closing, hours.slot_duration_minutes))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Row index of a label within the catalog, used to order snapshots.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::BadRequest(format!("invalid time of day: {}", value)))
}

fn midnight() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()
}

fn label_for(minutes_from_midnight: i64) -> String {
    let hour24 = (minutes_from_midnight / 60) % 24;
    let minute = minutes_from_midnight % 60;
    let meridiem = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, minute, meridiem)
}
