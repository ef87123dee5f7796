pub mod appointment;
pub mod class_type;
pub mod day;
pub mod settings;

pub use appointment::{Appointment, SlotKey, SyncState};
pub use class_type::{ClassType, NewClassTypeRequest, UpdateClassTypeRequest};
pub use day::Weekday;
pub use settings::{OperationalDaysRequest, OperationalHours};
