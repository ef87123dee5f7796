pub mod days;
pub mod engine;
pub mod slots;
pub mod store;

pub use days::OperationalDays;
pub use engine::{GridEngine, GridEvent, GridSnapshot, Intent};
pub use slots::SlotCatalog;
pub use store::GridStore;
