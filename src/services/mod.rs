pub mod persistence;
pub mod sessions;
pub mod sweeper;

pub use persistence::PersistenceAdapter;
pub use sessions::{GridSession, SessionMap};
pub use sweeper::SessionSweeper;
