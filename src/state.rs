use std::sync::Arc;

use sqlx::SqlitePool;

use crate::records::RecordStore;
use crate::services::SessionMap;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub records: Arc<dyn RecordStore>,
    pub sessions: Arc<SessionMap>,
}
