use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::grid::{GridEngine, GridEvent, GridSnapshot};
use crate::models::{Appointment, SlotKey, Weekday};
use crate::records::RecordStore;

/// One interactive grid: the engine plus its persistence adapter. Every
/// browser session gets its own; sessions share nothing but the record
/// store.
pub struct GridSession {
    engine: Arc<Mutex<GridEngine>>,
    adapter: Arc<super::persistence::PersistenceAdapter>,
    last_used: Mutex<Instant>,
}

impl GridSession {
    pub fn new(engine: GridEngine, records: Arc<dyn RecordStore>) -> Arc<Self> {
        let engine = Arc::new(Mutex::new(engine));
        let adapter = super::persistence::PersistenceAdapter::new(records, Arc::clone(&engine));
        Arc::new(Self {
            engine,
            adapter,
            last_used: Mutex::new(Instant::now()),
        })
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.touch();
        self.engine.lock().snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<GridEvent> {
        self.engine.lock().subscribe()
    }

    pub fn add(
        &self,
        day: Weekday,
        time_slot: &str,
        staff_name: &str,
        class_type_id: i64,
    ) -> Result<Appointment, AppError> {
        self.touch();
        let mut engine = self.engine.lock();
        let (appointment, intent) = engine.add(day, time_slot, staff_name, class_type_id)?;
        // Dispatched under the engine lock so queue order matches commit
        // order.
        self.adapter.dispatch(intent);
        Ok(appointment)
    }

    pub fn delete(&self, key: &SlotKey) -> Result<(), AppError> {
        self.touch();
        let mut engine = self.engine.lock();
        let intent = engine.delete(key)?;
        self.adapter.dispatch(intent);
        Ok(())
    }

    pub fn drag_move(&self, source: &SlotKey, target: &SlotKey) -> Result<Appointment, AppError> {
        self.touch();
        let mut engine = self.engine.lock();
        let (appointment, intent) = engine.drag_move(source, target)?;
        self.adapter.dispatch(intent);
        Ok(appointment)
    }

    pub fn copy(&self, key: &SlotKey) -> Result<Appointment, AppError> {
        self.touch();
        self.engine.lock().copy(key)
    }

    pub fn paste(&self, target: &SlotKey) -> Result<Appointment, AppError> {
        self.touch();
        let mut engine = self.engine.lock();
        let (appointment, intent) = engine.paste(target)?;
        self.adapter.dispatch(intent);
        Ok(appointment)
    }

    pub fn clear_clipboard(&self) {
        self.touch();
        self.engine.lock().clear_clipboard();
    }

    pub fn edit(
        &self,
        key: &SlotKey,
        staff_name: Option<&str>,
        class_type_id: Option<i64>,
    ) -> Result<Appointment, AppError> {
        self.touch();
        let mut engine = self.engine.lock();
        let (appointment, intent) = engine.edit(key, staff_name, class_type_id)?;
        self.adapter.dispatch(intent);
        Ok(appointment)
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.lock().elapsed()
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }
}

/// Registry of live grid sessions, keyed by session id.
#[derive(Default)]
pub struct SessionMap {
    sessions: Mutex<HashMap<Uuid, Arc<GridSession>>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Arc<GridSession>) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().insert(id, session);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<GridSession>> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Drops sessions idle longer than `ttl`; returns how many were
    /// evicted.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.idle_for() < ttl;
            if !keep {
                info!("evicting idle grid session {}", id);
            }
            keep
        });
        before - sessions.len()
    }
}
