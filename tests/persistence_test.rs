use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use fitgrid::error::AppError;
use fitgrid::grid::{GridEngine, GridEvent, OperationalDays, SlotCatalog};
use fitgrid::models::{ClassType, SlotKey, SyncState, Weekday};
use fitgrid::records::RecordStore;
use fitgrid::services::{GridSession, PersistenceAdapter, SessionMap};
use parking_lot::Mutex;
use uuid::Uuid;

fn weekday_engine() -> GridEngine {
    let days = OperationalDays::from_days([
        Weekday::Mon,
        Weekday::Tues,
        Weekday::Wed,
        Weekday::Thur,
        Weekday::Fri,
    ]);
    let slots = SlotCatalog::new(
        NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"),
        60,
    );
    let class_types = vec![ClassType {
        class_type_id: 1,
        name: "Yoga".to_string(),
        duration_minutes: 60,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }];
    GridEngine::new(days, slots, class_types)
}

fn key(day: Weekday, slot: &str) -> SlotKey {
    SlotKey::new(day, slot)
}

/// Record store double with scriptable failures and call recording.
#[derive(Default)]
struct MockStore {
    fail_create: bool,
    fail_update: bool,
    fail_delete: bool,
    created: Mutex<Vec<Uuid>>,
    updated: Mutex<Vec<Uuid>>,
    deleted: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl RecordStore for MockStore {
    async fn fetch_appointments(
        &self,
    ) -> Result<Vec<fitgrid::models::Appointment>, AppError> {
        Ok(Vec::new())
    }

    async fn create_appointment(
        &self,
        _appointment: &fitgrid::models::Appointment,
    ) -> Result<Uuid, AppError> {
        if self.fail_create {
            return Err(AppError::Persistence("create rejected".to_string()));
        }
        let record_id = Uuid::new_v4();
        self.created.lock().push(record_id);
        Ok(record_id)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        _appointment: &fitgrid::models::Appointment,
    ) -> Result<(), AppError> {
        if self.fail_update {
            return Err(AppError::Persistence("update rejected".to_string()));
        }
        self.updated.lock().push(id);
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), AppError> {
        if self.fail_delete {
            return Err(AppError::Persistence("delete rejected".to_string()));
        }
        self.deleted.lock().push(id);
        Ok(())
    }
}

/// Record store whose create blocks until the test opens the gate,
/// simulating a slow in-flight request.
struct GatedStore {
    gate: tokio::sync::Notify,
    created: Mutex<Vec<Uuid>>,
    deleted: Mutex<Vec<Uuid>>,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            gate: tokio::sync::Notify::new(),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn fetch_appointments(
        &self,
    ) -> Result<Vec<fitgrid::models::Appointment>, AppError> {
        Ok(Vec::new())
    }

    async fn create_appointment(
        &self,
        _appointment: &fitgrid::models::Appointment,
    ) -> Result<Uuid, AppError> {
        self.gate.notified().await;
        let record_id = Uuid::new_v4();
        self.created.lock().push(record_id);
        Ok(record_id)
    }

    async fn update_appointment(
        &self,
        _id: Uuid,
        _appointment: &fitgrid::models::Appointment,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), AppError> {
        self.deleted.lock().push(id);
        Ok(())
    }
}

fn failure_events(rx: &mut tokio::sync::broadcast::Receiver<GridEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, GridEvent::PersistenceFailed { .. }) {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn confirmed_create_assigns_the_record_id() {
    let store = Arc::new(MockStore::default());
    let engine = Arc::new(Mutex::new(weekday_engine()));
    let adapter = PersistenceAdapter::new(store.clone(), engine.clone());

    let intent = {
        let mut engine = engine.lock();
        let (_, intent) = engine
            .add(Weekday::Mon, "9:00 AM", "Jane", 1)
            .expect("add succeeds");
        intent
    };
    adapter.process(intent).await;

    let engine = engine.lock();
    let appointment = engine.get(&key(Weekday::Mon, "9:00 AM")).expect("present");
    assert_eq!(appointment.sync, SyncState::Confirmed);
    let record_id = appointment.record_id.expect("record id assigned");
    assert_eq!(store.created.lock().as_slice(), &[record_id]);
}

#[tokio::test]
async fn failed_create_rolls_the_cell_back_to_empty() {
    let store = Arc::new(MockStore {
        fail_create: true,
        ..MockStore::default()
    });
    let engine = Arc::new(Mutex::new(weekday_engine()));
    let adapter = PersistenceAdapter::new(store, engine.clone());

    let mut events = engine.lock().subscribe();
    let intent = {
        let mut engine = engine.lock();
        let (_, intent) = engine
            .add(Weekday::Mon, "9:00 AM", "Jane", 1)
            .expect("add succeeds");
        intent
    };
    adapter.process(intent).await;

    assert!(engine.lock().get(&key(Weekday::Mon, "9:00 AM")).is_none());
    assert_eq!(failure_events(&mut events), 1);
}

#[tokio::test]
async fn failed_move_restores_the_previous_placement() {
    let store = Arc::new(MockStore {
        fail_update: true,
        ..MockStore::default()
    });
    let engine = Arc::new(Mutex::new(weekday_engine()));
    let adapter = PersistenceAdapter::new(store, engine.clone());

    let create = {
        let mut engine = engine.lock();
        let (_, intent) = engine
            .add(Weekday::Mon, "9:00 AM", "Jane", 1)
            .expect("add succeeds");
        intent
    };
    adapter.process(create).await;

    let mut events = engine.lock().subscribe();
    let update = {
        let mut engine = engine.lock();
        let (_, intent) = engine
            .drag_move(&key(Weekday::Mon, "9:00 AM"), &key(Weekday::Wed, "9:00 AM"))
            .expect("move succeeds");
        intent
    };
    adapter.process(update).await;

    let guard = engine.lock();
    let restored = guard.get(&key(Weekday::Mon, "9:00 AM")).expect("restored");
    assert_eq!(restored.staff_name, "Jane");
    assert_eq!(restored.sync, SyncState::Confirmed);
    assert!(guard.get(&key(Weekday::Wed, "9:00 AM")).is_none());
    drop(guard);
    assert_eq!(failure_events(&mut events), 1);
}

#[tokio::test]
async fn failed_delete_replaces_the_appointment() {
    let store = Arc::new(MockStore {
        fail_delete: true,
        ..MockStore::default()
    });
    let engine = Arc::new(Mutex::new(weekday_engine()));
    let adapter = PersistenceAdapter::new(store, engine.clone());

    let create = {
        let mut engine = engine.lock();
        let (_, intent) = engine
            .add(Weekday::Mon, "9:00 AM", "Jane", 1)
            .expect("add succeeds");
        intent
    };
    adapter.process(create).await;

    let mut events = engine.lock().subscribe();
    let delete = {
        let mut engine = engine.lock();
        engine
            .delete(&key(Weekday::Mon, "9:00 AM"))
            .expect("delete succeeds")
    };
    adapter.process(delete).await;

    let guard = engine.lock();
    let restored = guard.get(&key(Weekday::Mon, "9:00 AM")).expect("restored");
    assert_eq!(restored.sync, SyncState::Confirmed);
    drop(guard);
    assert_eq!(failure_events(&mut events), 1);
}

#[tokio::test]
async fn update_behind_a_failed_create_is_dropped() {
    let store = Arc::new(MockStore {
        fail_create: true,
        ..MockStore::default()
    });
    let engine = Arc::new(Mutex::new(weekday_engine()));
    let adapter = PersistenceAdapter::new(store.clone(), engine.clone());

    let (create, update) = {
        let mut engine = engine.lock();
        let (_, create) = engine
            .add(Weekday::Mon, "9:00 AM", "Jane", 1)
            .expect("add succeeds");
        let (_, update) = engine
            .edit(&key(Weekday::Mon, "9:00 AM"), Some("John"), None)
            .expect("edit succeeds");
        (create, update)
    };

    adapter.process(create).await;
    adapter.process(update).await;

    // The create was rolled back, so the dependent update never reaches
    // the store.
    assert!(store.updated.lock().is_empty());
    assert!(engine.lock().get(&key(Weekday::Mon, "9:00 AM")).is_none());
}

#[tokio::test]
async fn delete_during_in_flight_create_never_resurrects() {
    let store = Arc::new(GatedStore::new());
    let session = GridSession::new(weekday_engine(), store.clone());

    session
        .add(Weekday::Mon, "9:00 AM", "Jane", 1)
        .expect("optimistic add");
    // Delete while the create request is still held at the gate.
    session
        .delete(&key(Weekday::Mon, "9:00 AM"))
        .expect("local delete");
    assert!(session.snapshot().appointments.is_empty());

    store.gate.notify_one();

    // The create resolves, then the queued delete compensates with the
    // id the store just assigned.
    let mut compensated = Vec::new();
    for _ in 0..200 {
        compensated = store.deleted.lock().clone();
        if !compensated.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let created = store.created.lock().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(compensated, created);
    assert!(session.snapshot().appointments.is_empty());
}

#[tokio::test]
async fn delete_during_in_flight_move_never_resurrects() {
    let store = Arc::new(MockStore {
        fail_update: true,
        ..MockStore::default()
    });
    let engine = Arc::new(Mutex::new(weekday_engine()));
    let adapter = PersistenceAdapter::new(store.clone(), engine.clone());

    let create = {
        let mut engine = engine.lock();
        let (_, intent) = engine
            .add(Weekday::Mon, "9:00 AM", "Jane", 1)
            .expect("add succeeds");
        intent
    };
    adapter.process(create).await;

    // Move, then delete while the move's request is still outstanding.
    let (update, delete) = {
        let mut engine = engine.lock();
        let (_, update) = engine
            .drag_move(&key(Weekday::Mon, "9:00 AM"), &key(Weekday::Wed, "9:00 AM"))
            .expect("move succeeds");
        let delete = engine
            .delete(&key(Weekday::Wed, "9:00 AM"))
            .expect("local delete");
        (update, delete)
    };

    // The move's failure resolves first: the rollback must not put the
    // deleted appointment back.
    adapter.process(update).await;
    assert!(engine.lock().snapshot().appointments.is_empty());

    // The queued delete then removes the confirmed row.
    adapter.process(delete).await;
    let created = store.created.lock().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(store.deleted.lock().clone(), created);
    assert!(engine.lock().snapshot().appointments.is_empty());
}

#[tokio::test]
async fn sweeper_evicts_only_idle_sessions() {
    let sessions = SessionMap::new();
    let store: Arc<MockStore> = Arc::new(MockStore::default());
    sessions.insert(GridSession::new(weekday_engine(), store.clone()));
    sessions.insert(GridSession::new(weekday_engine(), store));
    assert_eq!(sessions.len(), 2);

    assert_eq!(sessions.sweep_idle(Duration::from_secs(60)), 0);
    assert_eq!(sessions.len(), 2);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sessions.sweep_idle(Duration::from_millis(1)), 2);
    assert!(sessions.is_empty());
}
