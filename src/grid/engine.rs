use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Appointment, ClassType, SlotKey, SyncState, Weekday};

use super::days::OperationalDays;
use super::slots::SlotCatalog;
use super::store::GridStore;

/// Persistence instruction emitted by a committed engine operation and
/// consumed by the persistence adapter. Snapshots are clones; the adapter
/// never holds live references into the grid.
#[derive(Debug, Clone)]
pub enum Intent {
    Created {
        appointment: Appointment,
    },
    Updated {
        appointment: Appointment,
        /// Pre-mutation snapshot, used to roll the grid back on failure.
        previous: Appointment,
    },
    Deleted {
        appointment: Appointment,
    },
}

impl Intent {
    /// Session-local id of the appointment this intent targets. The
    /// adapter serializes intents per appointment on this id.
    pub fn appointment_id(&self) -> Uuid {
        match self {
            Intent::Created { appointment }
            | Intent::Updated { appointment, .. }
            | Intent::Deleted { appointment } => appointment.id,
        }
    }
}

/// Notification fired after each committed mutation, optimistic or
/// reconciled.
#[derive(Debug, Clone)]
pub enum GridEvent {
    Changed { keys: Vec<SlotKey> },
    PersistenceFailed { key: SlotKey, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    pub operational_days: Vec<Weekday>,
    pub time_slots: Vec<String>,
    pub appointments: Vec<Appointment>,
}

/// Orchestrates add/move/delete/copy/paste/edit against the appointment
/// store. All mutations for one session run under the session lock, so no
/// two operations interleave below this level; concurrency only exists at
/// the persistence boundary.
pub struct GridEngine {
    store: GridStore,
    days: OperationalDays,
    slots: SlotCatalog,
    class_types: Vec<ClassType>,
    events: broadcast::Sender<GridEvent>,
}

impl GridEngine {
    pub fn new(days: OperationalDays, slots: SlotCatalog, class_types: Vec<ClassType>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store: GridStore::new(),
            days,
            slots,
            class_types,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.events.subscribe()
    }

    /// Seeds the grid from confirmed record-store rows. Rows outside the
    /// current domain or colliding with an already-seeded cell are logged
    /// and skipped rather than allowed to break the grid invariant.
    pub fn load(&mut self, appointments: Vec<Appointment>) {
        for appointment in appointments {
            let key = appointment.key();
            if self.validate_placement(&key).is_err() {
                warn!("skipping appointment outside schedule domain: {}", key);
                continue;
            }
            if let Err(e) = self.store.place(key.clone(), appointment) {
                warn!("skipping appointment at {}: {}", key, e);
            }
        }
    }

    pub fn add(
        &mut self,
        day: Weekday,
        time_slot: &str,
        staff_name: &str,
        class_type_id: i64,
    ) -> Result<(Appointment, Intent), AppError> {
        let class_type = self.resolve_class_type(class_type_id)?;
        let key = SlotKey::new(day, time_slot);
        self.validate_placement(&key)?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            record_id: None,
            staff_name: staff_name.to_string(),
            class_type_id: class_type.class_type_id,
            class_type: class_type.name.clone(),
            day,
            time_slot: time_slot.to_string(),
            sync: SyncState::Pending,
        };
        self.store.place(key.clone(), appointment.clone())?;
        self.changed(vec![key]);
        Ok((
            appointment.clone(),
            Intent::Created { appointment },
        ))
    }

    pub fn delete(&mut self, key: &SlotKey) -> Result<Intent, AppError> {
        let mut appointment = self.store.remove(key)?;
        appointment.sync = SyncState::Cancelled;
        self.changed(vec![key.clone()]);
        Ok(Intent::Deleted { appointment })
    }

    pub fn drag_move(
        &mut self,
        source: &SlotKey,
        target: &SlotKey,
    ) -> Result<(Appointment, Intent), AppError> {
        let previous = self.store.get(source).cloned().ok_or(AppError::NotFound)?;
        self.validate_placement(target)?;
        self.store.move_to(source, target)?;
        let appointment = {
            let moved = self.store.get_mut(target).ok_or(AppError::NotFound)?;
            moved.sync = SyncState::InFlight;
            moved.clone()
        };
        self.changed(vec![source.clone(), target.clone()]);
        Ok((
            appointment.clone(),
            Intent::Updated {
                appointment,
                previous,
            },
        ))
    }

    pub fn copy(&mut self, key: &SlotKey) -> Result<Appointment, AppError> {
        self.store.copy(key)
    }

    /// Re-adds the clipboard snapshot at `target` as a brand new
    /// appointment. The clipboard is kept so one copied template can be
    /// pasted into several cells.
    pub fn paste(&mut self, target: &SlotKey) -> Result<(Appointment, Intent), AppError> {
        let source = self.store.clipboard().cloned().ok_or(AppError::NotFound)?;
        self.add(
            target.day,
            &target.time_slot,
            &source.staff_name,
            source.class_type_id,
        )
    }

    pub fn clear_clipboard(&mut self) {
        self.store.clear_clipboard();
    }

    pub fn edit(
        &mut self,
        key: &SlotKey,
        staff_name: Option<&str>,
        class_type_id: Option<i64>,
    ) -> Result<(Appointment, Intent), AppError> {
        let class_type = match class_type_id {
            Some(id) => Some(self.resolve_class_type(id)?.clone()),
            None => None,
        };
        let previous = self.store.get(key).cloned().ok_or(AppError::NotFound)?;
        let appointment = {
            let current = self.store.get_mut(key).ok_or(AppError::NotFound)?;
            if let Some(staff) = staff_name {
                current.staff_name = staff.to_string();
            }
            if let Some(class_type) = class_type {
                current.class_type_id = class_type.class_type_id;
                current.class_type = class_type.name;
            }
            current.sync = SyncState::InFlight;
            current.clone()
        };
        self.changed(vec![key.clone()]);
        Ok((
            appointment.clone(),
            Intent::Updated {
                appointment,
                previous,
            },
        ))
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let mut appointments: Vec<Appointment> =
            self.store.iter().map(|(_, a)| a.clone()).collect();
        appointments.sort_by_key(|a| {
            (
                a.day,
                self.slots.position(&a.time_slot).unwrap_or(usize::MAX),
            )
        });
        GridSnapshot {
            operational_days: self.days.snapshot(),
            time_slots: self.slots.labels().to_vec(),
            appointments,
        }
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Appointment> {
        self.store.get(key)
    }

    // ----- reconciliation, called only by the persistence adapter -----

    /// Applies a confirmed create. Returns false when the appointment was
    /// deleted while the create was in flight; the adapter must then
    /// compensate instead of resurrecting it.
    pub fn confirm_create(&mut self, id: Uuid, record_id: Uuid) -> bool {
        let Some(key) = self.key_of(id) else {
            return false;
        };
        if let Some(appointment) = self.store.get_mut(&key) {
            appointment.record_id = Some(record_id);
            appointment.sync = SyncState::Confirmed;
        }
        self.changed(vec![key]);
        true
    }

    pub fn confirm_update(&mut self, id: Uuid) {
        let Some(key) = self.key_of(id) else {
            return;
        };
        if let Some(appointment) = self.store.get_mut(&key) {
            appointment.sync = SyncState::Confirmed;
        }
        self.changed(vec![key]);
    }

    /// Rolls back an optimistic add whose create failed: the cell returns
    /// to empty.
    pub fn fail_create(&mut self, id: Uuid, message: &str) {
        if let Some(key) = self.key_of(id) {
            let _ = self.store.remove(&key);
            self.failed(key, message);
        }
    }

    /// Rolls back a failed move/edit by restoring the pre-mutation
    /// snapshot at its original placement. If the appointment was deleted
    /// locally while the update was in flight there is nothing to
    /// restore; the outcome is discarded and the queued delete
    /// compensates.
    pub fn fail_update(&mut self, id: Uuid, previous: Appointment, message: &str) {
        let Some(key) = self.key_of(id) else {
            warn!("discarding failed update for deleted appointment {}", id);
            return;
        };
        let _ = self.store.remove(&key);
        let restore_key = previous.key();
        let mut restored = previous;
        restored.sync = SyncState::Confirmed;
        if let Err(e) = self.store.place(restore_key.clone(), restored) {
            warn!("cannot restore appointment at {}: {}", restore_key, e);
        }
        self.failed(restore_key, message);
    }

    /// Rolls back a failed delete by re-placing the removed appointment.
    pub fn fail_delete(&mut self, appointment: Appointment, message: &str) {
        let key = appointment.key();
        let mut restored = appointment;
        restored.sync = SyncState::Confirmed;
        if let Err(e) = self.store.place(key.clone(), restored) {
            warn!("cannot restore deleted appointment at {}: {}", key, e);
        }
        self.failed(key, message);
    }

    // ----- internals -----

    fn resolve_class_type(&self, class_type_id: i64) -> Result<&ClassType, AppError> {
        if self.class_types.is_empty() {
            return Err(AppError::CatalogUnavailable);
        }
        self.class_types
            .iter()
            .find(|ct| ct.class_type_id == class_type_id)
            .ok_or(AppError::NotFound)
    }

    fn validate_placement(&self, key: &SlotKey) -> Result<(), AppError> {
        if !self.days.is_operational(key.day) {
            return Err(AppError::InvalidPlacement(format!(
                "{} is not an operational day",
                key.day
            )));
        }
        if !self.slots.contains(&key.time_slot) {
            return Err(AppError::InvalidPlacement(format!(
                "{} is not a bookable time slot",
                key.time_slot
            )));
        }
        Ok(())
    }

    fn key_of(&self, id: Uuid) -> Option<SlotKey> {
        self.store
            .iter()
            .find(|(_, a)| a.id == id)
            .map(|(key, _)| key.clone())
    }

    fn changed(&self, keys: Vec<SlotKey>) {
        let _ = self.events.send(GridEvent::Changed { keys });
    }

    fn failed(&self, key: SlotKey, message: &str) {
        let _ = self.events.send(GridEvent::PersistenceFailed {
            key,
            message: message.to_string(),
        });
    }
}
