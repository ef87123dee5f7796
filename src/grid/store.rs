use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{Appointment, SlotKey};

/// Authoritative in-memory mapping of grid cell to appointment, plus the
/// single-slot clipboard. All operations are synchronous and local; the
/// store never performs I/O, which keeps grid consistency independent of
/// network latency.
#[derive(Debug, Default)]
pub struct GridStore {
    cells: HashMap<SlotKey, Appointment>,
    clipboard: Option<Appointment>,
}

impl GridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places an appointment in an empty cell. Never overwrites: an
    /// occupied target is rejected with `Occupied` before any mutation.
    pub fn place(&mut self, key: SlotKey, mut appointment: Appointment) -> Result<(), AppError> {
        if self.cells.contains_key(&key) {
            return Err(AppError::Occupied);
        }
        appointment.day = key.day;
        appointment.time_slot = key.time_slot.clone();
        self.cells.insert(key, appointment);
        Ok(())
    }

    pub fn remove(&mut self, key: &SlotKey) -> Result<Appointment, AppError> {
        self.cells.remove(key).ok_or(AppError::NotFound)
    }

    /// Relocates the appointment at `source` to `target`. Atomic with
    /// respect to the store: if the target is occupied or the source is
    /// empty, nothing changes and the appointment stays at `source`.
    pub fn move_to(&mut self, source: &SlotKey, target: &SlotKey) -> Result<(), AppError> {
        if !self.cells.contains_key(source) {
            return Err(AppError::NotFound);
        }
        if self.cells.contains_key(target) {
            return Err(AppError::Occupied);
        }
        if let Some(mut appointment) = self.cells.remove(source) {
            appointment.day = target.day;
            appointment.time_slot = target.time_slot.clone();
            self.cells.insert(target.clone(), appointment);
        }
        Ok(())
    }

    /// Snapshots the appointment at `key` into the clipboard. The grid is
    /// untouched; the clipboard holds a logical copy, not a live
    /// reference.
    pub fn copy(&mut self, key: &SlotKey) -> Result<Appointment, AppError> {
        let appointment = self.cells.get(key).cloned().ok_or(AppError::NotFound)?;
        self.clipboard = Some(appointment.clone());
        Ok(appointment)
    }

    pub fn clipboard(&self) -> Option<&Appointment> {
        self.clipboard.as_ref()
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = None;
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Appointment> {
        self.cells.get(key)
    }

    pub fn get_mut(&mut self, key: &SlotKey) -> Option<&mut Appointment> {
        self.cells.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &Appointment)> {
        self.cells.iter()
    }
}
