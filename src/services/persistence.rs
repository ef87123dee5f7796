use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::grid::{GridEngine, Intent};
use crate::records::RecordStore;

/// Translates grid intents into record-store calls and reconciles the
/// outcomes back into the grid.
///
/// Intents for the same appointment run strictly in issue order through a
/// per-appointment queue; independent appointments persist concurrently.
/// A failed call rolls the optimistic grid change back, so the grid never
/// ends up in a state the user would read as "half applied".
pub struct PersistenceAdapter {
    records: Arc<dyn RecordStore>,
    engine: Arc<Mutex<GridEngine>>,
    queues: Mutex<HashMap<Uuid, mpsc::UnboundedSender<Intent>>>,
    /// Local id -> record id, learned from confirmed creates. Lets a
    /// delete queued behind an in-flight create compensate once the
    /// create resolves.
    record_ids: Mutex<HashMap<Uuid, Uuid>>,
}

impl PersistenceAdapter {
    pub fn new(records: Arc<dyn RecordStore>, engine: Arc<Mutex<GridEngine>>) -> Arc<Self> {
        Arc::new(Self {
            records,
            engine,
            queues: Mutex::new(HashMap::new()),
            record_ids: Mutex::new(HashMap::new()),
        })
    }

    /// Enqueues an intent on its appointment's queue. Called while the
    /// session still holds the engine lock, so queue order matches commit
    /// order.
    pub fn dispatch(self: &Arc<Self>, intent: Intent) {
        let id = intent.appointment_id();
        let mut queues = self.queues.lock();
        let sender = queues.entry(id).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let adapter = Arc::clone(self);
            tokio::spawn(async move { adapter.run_queue(rx).await });
            tx
        });
        if sender.send(intent).is_err() {
            warn!("persistence queue for appointment {} is closed", id);
        }
    }

    async fn run_queue(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Intent>) {
        while let Some(intent) = rx.recv().await {
            self.process(intent).await;
        }
    }

    /// Applies one intent against the record store. `dispatch` feeds this
    /// from the per-appointment queue; tests call it directly.
    pub async fn process(&self, intent: Intent) {
        match intent {
            Intent::Created { appointment } => {
                match self.records.create_appointment(&appointment).await {
                    Ok(record_id) => {
                        self.record_ids.lock().insert(appointment.id, record_id);
                        let applied = self.engine.lock().confirm_create(appointment.id, record_id);
                        if !applied {
                            // Deleted locally while the create was in
                            // flight; the queued delete compensates using
                            // the id recorded above.
                            info!(
                                "create for appointment {} resolved after local delete",
                                appointment.id
                            );
                        }
                    }
                    Err(e) => {
                        warn!("create failed for appointment {}: {}", appointment.id, e);
                        self.engine
                            .lock()
                            .fail_create(appointment.id, &e.to_string());
                    }
                }
            }
            Intent::Updated {
                appointment,
                previous,
            } => {
                let Some(record_id) = self.record_id_for(&appointment.id, appointment.record_id)
                else {
                    // The create this update depends on failed and was
                    // rolled back; there is nothing to update.
                    warn!(
                        "dropping update for appointment {}: create never confirmed",
                        appointment.id
                    );
                    return;
                };
                match self.records.update_appointment(record_id, &appointment).await {
                    Ok(()) => self.engine.lock().confirm_update(appointment.id),
                    Err(e) => {
                        warn!("update failed for appointment {}: {}", appointment.id, e);
                        self.engine
                            .lock()
                            .fail_update(appointment.id, previous, &e.to_string());
                    }
                }
            }
            Intent::Deleted { appointment } => {
                let Some(record_id) = self.record_id_for(&appointment.id, appointment.record_id)
                else {
                    // Never confirmed by the store, so there is no row to
                    // delete.
                    self.forget(appointment.id);
                    return;
                };
                match self.records.delete_appointment(record_id).await {
                    Ok(()) => self.forget(appointment.id),
                    Err(e) => {
                        warn!("delete failed for appointment {}: {}", appointment.id, e);
                        self.engine.lock().fail_delete(appointment, &e.to_string());
                    }
                }
            }
        }
    }

    fn record_id_for(&self, id: &Uuid, from_intent: Option<Uuid>) -> Option<Uuid> {
        from_intent.or_else(|| self.record_ids.lock().get(id).copied())
    }

    fn forget(&self, id: Uuid) {
        self.record_ids.lock().remove(&id);
        self.queues.lock().remove(&id);
    }
}
