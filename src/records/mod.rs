use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Appointment, SyncState, Weekday};

/// External record store for appointment rows. The grid engine never talks
/// to it directly; the persistence adapter owns all calls and reconciles
/// the outcomes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_appointments(&self) -> Result<Vec<Appointment>, AppError>;
    /// Creates a row and returns the persistent id the store assigned.
    async fn create_appointment(&self, appointment: &Appointment) -> Result<Uuid, AppError>;
    async fn update_appointment(&self, id: Uuid, appointment: &Appointment)
        -> Result<(), AppError>;
    async fn delete_appointment(&self, id: Uuid) -> Result<(), AppError>;
}

/// Loosely-typed appointment row as it comes back from the store. Rows are
/// validated into `Appointment` at this boundary; malformed ones are
/// logged and dropped instead of leaking into the engine.
#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: String,
    staff_name: String,
    class_type_id: i64,
    class_type: String,
    day: String,
    time_slot: String,
}

impl AppointmentRow {
    fn validate(self) -> Result<Appointment, AppError> {
        let record_id = Uuid::parse_str(&self.id)
            .map_err(|_| AppError::BadRequest(format!("invalid appointment id: {}", self.id)))?;
        let day = Weekday::from_str(&self.day).map_err(AppError::BadRequest)?;
        if self.staff_name.trim().is_empty() {
            return Err(AppError::BadRequest("empty staff name".to_string()));
        }
        Ok(Appointment {
            id: Uuid::new_v4(),
            record_id: Some(record_id),
            staff_name: self.staff_name,
            class_type_id: self.class_type_id,
            class_type: self.class_type,
            day,
            time_slot: self.time_slot,
            sync: SyncState::Confirmed,
        })
    }
}

pub struct SqliteRecordStore {
    db: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            "SELECT id, staff_name, class_type_id, class_type, day, time_slot \
             FROM appointments ORDER BY day, time_slot",
        )
        .fetch_all(&self.db)
        .await?;

        let mut appointments = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.validate() {
                Ok(appointment) => appointments.push(appointment),
                Err(e) => warn!("dropping malformed appointment row {}: {}", id, e),
            }
        }
        Ok(appointments)
    }

    async fn create_appointment(&self, appointment: &Appointment) -> Result<Uuid, AppError> {
        let record_id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO appointments \
                (id, staff_name, class_type_id, class_type, day, time_slot, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record_id.to_string())
        .bind(&appointment.staff_name)
        .bind(appointment.class_type_id)
        .bind(&appointment.class_type)
        .bind(appointment.day.as_str())
        .bind(&appointment.time_slot)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;
        Ok(record_id)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        appointment: &Appointment,
    ) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE appointments \
             SET staff_name = ?, class_type_id = ?, class_type = ?, day = ?, time_slot = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&appointment.staff_name)
        .bind(appointment.class_type_id)
        .bind(&appointment.class_type)
        .bind(appointment.day.as_str())
        .bind(&appointment.time_slot)
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Persistence(format!(
                "appointment row {} no longer exists",
                id
            )));
        }
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            warn!("delete for appointment row {} matched nothing", id);
        }
        Ok(())
    }
}

/// Record store that accepts everything and stores nothing; used in
/// development and as a stand-in where persistence is irrelevant.
pub struct NoopRecordStore;

#[async_trait]
impl RecordStore for NoopRecordStore {
    async fn fetch_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        Ok(Vec::new())
    }

    async fn create_appointment(&self, _appointment: &Appointment) -> Result<Uuid, AppError> {
        Ok(Uuid::new_v4())
    }

    async fn update_appointment(
        &self,
        _id: Uuid,
        _appointment: &Appointment,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn delete_appointment(&self, _id: Uuid) -> Result<(), AppError> {
        Ok(())
    }
}
