use std::str::FromStr;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use crate::grid::OperationalDays;
use crate::models::{
    ClassType, NewClassTypeRequest, OperationalHours, UpdateClassTypeRequest, Weekday,
};

pub async fn fetch_class_types(db: &SqlitePool) -> Result<Vec<ClassType>, sqlx::Error> {
    sqlx::query_as::<_, ClassType>(
        "SELECT class_type_id, name, duration_minutes, created_at \
         FROM class_types ORDER BY name",
    )
    .fetch_all(db)
    .await
}

pub async fn insert_class_type(
    db: &SqlitePool,
    req: NewClassTypeRequest,
) -> Result<ClassType, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO class_types (name, duration_minutes, created_at) VALUES (?, ?, ?)",
    )
    .bind(&req.name)
    .bind(req.duration_minutes)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(ClassType {
        class_type_id: result.last_insert_rowid(),
        name: req.name,
        duration_minutes: req.duration_minutes,
        created_at: now,
    })
}

pub async fn find_class_type_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<ClassType>, sqlx::Error> {
    sqlx::query_as::<_, ClassType>(
        "SELECT class_type_id, name, duration_minutes, created_at \
         FROM class_types WHERE class_type_id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update_class_type(
    db: &SqlitePool,
    id: i64,
    req: UpdateClassTypeRequest,
) -> Result<Option<ClassType>, sqlx::Error> {
    let mut current = match find_class_type_by_id(db, id).await? {
        Some(ct) => ct,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(duration) = req.duration_minutes {
        current.duration_minutes = duration;
    }

    sqlx::query("UPDATE class_types SET name = ?, duration_minutes = ? WHERE class_type_id = ?")
        .bind(&current.name)
        .bind(current.duration_minutes)
        .bind(id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

pub async fn delete_class_type(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM class_types WHERE class_type_id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Loads the configured operational days. Unknown day labels are skipped;
/// an empty configuration falls back to all seven days, matching the UI's
/// behavior when settings have never been saved.
pub async fn fetch_operational_days(db: &SqlitePool) -> Result<OperationalDays, sqlx::Error> {
    let rows = sqlx::query_scalar::<_, String>("SELECT day FROM operational_days")
        .fetch_all(db)
        .await?;

    if rows.is_empty() {
        return Ok(OperationalDays::all());
    }

    let mut days = Vec::new();
    for row in rows {
        match Weekday::from_str(&row) {
            Ok(day) => days.push(day),
            Err(e) => warn!("skipping stored operational day: {}", e),
        }
    }
    if days.is_empty() {
        return Ok(OperationalDays::all());
    }
    Ok(OperationalDays::from_days(days))
}

pub async fn save_operational_days(db: &SqlitePool, days: &[Weekday]) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM operational_days")
        .execute(&mut *tx)
        .await?;
    for day in days {
        sqlx::query("INSERT OR IGNORE INTO operational_days (day) VALUES (?)")
            .bind(day.as_str())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}

#[derive(sqlx::FromRow)]
struct HoursRow {
    opening_time: String,
    closing_time: String,
    slot_duration_minutes: i64,
}

pub async fn fetch_hours(db: &SqlitePool) -> Result<OperationalHours, sqlx::Error> {
    let row = sqlx::query_as::<_, HoursRow>(
        "SELECT opening_time, closing_time, slot_duration_minutes \
         FROM business_hours WHERE id = 1",
    )
    .fetch_optional(db)
    .await?;

    Ok(match row {
        Some(row) => OperationalHours {
            opening_time: row.opening_time,
            closing_time: row.closing_time,
            slot_duration_minutes: row.slot_duration_minutes,
        },
        None => OperationalHours {
            opening_time: "09:00".to_string(),
            closing_time: "17:00".to_string(),
            slot_duration_minutes: 60,
        },
    })
}

pub async fn save_hours(db: &SqlitePool, hours: &OperationalHours) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO business_hours (id, opening_time, closing_time, slot_duration_minutes) \
         VALUES (1, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
            opening_time = excluded.opening_time, \
            closing_time = excluded.closing_time, \
            slot_duration_minutes = excluded.slot_duration_minutes",
    )
    .bind(&hours.opening_time)
    .bind(&hours.closing_time)
    .bind(hours.slot_duration_minutes)
    .execute(db)
    .await?;
    Ok(())
}
