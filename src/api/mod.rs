use axum::Json;
use axum::extract::Path;
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::grid::{GridEngine, GridSnapshot, SlotCatalog, slots::parse_hhmm};
use crate::models::*;
use crate::services::GridSession;
use crate::state::AppState;

#[derive(Deserialize)]
struct AddRequest {
    day: Weekday,
    time_slot: String,
    staff_name: String,
    class_type_id: i64,
}

#[derive(Deserialize)]
struct MoveRequest {
    from: SlotKey,
    to: SlotKey,
}

#[derive(Deserialize)]
struct EditRequest {
    day: Weekday,
    time_slot: String,
    staff_name: Option<String>,
    class_type_id: Option<i64>,
}

#[derive(Serialize)]
struct SessionCreatedResponse {
    session_id: Uuid,
    snapshot: GridSnapshot,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/class-types", get(list_class_types).post(create_class_type))
        .route(
            "/class-types/{id}",
            patch(update_class_type).delete(delete_class_type),
        )
        .route(
            "/settings/operational-days",
            get(get_operational_days).put(put_operational_days),
        )
        .route("/settings/hours", get(get_hours).put(put_hours))
        .route("/grid/sessions", post(create_session))
        .route("/grid/{sid}", get(grid_snapshot))
        .route("/grid/{sid}/add", post(grid_add))
        .route("/grid/{sid}/move", post(grid_move))
        .route("/grid/{sid}/delete", post(grid_delete))
        .route("/grid/{sid}/copy", post(grid_copy))
        .route("/grid/{sid}/paste", post(grid_paste))
        .route("/grid/{sid}/clear-clipboard", post(grid_clear_clipboard))
        .route("/grid/{sid}/edit", post(grid_edit))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

// ----- class type catalog -----

async fn list_class_types(State(state): State<AppState>) -> Result<Json<Vec<ClassType>>, AppError> {
    let class_types = repository::fetch_class_types(&state.db).await?;
    Ok(Json(class_types))
}

async fn create_class_type(
    State(state): State<AppState>,
    Json(req): Json<NewClassTypeRequest>,
) -> Result<Json<ClassType>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("class type name is required".to_string()));
    }
    if req.duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "class type duration must be positive".to_string(),
        ));
    }
    let class_type = repository::insert_class_type(&state.db, req).await?;
    Ok(Json(class_type))
}

async fn update_class_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateClassTypeRequest>,
) -> Result<Json<ClassType>, AppError> {
    if matches!(req.duration_minutes, Some(d) if d <= 0) {
        return Err(AppError::BadRequest(
            "class type duration must be positive".to_string(),
        ));
    }
    let class_type = repository::update_class_type(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(class_type))
}

async fn delete_class_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let ok = repository::delete_class_type(&state.db, id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

// ----- schedule settings -----

async fn get_operational_days(
    State(state): State<AppState>,
) -> Result<Json<Vec<Weekday>>, AppError> {
    let days = repository::fetch_operational_days(&state.db).await?;
    Ok(Json(days.snapshot()))
}

async fn put_operational_days(
    State(state): State<AppState>,
    Json(req): Json<OperationalDaysRequest>,
) -> Result<StatusCode, AppError> {
    repository::save_operational_days(&state.db, &req.days).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_hours(State(state): State<AppState>) -> Result<Json<OperationalHours>, AppError> {
    let hours = repository::fetch_hours(&state.db).await?;
    Ok(Json(hours))
}

async fn put_hours(
    State(state): State<AppState>,
    Json(req): Json<OperationalHours>,
) -> Result<StatusCode, AppError> {
    parse_hhmm(&req.opening_time)?;
    parse_hhmm(&req.closing_time)?;
    if req.slot_duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "slot duration must be positive".to_string(),
        ));
    }
    repository::save_hours(&state.db, &req).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- grid sessions -----

/// Builds a session grid from the current settings and the record store's
/// confirmed appointments. Settings changes only affect sessions created
/// afterwards.
async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    let hours = repository::fetch_hours(&state.db).await?;
    let slots = SlotCatalog::from_hours(&hours)?;
    let days = repository::fetch_operational_days(&state.db).await?;
    let class_types = repository::fetch_class_types(&state.db).await?;

    let mut engine = GridEngine::new(days, slots, class_types);
    engine.load(state.records.fetch_appointments().await?);

    let session = GridSession::new(engine, state.records.clone());
    let snapshot = session.snapshot();
    let session_id = state.sessions.insert(session);
    info!("created grid session {}", session_id);

    Ok(Json(SessionCreatedResponse {
        session_id,
        snapshot,
    }))
}

fn session_for(state: &AppState, sid: &Uuid) -> Result<std::sync::Arc<GridSession>, AppError> {
    state.sessions.get(sid).ok_or(AppError::NotFound)
}

async fn grid_snapshot(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<GridSnapshot>, AppError> {
    let session = session_for(&state, &sid)?;
    Ok(Json(session.snapshot()))
}

async fn grid_add(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(req): Json<AddRequest>,
) -> Result<Json<Appointment>, AppError> {
    let session = session_for(&state, &sid)?;
    let appointment = session.add(req.day, &req.time_slot, &req.staff_name, req.class_type_id)?;
    Ok(Json(appointment))
}

async fn grid_move(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Appointment>, AppError> {
    let session = session_for(&state, &sid)?;
    let appointment = session.drag_move(&req.from, &req.to)?;
    Ok(Json(appointment))
}

async fn grid_delete(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(key): Json<SlotKey>,
) -> Result<StatusCode, AppError> {
    let session = session_for(&state, &sid)?;
    session.delete(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn grid_copy(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(key): Json<SlotKey>,
) -> Result<Json<Appointment>, AppError> {
    let session = session_for(&state, &sid)?;
    let appointment = session.copy(&key)?;
    Ok(Json(appointment))
}

async fn grid_paste(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(key): Json<SlotKey>,
) -> Result<Json<Appointment>, AppError> {
    let session = session_for(&state, &sid)?;
    let appointment = session.paste(&key)?;
    Ok(Json(appointment))
}

async fn grid_clear_clipboard(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = session_for(&state, &sid)?;
    session.clear_clipboard();
    Ok(StatusCode::NO_CONTENT)
}

async fn grid_edit(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(req): Json<EditRequest>,
) -> Result<Json<Appointment>, AppError> {
    let session = session_for(&state, &sid)?;
    let key = SlotKey::new(req.day, req.time_slot);
    let appointment = session.edit(&key, req.staff_name.as_deref(), req.class_type_id)?;
    Ok(Json(appointment))
}
