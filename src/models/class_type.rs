use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassType {
    pub class_type_id: i64,
    pub name: String,
    pub duration_minutes: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClassTypeRequest {
    pub name: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClassTypeRequest {
    pub name: Option<String>,
    pub duration_minutes: Option<i64>,
}
