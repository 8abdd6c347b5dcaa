use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use campus_db::models::TeacherRow;
use campus_types::api::TeacherRequest;
use campus_types::models::Teacher;

use crate::AppState;
use crate::error::ApiError;

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_teachers()?;
    let teachers: Vec<Teacher> = rows.into_iter().map(teacher_from_row).collect();
    Ok(Json(teachers))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_teacher(&id.to_string())?
        .ok_or(ApiError::TeacherNotFound)?;

    Ok(Json(teacher_from_row(row)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<TeacherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let row = row_from_request(Uuid::new_v4(), &req);
    state
        .db
        .insert_teacher(&row)
        .map_err(|e| ApiError::from_unique(e, ApiError::TeacherExists))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Teacher created" })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TeacherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    state
        .db
        .get_teacher(&id.to_string())?
        .ok_or(ApiError::TeacherNotFound)?;

    // Uniqueness re-check excluding self falls out of the UNIQUE
    // indexes: a same-row UPDATE never collides with itself.
    let row = row_from_request(id, &req);
    state
        .db
        .update_teacher(&row)
        .map_err(|e| ApiError::from_unique(e, ApiError::TeacherExists))?;

    Ok(Json(serde_json::json!({ "message": "Teacher updated" })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = id.to_string();

    state.db.get_teacher(&id)?.ok_or(ApiError::TeacherNotFound)?;

    if state.db.teacher_has_classes(&id)? {
        return Err(ApiError::TeacherHasClasses);
    }

    state.db.delete_teacher(&id)?;

    Ok(Json(serde_json::json!({ "message": "Teacher deleted" })))
}

fn validate(req: &TeacherRequest) -> Result<(), ApiError> {
    if req.registration.trim().is_empty()
        || req.name.trim().is_empty()
        || req.phone.trim().is_empty()
    {
        return Err(ApiError::Validation("missing required fields".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("invalid email".into()));
    }
    Ok(())
}

fn row_from_request(id: Uuid, req: &TeacherRequest) -> TeacherRow {
    TeacherRow {
        id: id.to_string(),
        registration: req.registration.clone(),
        name: req.name.clone(),
        email: req.email.clone(),
        phone: req.phone.clone(),
        lat: req.coords.latitude,
        long: req.coords.longitude,
    }
}

pub(crate) fn teacher_from_row(row: TeacherRow) -> Teacher {
    Teacher {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt teacher id '{}': {}", row.id, e);
            Uuid::default()
        }),
        registration: row.registration,
        name: row.name,
        email: row.email,
        phone: row.phone,
        lat: row.lat,
        long: row.long,
    }
}
