use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use campus_db::models::StudentRow;
use campus_types::api::StudentRequest;
use campus_types::models::Student;

use crate::AppState;
use crate::error::ApiError;

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_students()?;
    let students: Vec<Student> = rows.into_iter().map(student_from_row).collect();
    Ok(Json(students))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_student(&id.to_string())?
        .ok_or(ApiError::StudentNotFound)?;

    Ok(Json(student_from_row(row)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<StudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let row = row_from_request(Uuid::new_v4(), &req);
    state
        .db
        .insert_student(&row)
        .map_err(|e| ApiError::from_unique(e, ApiError::StudentExists))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Student created" })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    state
        .db
        .get_student(&id.to_string())?
        .ok_or(ApiError::StudentNotFound)?;

    let row = row_from_request(id, &req);
    state
        .db
        .update_student(&row)
        .map_err(|e| ApiError::from_unique(e, ApiError::StudentExists))?;

    Ok(Json(serde_json::json!({ "message": "Student updated" })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = id.to_string();

    state.db.get_student(&id)?.ok_or(ApiError::StudentNotFound)?;

    if state.db.student_in_class(&id)? {
        return Err(ApiError::StudentInClass);
    }

    state.db.delete_student(&id)?;

    Ok(Json(serde_json::json!({ "message": "Student deleted" })))
}

fn validate(req: &StudentRequest) -> Result<(), ApiError> {
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

fn row_from_request(id: Uuid, req: &StudentRequest) -> StudentRow {
    StudentRow {
        id: id.to_string(),
        registration: req.registration.clone(),
        name: req.name.clone(),
        email: req.email.clone(),
        phone: req.phone.clone(),
    }
}

pub(crate) fn student_from_row(row: StudentRow) -> Student {
    Student {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt student id '{}': {}", row.id, e);
            Uuid::default()
        }),
        registration: row.registration,
        name: row.name,
        email: row.email,
        phone: row.phone,
    }
}
