use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use campus_types::api::{ClassDetailResponse, ClassRequest, RosterRequest};
use campus_types::models::{Class, ClassStudent, RosterEntry};

use crate::AppState;
use crate::error::ApiError;

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_classes()?;

    let classes: Vec<Class> = rows
        .into_iter()
        .map(|row| Class {
            id: parse_id(&row.id, "class"),
            label: row.label,
            period: row.period,
            teacher_id: parse_id(&row.teacher_id, "teacher"),
        })
        .collect();

    Ok(Json(classes))
}

/// GET /classes/:id — class joined with its teacher plus the full roster.
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Run the multi-query assembly off the async runtime
    let db = state.clone();
    let cid = id.to_string();

    let (detail, roster) = tokio::task::spawn_blocking(move || {
        let detail = db
            .db
            .get_class_detail(&cid)?
            .ok_or(ApiError::ClassNotFound)?;
        let roster = db.db.class_roster(&cid)?;
        Ok::<_, ApiError>((detail, roster))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    let students = roster
        .into_iter()
        .map(|r| ClassStudent {
            id: parse_id(&r.student_id, "student"),
            name: r.student_name,
        })
        .collect();

    Ok(Json(ClassDetailResponse {
        id,
        label: detail.label,
        period: detail.period,
        teacher_id: parse_id(&detail.teacher_id, "teacher"),
        teacher_name: detail.teacher_name,
        students,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<ClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    state
        .db
        .get_teacher(&req.teacher.to_string())?
        .ok_or(ApiError::TeacherNotFound)?;

    state.db.insert_class(
        &Uuid::new_v4().to_string(),
        &req.label,
        &req.period,
        &req.teacher.to_string(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Class created" })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let id = id.to_string();
    state
        .db
        .get_class_detail(&id)?
        .ok_or(ApiError::ClassNotFound)?;
    state
        .db
        .get_teacher(&req.teacher.to_string())?
        .ok_or(ApiError::TeacherNotFound)?;

    state
        .db
        .update_class(&id, &req.label, &req.period, &req.teacher.to_string())?;

    Ok(Json(serde_json::json!({ "message": "Class updated" })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = id.to_string();

    state
        .db
        .get_class_detail(&id)?
        .ok_or(ApiError::ClassNotFound)?;

    state.db.delete_class(&id)?;

    Ok(Json(serde_json::json!({ "message": "Class deleted" })))
}

/// GET /classes/:id/students — the current roster.
pub async fn roster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.class_roster(&id.to_string())?;

    let entries: Vec<RosterEntry> = rows
        .into_iter()
        .map(|r| RosterEntry {
            id: parse_id(&r.student_id, "student"),
            name: r.student_name,
            class_id: parse_id(&r.class_id, "class"),
        })
        .collect();

    Ok(Json(entries))
}

/// PATCH /classes/:id/student — enroll a batch. The existence check and
/// the inserts share one transaction, so a batch with any unknown id
/// leaves the roster untouched.
pub async fn add_students(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RosterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cid = id.to_string();
    state
        .db
        .get_class_detail(&cid)?
        .ok_or(ApiError::ClassNotFound)?;

    let ids: Vec<String> = req.students.iter().map(Uuid::to_string).collect();

    let db = state.clone();
    let added = tokio::task::spawn_blocking(move || db.db.add_students(&cid, &ids))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(|e| ApiError::from_unique(e, ApiError::AlreadyEnrolled))?;

    if !added {
        return Err(ApiError::StudentsNotFound);
    }

    Ok(Json(serde_json::json!({ "message": "Students added to class" })))
}

/// DELETE /classes/:id/student — unenroll a batch; non-members are
/// silently skipped.
pub async fn remove_students(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RosterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cid = id.to_string();
    let ids: Vec<String> = req.students.iter().map(Uuid::to_string).collect();

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.remove_students(&cid, &ids))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??;

    Ok(Json(serde_json::json!({ "message": "Students removed from class" })))
}

fn validate(req: &ClassRequest) -> Result<(), ApiError> {
    if req.label.trim().is_empty() || req.period.trim().is_empty() {
        return Err(ApiError::Validation("missing required fields".into()));
    }
    Ok(())
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}
