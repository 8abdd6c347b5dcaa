use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An app operator account. The password hash never crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Uuid,
    pub registration: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub registration: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub label: String,
    pub period: String,
    #[serde(rename = "teacherId")]
    pub teacher_id: Uuid,
}

/// One enrolled student as it appears inside a class view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStudent {
    pub id: Uuid,
    pub name: String,
}

/// Roster listing entry for GET /classes/:id/students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "classId")]
    pub class_id: Uuid,
}
