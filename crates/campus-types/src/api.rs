use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ClassStudent, User};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the token issuer.
/// Canonical definition lives here in campus-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

// -- Errors --

/// Wire shape of every error response. Clients switch on `code`
/// (a stable machine-readable discriminator), never on `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

// -- Teachers --

/// Geolocation captured by the mobile client for a teacher's address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coords {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeacherRequest {
    pub registration: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub coords: Coords,
}

// -- Students --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentRequest {
    pub registration: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

// -- Classes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassRequest {
    pub label: String,
    pub period: String,
    /// Owning teacher id. The field is named `teacher` on the wire.
    pub teacher: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ClassDetailResponse {
    pub id: Uuid,
    pub label: String,
    pub period: String,
    #[serde(rename = "teacherId")]
    pub teacher_id: Uuid,
    #[serde(rename = "teacherName")]
    pub teacher_name: String,
    pub students: Vec<ClassStudent>,
}

// -- Roster --

/// Body for both the enroll (PATCH) and unenroll (DELETE) roster calls.
/// The client submits disjoint add/remove sets; the server treats each
/// call independently.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterRequest {
    pub students: Vec<Uuid>,
}
