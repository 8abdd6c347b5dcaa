/// Database row types — these map directly to SQLite rows.
/// Distinct from campus-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

pub struct TeacherRow {
    pub id: String,
    pub registration: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub lat: f64,
    pub long: f64,
}

pub struct StudentRow {
    pub id: String,
    pub registration: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

pub struct ClassRow {
    pub id: String,
    pub label: String,
    pub period: String,
    pub teacher_id: String,
}

/// Class joined with its owning teacher's name for the detail view.
pub struct ClassDetailRow {
    pub id: String,
    pub label: String,
    pub period: String,
    pub teacher_id: String,
    pub teacher_name: String,
}

/// One membership row joined with the student's name.
pub struct RosterRow {
    pub class_id: String,
    pub student_id: String,
    pub student_name: String,
}
