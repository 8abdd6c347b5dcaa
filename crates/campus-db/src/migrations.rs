use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            image_url   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS teachers (
            id              TEXT PRIMARY KEY,
            registration    TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            phone           TEXT NOT NULL UNIQUE,
            lat             REAL NOT NULL,
            long            REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS students (
            id              TEXT PRIMARY KEY,
            registration    TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            phone           TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS classes (
            id          TEXT PRIMARY KEY,
            label       TEXT NOT NULL,
            period      TEXT NOT NULL,
            teacher_id  TEXT NOT NULL REFERENCES teachers(id)
        );

        CREATE INDEX IF NOT EXISTS idx_classes_teacher
            ON classes(teacher_id);

        -- Membership existence is the sole enrollment signal; the
        -- composite key doubles as the uniqueness guarantee.
        CREATE TABLE IF NOT EXISTS class_students (
            class_id    TEXT NOT NULL REFERENCES classes(id),
            student_id  TEXT NOT NULL REFERENCES students(id),
            PRIMARY KEY (class_id, student_id)
        );

        CREATE INDEX IF NOT EXISTS idx_class_students_student
            ON class_students(student_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
