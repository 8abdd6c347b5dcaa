use crate::Database;
use crate::models::{ClassDetailRow, ClassRow, RosterRow, StudentRow, TeacherRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn set_user_image(&self, id: &str, image_url: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET image_url = ?2 WHERE id = ?1",
                (id, image_url),
            )?;
            Ok(())
        })
    }

    // -- Teachers --

    pub fn list_teachers(&self) -> Result<Vec<TeacherRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, registration, name, email, phone, lat, long FROM teachers",
            )?;
            let rows = stmt
                .query_map([], map_teacher)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_teacher(&self, id: &str) -> Result<Option<TeacherRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, registration, name, email, phone, lat, long
                 FROM teachers WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], map_teacher).optional()?;
            Ok(row)
        })
    }

    /// Insert relies on the UNIQUE indexes on registration/email/phone;
    /// a collision surfaces as a constraint violation, not a pre-check.
    pub fn insert_teacher(&self, row: &TeacherRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO teachers (id, registration, name, email, phone, lat, long)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    row.id,
                    row.registration,
                    row.name,
                    row.email,
                    row.phone,
                    row.lat,
                    row.long
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_teacher(&self, row: &TeacherRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE teachers
                 SET registration = ?2, name = ?3, email = ?4, phone = ?5, lat = ?6, long = ?7
                 WHERE id = ?1",
                rusqlite::params![
                    row.id,
                    row.registration,
                    row.name,
                    row.email,
                    row.phone,
                    row.lat,
                    row.long
                ],
            )?;
            Ok(())
        })
    }

    pub fn teacher_has_classes(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM classes WHERE teacher_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn delete_teacher(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM teachers WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Students --

    pub fn list_students(&self) -> Result<Vec<StudentRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, registration, name, email, phone FROM students")?;
            let rows = stmt
                .query_map([], map_student)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_student(&self, id: &str) -> Result<Option<StudentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, registration, name, email, phone FROM students WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], map_student).optional()?;
            Ok(row)
        })
    }

    pub fn insert_student(&self, row: &StudentRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO students (id, registration, name, email, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![row.id, row.registration, row.name, row.email, row.phone],
            )?;
            Ok(())
        })
    }

    pub fn update_student(&self, row: &StudentRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE students
                 SET registration = ?2, name = ?3, email = ?4, phone = ?5
                 WHERE id = ?1",
                rusqlite::params![row.id, row.registration, row.name, row.email, row.phone],
            )?;
            Ok(())
        })
    }

    pub fn student_in_class(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM class_students WHERE student_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn delete_student(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM students WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Classes --

    pub fn list_classes(&self) -> Result<Vec<ClassRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, label, period, teacher_id FROM classes")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ClassRow {
                        id: row.get(0)?,
                        label: row.get(1)?,
                        period: row.get(2)?,
                        teacher_id: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Class joined with its teacher's name in a single query.
    pub fn get_class_detail(&self, id: &str) -> Result<Option<ClassDetailRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.label, c.period, c.teacher_id, t.name
                 FROM classes c
                 JOIN teachers t ON c.teacher_id = t.id
                 WHERE c.id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(ClassDetailRow {
                        id: row.get(0)?,
                        label: row.get(1)?,
                        period: row.get(2)?,
                        teacher_id: row.get(3)?,
                        teacher_name: row.get(4)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn insert_class(&self, id: &str, label: &str, period: &str, teacher_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO classes (id, label, period, teacher_id) VALUES (?1, ?2, ?3, ?4)",
                (id, label, period, teacher_id),
            )?;
            Ok(())
        })
    }

    pub fn update_class(&self, id: &str, label: &str, period: &str, teacher_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE classes SET label = ?2, period = ?3, teacher_id = ?4 WHERE id = ?1",
                (id, label, period, teacher_id),
            )?;
            Ok(())
        })
    }

    /// Removes the class and its membership rows in one transaction so
    /// deletion never leaves orphaned enrollments behind.
    pub fn delete_class(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM class_students WHERE class_id = ?1", [id])?;
            tx.execute("DELETE FROM classes WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }

    // -- Roster --

    pub fn class_roster(&self, class_id: &str) -> Result<Vec<RosterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT cs.class_id, cs.student_id, s.name
                 FROM class_students cs
                 JOIN students s ON cs.student_id = s.id
                 WHERE cs.class_id = ?1",
            )?;
            let rows = stmt
                .query_map([class_id], |row| {
                    Ok(RosterRow {
                        class_id: row.get(0)?,
                        student_id: row.get(1)?,
                        student_name: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Enroll a batch of students. Existence check and inserts share one
    /// transaction: returns Ok(false) without touching the table when any
    /// submitted id is unknown, so a partial batch can never land.
    pub fn add_students(&self, class_id: &str, student_ids: &[String]) -> Result<bool> {
        if student_ids.is_empty() {
            return Ok(true);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let placeholders: Vec<String> =
                (1..=student_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT COUNT(*) FROM students WHERE id IN ({})",
                placeholders.join(", ")
            );
            let params: Vec<&dyn rusqlite::types::ToSql> = student_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let found: i64 = tx.query_row(&sql, params.as_slice(), |row| row.get(0))?;
            if found as usize != student_ids.len() {
                return Ok(false);
            }

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO class_students (class_id, student_id) VALUES (?1, ?2)",
                )?;
                for student_id in student_ids {
                    stmt.execute((class_id, student_id))?;
                }
            }

            tx.commit()?;
            Ok(true)
        })
    }

    /// Unenroll a batch of students. No existence pre-check; removing a
    /// non-member is a silent no-op.
    pub fn remove_students(&self, class_id: &str, student_ids: &[String]) -> Result<()> {
        if student_ids.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (2..=student_ids.len() + 1).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "DELETE FROM class_students WHERE class_id = ?1 AND student_id IN ({})",
                placeholders.join(", ")
            );

            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&class_id];
            params.extend(
                student_ids
                    .iter()
                    .map(|id| id as &dyn rusqlite::types::ToSql),
            );

            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }
}

fn map_teacher(row: &rusqlite::Row<'_>) -> std::result::Result<TeacherRow, rusqlite::Error> {
    Ok(TeacherRow {
        id: row.get(0)?,
        registration: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        lat: row.get(5)?,
        long: row.get(6)?,
    })
}

fn map_student(row: &rusqlite::Row<'_>) -> std::result::Result<StudentRow, rusqlite::Error> {
    Ok(StudentRow {
        id: row.get(0)?,
        registration: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, password, image_url, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                image_url: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
