use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use lifelink_types::api::UpdateUserRequest;

use crate::Database;
use crate::models::{NewUser, UserRow};

const USER_COLS: &str = "id, first_name, last_name, username, email, password, birthdate, city, \
     blood_type, nationality, gender, is_eligible, current_points, total_points, role, created_at";

fn user_from_row(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        password: row.get(5)?,
        birthdate: row.get(6)?,
        city: row.get(7)?,
        blood_type: row.get(8)?,
        nationality: row.get(9)?,
        gender: row.get(10)?,
        is_eligible: row.get(11)?,
        current_points: row.get(12)?,
        total_points: row.get(13)?,
        role: row.get(14)?,
        created_at: row.get(15)?,
    })
}

impl Database {
    pub fn create_user(&self, user: &NewUser) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, username, email, password, birthdate, \
                 city, blood_type, nationality, gender) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    user.first_name,
                    user.last_name,
                    user.username,
                    user.email,
                    user.password_hash,
                    user.birthdate,
                    user.city,
                    user.blood_type,
                    user.nationality,
                    user.gender,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                [id],
                user_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
                    [username],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists =
                conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", [id], |row| {
                    row.get(0)
                })?;
            Ok(exists)
        })
    }

    pub fn username_taken(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    pub fn email_taken(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    /// Read-then-write partial update. Returns None when the user is missing.
    pub fn update_user(&self, id: i64, upd: &UpdateUserRequest) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let Some(existing) = conn
                .query_row(
                    &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                    [id],
                    user_from_row,
                )
                .optional()?
            else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE users SET first_name = ?1, last_name = ?2, email = ?3, city = ?4, \
                 blood_type = ?5, nationality = ?6, gender = ?7, is_eligible = ?8, \
                 current_points = ?9, total_points = ?10 WHERE id = ?11",
                params![
                    upd.first_name.as_deref().unwrap_or(&existing.first_name),
                    upd.last_name.as_deref().unwrap_or(&existing.last_name),
                    upd.email.as_deref().unwrap_or(&existing.email),
                    upd.city.as_deref().unwrap_or(&existing.city),
                    upd.blood_type.as_deref().or(existing.blood_type.as_deref()),
                    upd.nationality.as_deref().or(existing.nationality.as_deref()),
                    upd.gender.as_deref().or(existing.gender.as_deref()),
                    upd.is_eligible.unwrap_or(existing.is_eligible),
                    upd.current_points.unwrap_or(existing.current_points),
                    upd.total_points.unwrap_or(existing.total_points),
                    id,
                ],
            )?;

            let row = conn.query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                [id],
                user_from_row,
            )?;
            Ok(Some(row))
        })
    }

    /// Foreign keys cascade: donations, participations, posts, kudos,
    /// friendship edges and notifications go with the user.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}
