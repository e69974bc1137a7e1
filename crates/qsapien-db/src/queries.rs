use crate::models::{NewUser, SessionRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};

const USER_COLUMNS: &str = "id, first_name, last_name, email_id, username, password, location, \
     bio, contact_no, profile_image_url, credit_points";

impl Database {
    // -- Users --

    /// Insert a new user. Returns `false` without inserting when the email is
    /// already registered.
    pub fn create_user(&self, user: &NewUser) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, first_name, last_name, email_id, username, password, location, bio, contact_no)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    user.id,
                    user.first_name,
                    user.last_name,
                    user.email_id,
                    user.username,
                    user.password,
                    user.location,
                    user.bio,
                    user.contact_no,
                ],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email_id", email_id))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1 LIMIT 1",
                    [username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Point a user's profile image at `url`. Returns `false` if no such user.
    pub fn set_profile_image_url(&self, id: &str, url: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET profile_image_url = ?1 WHERE id = ?2",
                (url, id),
            )?;
            Ok(updated > 0)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, ttl_hours: u64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, expires_at) VALUES (?1, datetime('now', ?2))",
                (id, format!("+{} hours", ttl_hours)),
            )?;
            Ok(())
        })
    }

    /// Fetch a session that has not yet expired.
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, token FROM sessions
                     WHERE id = ?1 AND expires_at > datetime('now')",
                    [id],
                    |row| {
                        Ok(SessionRow {
                            id: row.get(0)?,
                            token: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn set_session_token(&self, id: &str, token: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE sessions SET token = ?1 WHERE id = ?2", (token, id))?;
            Ok(())
        })
    }

    /// Delete expired sessions, returning how many were removed.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= datetime('now')",
                [],
            )?;
            Ok(removed)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email_id: row.get(3)?,
                username: row.get(4)?,
                password: row.get(5)?,
                location: row.get(6)?,
                bio: row.get(7)?,
                contact_no: row.get(8)?,
                profile_image_url: row.get(9)?,
                credit_points: row.get(10)?,
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
