use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  TEXT PRIMARY KEY,
            first_name          TEXT NOT NULL,
            last_name           TEXT,
            email_id            TEXT NOT NULL UNIQUE,
            username            TEXT NOT NULL,
            password            TEXT NOT NULL,
            location            TEXT,
            bio                 TEXT,
            contact_no          TEXT,
            profile_image_url   TEXT,
            credit_points       INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Usernames are not unique; the index only serves existence checks
        CREATE INDEX IF NOT EXISTS idx_users_username
            ON users(username);

        CREATE TABLE IF NOT EXISTS sessions (
            id          TEXT PRIMARY KEY,
            token       TEXT,
            expires_at  TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_expires
            ON sessions(expires_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
