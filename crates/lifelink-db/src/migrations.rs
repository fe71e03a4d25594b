use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name      TEXT NOT NULL,
            last_name       TEXT NOT NULL,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            birthdate       TEXT NOT NULL,
            city            TEXT NOT NULL,
            blood_type      TEXT,
            nationality     TEXT,
            gender          TEXT,
            is_eligible     INTEGER NOT NULL DEFAULT 0,
            current_points  INTEGER NOT NULL DEFAULT 200,
            total_points    INTEGER NOT NULL DEFAULT 200,
            role            TEXT NOT NULL DEFAULT 'user',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS location_info (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            address         TEXT NOT NULL,
            opening_hours   TEXT NOT NULL,
            latitude        TEXT NOT NULL,
            longitude       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS timeslots (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            location_id         INTEGER NOT NULL REFERENCES location_info(id) ON DELETE CASCADE,
            start_time          TEXT NOT NULL,
            end_time            TEXT NOT NULL,
            total_capacity      INTEGER NOT NULL,
            remaining_capacity  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_timeslots_location
            ON timeslots(location_id, start_time);

        CREATE TABLE IF NOT EXISTS donations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            location_id     INTEGER NOT NULL REFERENCES location_info(id),
            donation_type   TEXT NOT NULL,
            amount          REAL,
            appointment     TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending',
            enable_joining  INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_donations_user
            ON donations(user_id, appointment);

        CREATE TABLE IF NOT EXISTS challenges (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            location        TEXT NOT NULL,
            goal            REAL NOT NULL,
            start_time      TEXT NOT NULL,
            end_time        TEXT NOT NULL,
            reward_points   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS challenge_users (
            challenge_id    INTEGER NOT NULL REFERENCES challenges(id) ON DELETE CASCADE,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status          TEXT NOT NULL DEFAULT 'active',
            joined_at       TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (challenge_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS friends (
            sender_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            receiver_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status          TEXT NOT NULL DEFAULT 'pending',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (sender_id, receiver_id)
        );

        CREATE TABLE IF NOT EXISTS posts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            post_type       TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_user
            ON posts(user_id, created_at);

        CREATE TABLE IF NOT EXISTS kudos (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            post_id         INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(post_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            retrieved       INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, retrieved);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
