use anyhow::Result;
use rusqlite::{Row, params};

use crate::Database;
use crate::models::NotificationRow;

const NOTIFICATION_COLS: &str = "id, user_id, title, content, retrieved, created_at";

fn notification_from_row(row: &Row) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        retrieved: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    pub fn create_notification(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<NotificationRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (user_id, title, content) VALUES (?1, ?2, ?3)",
                params![user_id, title, content],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {NOTIFICATION_COLS} FROM notifications WHERE id = ?1"),
                [id],
                notification_from_row,
            )?;
            Ok(row)
        })
    }

    /// List a user's notifications, unretrieved first, then flip the
    /// retrieved flag in the same transaction. The rows returned still carry
    /// the flag as it was when the client fetched them.
    pub fn notifications_for_user(&self, user_id: i64) -> Result<Vec<NotificationRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let rows = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {NOTIFICATION_COLS} FROM notifications \
                     WHERE user_id = ?1 ORDER BY retrieved ASC, created_at DESC"
                ))?;
                stmt.query_map([user_id], notification_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };

            tx.execute(
                "UPDATE notifications SET retrieved = 1 WHERE user_id = ?1 AND retrieved = 0",
                [user_id],
            )?;

            tx.commit()?;
            Ok(rows)
        })
    }

    pub fn delete_notification(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM notifications WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::*;

    #[test]
    fn listing_marks_retrieved() {
        let db = test_db();
        let alice = seed_user(&db, "alice");

        db.create_notification(alice, "Welcome", "Thanks for joining").unwrap();
        db.create_notification(alice, "Reminder", "Donation tomorrow").unwrap();

        let first = db.notifications_for_user(alice).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|n| !n.retrieved));

        let second = db.notifications_for_user(alice).unwrap();
        assert!(second.iter().all(|n| n.retrieved));
    }

    #[test]
    fn notifications_are_per_user() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.create_notification(alice, "Hi", "only alice").unwrap();
        assert!(db.notifications_for_user(bob).unwrap().is_empty());

        let n = db.notifications_for_user(alice).unwrap();
        assert_eq!(n.len(), 1);
        assert!(db.delete_notification(n[0].id).unwrap());
        assert!(!db.delete_notification(n[0].id).unwrap());
    }
}
