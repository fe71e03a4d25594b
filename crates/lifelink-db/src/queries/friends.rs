use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use crate::Database;
use crate::models::FriendRow;

const FRIEND_COLS: &str = "sender_id, receiver_id, status, created_at";

fn friend_from_row(row: &Row) -> rusqlite::Result<FriendRow> {
    Ok(FriendRow {
        sender_id: row.get(0)?,
        receiver_id: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    /// Insert a pending request. Returns None when an edge already exists in
    /// either direction, so a pair of users never holds two edges.
    pub fn send_friend_request(&self, sender_id: i64, receiver_id: i64) -> Result<Option<FriendRow>> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM friends \
                 WHERE (sender_id = ?1 AND receiver_id = ?2) \
                    OR (sender_id = ?2 AND receiver_id = ?1))",
                params![sender_id, receiver_id],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO friends (sender_id, receiver_id) VALUES (?1, ?2)",
                params![sender_id, receiver_id],
            )?;
            let row = conn.query_row(
                &format!(
                    "SELECT {FRIEND_COLS} FROM friends WHERE sender_id = ?1 AND receiver_id = ?2"
                ),
                params![sender_id, receiver_id],
                friend_from_row,
            )?;
            Ok(Some(row))
        })
    }

    /// Update the directed edge sender -> receiver. The receiver is the only
    /// party who accepts or blocks, so this lookup stays directional.
    pub fn set_friend_status(
        &self,
        sender_id: i64,
        receiver_id: i64,
        status: &str,
    ) -> Result<Option<FriendRow>> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE friends SET status = ?1 WHERE sender_id = ?2 AND receiver_id = ?3",
                params![status, sender_id, receiver_id],
            )?;
            if n == 0 {
                return Ok(None);
            }
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {FRIEND_COLS} FROM friends \
                         WHERE sender_id = ?1 AND receiver_id = ?2"
                    ),
                    params![sender_id, receiver_id],
                    friend_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Accepted edges touching this user, traversed symmetrically.
    pub fn list_friends(&self, user_id: i64) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FRIEND_COLS} FROM friends \
                 WHERE (sender_id = ?1 OR receiver_id = ?1) AND status = 'accepted' \
                 ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], friend_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_incoming_requests(&self, user_id: i64) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FRIEND_COLS} FROM friends \
                 WHERE receiver_id = ?1 AND status = 'pending' ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], friend_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_sent_requests(&self, user_id: i64) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FRIEND_COLS} FROM friends \
                 WHERE sender_id = ?1 AND status = 'pending' ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], friend_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Remove the edge between two users regardless of direction.
    pub fn delete_friend(&self, user_id: i64, friend_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM friends \
                 WHERE (sender_id = ?1 AND receiver_id = ?2) \
                    OR (sender_id = ?2 AND receiver_id = ?1)",
                params![user_id, friend_id],
            )?;
            Ok(n > 0)
        })
    }

    /// The requester's accepted-friend id set: the opposite endpoint of every
    /// accepted edge the requester sits on. Never contains the requester.
    pub fn accepted_friend_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END \
                 FROM friends \
                 WHERE (sender_id = ?1 OR receiver_id = ?1) AND status = 'accepted'",
            )?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::*;

    #[test]
    fn request_accept_flow() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let edge = db.send_friend_request(alice, bob).unwrap().unwrap();
        assert_eq!(edge.status, "pending");

        // duplicate in either direction is refused
        assert!(db.send_friend_request(alice, bob).unwrap().is_none());
        assert!(db.send_friend_request(bob, alice).unwrap().is_none());

        assert_eq!(db.list_incoming_requests(bob).unwrap().len(), 1);
        assert_eq!(db.list_sent_requests(alice).unwrap().len(), 1);

        let edge = db.set_friend_status(alice, bob, "accepted").unwrap().unwrap();
        assert_eq!(edge.status, "accepted");
        assert!(db.list_incoming_requests(bob).unwrap().is_empty());
    }

    #[test]
    fn accepted_edges_are_symmetric() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        accept_friendship(&db, alice, bob);
        db.send_friend_request(carol, alice).unwrap();

        assert_eq!(db.accepted_friend_ids(alice).unwrap(), vec![bob]);
        assert_eq!(db.accepted_friend_ids(bob).unwrap(), vec![alice]);
        // pending never yields eligibility in either direction
        assert!(db.accepted_friend_ids(carol).unwrap().is_empty());

        db.set_friend_status(carol, alice, "blocked").unwrap();
        assert!(db.accepted_friend_ids(carol).unwrap().is_empty());
        assert_eq!(db.accepted_friend_ids(alice).unwrap(), vec![bob]);
    }

    #[test]
    fn delete_works_in_both_directions() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        accept_friendship(&db, alice, bob);
        // bob removes the friendship even though alice sent the request
        assert!(db.delete_friend(bob, alice).unwrap());
        assert!(db.list_friends(alice).unwrap().is_empty());
        assert!(!db.delete_friend(bob, alice).unwrap());
    }

    #[test]
    fn missing_edge_update_returns_none() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        assert!(db.set_friend_status(alice, bob, "accepted").unwrap().is_none());
    }
}
