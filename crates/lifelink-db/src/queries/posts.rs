use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use crate::Database;
use crate::models::{KudosRow, PostRow};

const POST_COLS: &str = "id, user_id, title, content, post_type, created_at";
const KUDOS_COLS: &str = "id, post_id, user_id, created_at";

fn post_from_row(row: &Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        post_type: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn kudos_from_row(row: &Row) -> rusqlite::Result<KudosRow> {
    Ok(KudosRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    pub fn create_post(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        post_type: &str,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (user_id, title, content, post_type) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, title, content, post_type],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {POST_COLS} FROM posts WHERE id = ?1"),
                [id],
                post_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {POST_COLS} FROM posts WHERE id = ?1"),
                    [id],
                    post_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLS} FROM posts WHERE user_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts of the requester's accepted friends, most recent first.
    /// No temporal or flag filter, unlike the donation feed.
    pub fn friends_posts(&self, user_id: i64, limit: u32, offset: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLS} FROM posts \
                 WHERE user_id IN ( \
                     SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END \
                     FROM friends \
                     WHERE (sender_id = ?1 OR receiver_id = ?1) AND status = 'accepted') \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Kudos cascade with the post.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// One kudos per user per post. Returns None on a duplicate.
    pub fn add_kudos(&self, post_id: i64, user_id: i64) -> Result<Option<KudosRow>> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM kudos WHERE post_id = ?1 AND user_id = ?2)",
                params![post_id, user_id],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO kudos (post_id, user_id) VALUES (?1, ?2)",
                params![post_id, user_id],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {KUDOS_COLS} FROM kudos WHERE id = ?1"),
                [id],
                kudos_from_row,
            )?;
            Ok(Some(row))
        })
    }

    pub fn kudos_by_post(&self, post_id: i64) -> Result<Vec<KudosRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {KUDOS_COLS} FROM kudos WHERE post_id = ?1 ORDER BY created_at ASC"
            ))?;
            let rows = stmt
                .query_map([post_id], kudos_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_kudos(&self, post_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM kudos WHERE post_id = ?1 AND user_id = ?2",
                params![post_id, user_id],
            )?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::*;

    #[test]
    fn friend_feed_is_symmetric_and_ignores_pending() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        accept_friendship(&db, alice, bob);
        db.send_friend_request(carol, alice).unwrap();

        db.create_post(bob, "bob post", "content", "story").unwrap();
        db.create_post(carol, "carol post", "content", "story").unwrap();
        db.create_post(alice, "alice post", "content", "story").unwrap();

        let feed = db.friends_posts(alice, 10, 0).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].user_id, bob);

        let feed = db.friends_posts(bob, 10, 0).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].user_id, alice);

        assert!(db.friends_posts(carol, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn feed_pagination() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        accept_friendship(&db, alice, bob);

        for i in 0..5 {
            db.create_post(bob, &format!("post {}", i), "content", "story").unwrap();
        }

        let page = db.friends_posts(alice, 2, 0).unwrap();
        assert_eq!(page.len(), 2);
        let next = db.friends_posts(alice, 2, 2).unwrap();
        assert_eq!(next.len(), 2);
        assert_ne!(page[0].id, next[0].id);
        assert_eq!(db.friends_posts(alice, 10, 4).unwrap().len(), 1);
    }

    #[test]
    fn kudos_unique_per_user_and_cascade() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let post = db.create_post(alice, "title", "content", "story").unwrap();

        assert!(db.add_kudos(post.id, bob).unwrap().is_some());
        assert!(db.add_kudos(post.id, bob).unwrap().is_none());
        assert_eq!(db.kudos_by_post(post.id).unwrap().len(), 1);

        assert!(db.delete_post(post.id).unwrap());
        assert!(db.kudos_by_post(post.id).unwrap().is_empty());
    }

    #[test]
    fn remove_kudos() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let post = db.create_post(alice, "title", "content", "story").unwrap();

        db.add_kudos(post.id, bob).unwrap();
        assert!(db.delete_kudos(post.id, bob).unwrap());
        assert!(!db.delete_kudos(post.id, bob).unwrap());
    }
}
