use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use lifelink_types::api::UpdateChallengeRequest;

use crate::Database;
use crate::models::{ChallengeRow, ChallengeUserRow};
use crate::time;

const CHALLENGE_COLS: &str =
    "id, title, description, location, goal, start_time, end_time, reward_points";
const PARTICIPATION_COLS: &str = "challenge_id, user_id, status, joined_at";

/// Donations counting toward a challenge: the participant's donations whose
/// appointment falls inside the inclusive window and whose status is neither
/// cancelled nor rejected. Null amounts count as zero, an empty match sums
/// to zero. The appointment is the sole temporal anchor; creation time never
/// enters the filter.
const CONTRIBUTION_SUM: &str = "SELECT COALESCE(SUM(COALESCE(d.amount, 0)), 0) \
     FROM donations d \
     JOIN challenge_users cu ON cu.user_id = d.user_id \
     WHERE cu.challenge_id = ?1 \
       AND d.appointment BETWEEN ?2 AND ?3 \
       AND d.status NOT IN ('cancelled', 'rejected')";

fn challenge_from_row(row: &Row) -> rusqlite::Result<ChallengeRow> {
    Ok(ChallengeRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        goal: row.get(4)?,
        start: row.get(5)?,
        end: row.get(6)?,
        reward_points: row.get(7)?,
    })
}

fn participation_from_row(row: &Row) -> rusqlite::Result<ChallengeUserRow> {
    Ok(ChallengeUserRow {
        challenge_id: row.get(0)?,
        user_id: row.get(1)?,
        status: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

impl Database {
    pub fn create_challenge(
        &self,
        title: &str,
        description: &str,
        location: &str,
        goal: f64,
        start: &str,
        end: &str,
        reward_points: i64,
    ) -> Result<ChallengeRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO challenges \
                 (title, description, location, goal, start_time, end_time, reward_points) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![title, description, location, goal, start, end, reward_points],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE id = ?1"),
                [id],
                challenge_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_challenge(&self, id: i64) -> Result<Option<ChallengeRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE id = ?1"),
                    [id],
                    challenge_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_challenges(&self) -> Result<Vec<ChallengeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHALLENGE_COLS} FROM challenges ORDER BY start_time DESC"
            ))?;
            let rows = stmt
                .query_map([], challenge_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_challenge(
        &self,
        id: i64,
        upd: &UpdateChallengeRequest,
    ) -> Result<Option<ChallengeRow>> {
        self.with_conn(|conn| {
            let Some(existing) = conn
                .query_row(
                    &format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE id = ?1"),
                    [id],
                    challenge_from_row,
                )
                .optional()?
            else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE challenges SET title = ?1, description = ?2, location = ?3, goal = ?4, \
                 start_time = ?5, end_time = ?6, reward_points = ?7 WHERE id = ?8",
                params![
                    upd.title.as_deref().unwrap_or(&existing.title),
                    upd.description.as_deref().unwrap_or(&existing.description),
                    upd.location.as_deref().unwrap_or(&existing.location),
                    upd.goal.unwrap_or(existing.goal),
                    upd.start.map(time::to_db).unwrap_or(existing.start),
                    upd.end.map(time::to_db).unwrap_or(existing.end),
                    upd.reward_points.unwrap_or(existing.reward_points),
                    id,
                ],
            )?;

            let row = conn.query_row(
                &format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE id = ?1"),
                [id],
                challenge_from_row,
            )?;
            Ok(Some(row))
        })
    }

    /// Participations cascade with the challenge.
    pub fn delete_challenge(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM challenges WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Enroll a user. Returns None when already enrolled.
    pub fn join_challenge(&self, challenge_id: i64, user_id: i64) -> Result<Option<ChallengeUserRow>> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM challenge_users \
                 WHERE challenge_id = ?1 AND user_id = ?2)",
                params![challenge_id, user_id],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO challenge_users (challenge_id, user_id) VALUES (?1, ?2)",
                params![challenge_id, user_id],
            )?;
            let row = conn.query_row(
                &format!(
                    "SELECT {PARTICIPATION_COLS} FROM challenge_users \
                     WHERE challenge_id = ?1 AND user_id = ?2"
                ),
                params![challenge_id, user_id],
                participation_from_row,
            )?;
            Ok(Some(row))
        })
    }

    pub fn leave_challenge(&self, challenge_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM challenge_users WHERE challenge_id = ?1 AND user_id = ?2",
                params![challenge_id, user_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn participants(&self, challenge_id: i64) -> Result<Vec<ChallengeUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PARTICIPATION_COLS} FROM challenge_users \
                 WHERE challenge_id = ?1 ORDER BY joined_at ASC"
            ))?;
            let rows = stmt
                .query_map([challenge_id], participation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn participations_by_user(&self, user_id: i64) -> Result<Vec<ChallengeUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PARTICIPATION_COLS} FROM challenge_users \
                 WHERE user_id = ?1 ORDER BY joined_at ASC"
            ))?;
            let rows = stmt
                .query_map([user_id], participation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Summed qualifying donations of every participant. The caller resolves
    /// the challenge first (missing challenge is a not-found condition, never
    /// a silent zero) and passes its stored window bounds through unchanged,
    /// so each call scopes to exactly one window.
    pub fn challenge_total(&self, challenge_id: i64, start: &str, end: &str) -> Result<f64> {
        self.with_conn(|conn| {
            let total = conn.query_row(CONTRIBUTION_SUM, params![challenge_id, start, end], |row| {
                row.get(0)
            })?;
            Ok(total)
        })
    }

    /// One participant's share of the window. A participant with no
    /// qualifying donations contributes 0.0, not an error.
    pub fn challenge_user_total(
        &self,
        challenge_id: i64,
        user_id: i64,
        start: &str,
        end: &str,
    ) -> Result<f64> {
        self.with_conn(|conn| {
            let sql = format!("{CONTRIBUTION_SUM} AND d.user_id = ?4");
            let total =
                conn.query_row(&sql, params![challenge_id, start, end, user_id], |row| row.get(0))?;
            Ok(total)
        })
    }

    /// Participants restricted to the requester's accepted-friend set before
    /// summing. The requester's own donations are excluded by construction.
    pub fn challenge_friends_total(
        &self,
        challenge_id: i64,
        requester_id: i64,
        start: &str,
        end: &str,
    ) -> Result<f64> {
        self.with_conn(|conn| {
            let sql = format!(
                "{CONTRIBUTION_SUM} AND d.user_id IN ( \
                     SELECT CASE WHEN sender_id = ?4 THEN receiver_id ELSE sender_id END \
                     FROM friends \
                     WHERE (sender_id = ?4 OR receiver_id = ?4) AND status = 'accepted')"
            );
            let total = conn
                .query_row(&sql, params![challenge_id, start, end, requester_id], |row| row.get(0))?;
            Ok(total)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::*;

    const START: &str = "2024-01-01 00:00:00";
    const END: &str = "2024-01-31 23:59:59";

    #[test]
    fn zero_participants_total_is_zero() {
        let db = test_db();
        let challenge = seed_challenge(&db, START, END);
        assert_eq!(db.challenge_total(challenge, START, END).unwrap(), 0.0);
    }

    #[test]
    fn donations_outside_window_do_not_count() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let location = seed_location(&db);
        let challenge = seed_challenge(&db, START, END);
        db.join_challenge(challenge, alice).unwrap();

        // one appointment inside the window, one after it
        seed_donation(&db, alice, location, Some(50.0), "2024-01-15 10:00:00", "completed", false);
        seed_donation(&db, alice, location, Some(100.0), "2024-02-05 10:00:00", "completed", false);

        assert_eq!(db.challenge_user_total(challenge, alice, START, END).unwrap(), 50.0);
        assert_eq!(db.challenge_total(challenge, START, END).unwrap(), 50.0);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let location = seed_location(&db);
        let challenge = seed_challenge(&db, START, END);
        db.join_challenge(challenge, alice).unwrap();

        seed_donation(&db, alice, location, Some(1.0), START, "completed", false);
        seed_donation(&db, alice, location, Some(2.0), END, "completed", false);

        assert_eq!(db.challenge_total(challenge, START, END).unwrap(), 3.0);
    }

    #[test]
    fn null_amount_counts_as_zero() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let location = seed_location(&db);
        let challenge = seed_challenge(&db, START, END);
        db.join_challenge(challenge, alice).unwrap();

        seed_donation(&db, alice, location, None, "2024-01-10 10:00:00", "completed", false);
        seed_donation(&db, alice, location, Some(25.0), "2024-01-12 10:00:00", "completed", false);

        assert_eq!(db.challenge_total(challenge, START, END).unwrap(), 25.0);
    }

    #[test]
    fn cancelled_and_rejected_do_not_count() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let location = seed_location(&db);
        let challenge = seed_challenge(&db, START, END);
        db.join_challenge(challenge, alice).unwrap();

        seed_donation(&db, alice, location, Some(10.0), "2024-01-10 10:00:00", "pending", false);
        seed_donation(&db, alice, location, Some(20.0), "2024-01-11 10:00:00", "completed", false);
        seed_donation(&db, alice, location, Some(40.0), "2024-01-12 10:00:00", "cancelled", false);
        seed_donation(&db, alice, location, Some(80.0), "2024-01-13 10:00:00", "rejected", false);

        assert_eq!(db.challenge_total(challenge, START, END).unwrap(), 30.0);
    }

    #[test]
    fn non_participants_do_not_count() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let location = seed_location(&db);
        let challenge = seed_challenge(&db, START, END);
        db.join_challenge(challenge, alice).unwrap();

        seed_donation(&db, alice, location, Some(10.0), "2024-01-10 10:00:00", "completed", false);
        seed_donation(&db, bob, location, Some(99.0), "2024-01-10 10:00:00", "completed", false);

        assert_eq!(db.challenge_total(challenge, START, END).unwrap(), 10.0);
    }

    #[test]
    fn overlapping_windows_never_double_count() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let location = seed_location(&db);
        let first = seed_challenge(&db, START, END);
        let second = seed_challenge(&db, "2024-01-20 00:00:00", "2024-02-20 00:00:00");
        db.join_challenge(first, alice).unwrap();
        db.join_challenge(second, alice).unwrap();

        seed_donation(&db, alice, location, Some(50.0), "2024-01-25 10:00:00", "completed", false);

        // each query scopes strictly to its own window
        assert_eq!(db.challenge_total(first, START, END).unwrap(), 50.0);
        assert_eq!(
            db.challenge_total(second, "2024-01-20 00:00:00", "2024-02-20 00:00:00").unwrap(),
            50.0
        );
    }

    #[test]
    fn friend_scoped_total_intersects_participants_and_friends() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");
        let location = seed_location(&db);
        let challenge = seed_challenge(&db, START, END);
        for user in [alice, bob, carol] {
            db.join_challenge(challenge, user).unwrap();
        }

        accept_friendship(&db, alice, bob);
        db.send_friend_request(alice, carol).unwrap(); // pending, excluded

        seed_donation(&db, alice, location, Some(10.0), "2024-01-10 10:00:00", "completed", false);
        seed_donation(&db, bob, location, Some(20.0), "2024-01-11 10:00:00", "completed", false);
        seed_donation(&db, carol, location, Some(40.0), "2024-01-12 10:00:00", "completed", false);

        // only bob is an accepted friend of alice; alice herself is excluded
        assert_eq!(db.challenge_friends_total(challenge, alice, START, END).unwrap(), 20.0);
        assert_eq!(db.challenge_friends_total(challenge, bob, START, END).unwrap(), 10.0);
        assert_eq!(db.challenge_friends_total(challenge, carol, START, END).unwrap(), 0.0);
    }

    #[test]
    fn join_is_idempotent_and_leave_removes() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let challenge = seed_challenge(&db, START, END);

        assert!(db.join_challenge(challenge, alice).unwrap().is_some());
        assert!(db.join_challenge(challenge, alice).unwrap().is_none());
        assert_eq!(db.participants(challenge).unwrap().len(), 1);

        assert!(db.leave_challenge(challenge, alice).unwrap());
        assert!(!db.leave_challenge(challenge, alice).unwrap());
        assert!(db.participants(challenge).unwrap().is_empty());
    }

    #[test]
    fn delete_challenge_cascades_participations() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let challenge = seed_challenge(&db, START, END);
        db.join_challenge(challenge, alice).unwrap();

        assert!(db.delete_challenge(challenge).unwrap());
        assert!(db.participations_by_user(alice).unwrap().is_empty());
    }
}
