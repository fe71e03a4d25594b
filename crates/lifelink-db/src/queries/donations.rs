use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use lifelink_types::api::UpdateDonationRequest;

use crate::Database;
use crate::models::{DonationRow, NewDonation};
use crate::time;

const DONATION_COLS: &str =
    "id, user_id, location_id, donation_type, amount, appointment, status, enable_joining, created_at";

fn donation_from_row(row: &Row) -> rusqlite::Result<DonationRow> {
    Ok(DonationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        location_id: row.get(2)?,
        donation_type: row.get(3)?,
        amount: row.get(4)?,
        appointment: row.get(5)?,
        status: row.get(6)?,
        enable_joining: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Database {
    pub fn create_donation(&self, donation: &NewDonation) -> Result<DonationRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO donations \
                 (user_id, location_id, donation_type, amount, appointment, status, enable_joining) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    donation.user_id,
                    donation.location_id,
                    donation.donation_type,
                    donation.amount,
                    donation.appointment,
                    donation.status,
                    donation.enable_joining,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {DONATION_COLS} FROM donations WHERE id = ?1"),
                [id],
                donation_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn get_donation(&self, id: i64) -> Result<Option<DonationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {DONATION_COLS} FROM donations WHERE id = ?1"),
                    [id],
                    donation_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn donations_by_user(&self, user_id: i64) -> Result<Vec<DonationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DONATION_COLS} FROM donations WHERE user_id = ?1 ORDER BY appointment DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], donation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Joinable donation slots owned by the requester's accepted friends:
    /// symmetric friendship, enable_joining set, appointment strictly after
    /// `now`. Soonest appointment first. Never includes the requester's own rows.
    pub fn friends_donations(&self, user_id: i64, now: &str) -> Result<Vec<DonationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DONATION_COLS} FROM donations \
                 WHERE user_id IN ( \
                     SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END \
                     FROM friends \
                     WHERE (sender_id = ?1 OR receiver_id = ?1) AND status = 'accepted') \
                   AND enable_joining = 1 \
                   AND appointment > ?2 \
                 ORDER BY appointment ASC"
            ))?;
            let rows = stmt
                .query_map(params![user_id, now], donation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Read-then-write partial update. Returns None when the donation is
    /// missing. Terminal-state enforcement lives in the handler.
    pub fn update_donation(
        &self,
        id: i64,
        upd: &UpdateDonationRequest,
    ) -> Result<Option<DonationRow>> {
        self.with_conn(|conn| {
            let Some(existing) = conn
                .query_row(
                    &format!("SELECT {DONATION_COLS} FROM donations WHERE id = ?1"),
                    [id],
                    donation_from_row,
                )
                .optional()?
            else {
                return Ok(None);
            };

            let appointment = upd
                .appointment
                .map(time::to_db)
                .unwrap_or(existing.appointment);
            let status = upd
                .status
                .map(|s| s.as_str().to_string())
                .unwrap_or(existing.status);

            conn.execute(
                "UPDATE donations SET location_id = ?1, amount = ?2, appointment = ?3, \
                 status = ?4, enable_joining = ?5 WHERE id = ?6",
                params![
                    upd.location_id.unwrap_or(existing.location_id),
                    upd.amount.or(existing.amount),
                    appointment,
                    status,
                    upd.enable_joining.unwrap_or(existing.enable_joining),
                    id,
                ],
            )?;

            let row = conn.query_row(
                &format!("SELECT {DONATION_COLS} FROM donations WHERE id = ?1"),
                [id],
                donation_from_row,
            )?;
            Ok(Some(row))
        })
    }

    pub fn delete_donation(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM donations WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}
