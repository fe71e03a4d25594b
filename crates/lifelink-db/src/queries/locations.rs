use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use lifelink_types::api::UpdateLocationRequest;

use crate::Database;
use crate::models::{LocationRow, NewTimeslot, TimeslotRow};

const LOCATION_COLS: &str = "id, name, address, opening_hours, latitude, longitude";
const TIMESLOT_COLS: &str =
    "id, location_id, start_time, end_time, total_capacity, remaining_capacity";

fn location_from_row(row: &Row) -> rusqlite::Result<LocationRow> {
    Ok(LocationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        opening_hours: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
    })
}

fn timeslot_from_row(row: &Row) -> rusqlite::Result<TimeslotRow> {
    Ok(TimeslotRow {
        id: row.get(0)?,
        location_id: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        total_capacity: row.get(4)?,
        remaining_capacity: row.get(5)?,
    })
}

impl Database {
    /// Insert a location and its initial timeslots in one transaction.
    /// New timeslots start with full remaining capacity.
    pub fn create_location(
        &self,
        name: &str,
        address: &str,
        opening_hours: &str,
        latitude: &str,
        longitude: &str,
        timeslots: &[NewTimeslot],
    ) -> Result<(LocationRow, Vec<TimeslotRow>)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO location_info (name, address, opening_hours, latitude, longitude) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, address, opening_hours, latitude, longitude],
            )?;
            let location_id = tx.last_insert_rowid();

            for slot in timeslots {
                tx.execute(
                    "INSERT INTO timeslots \
                     (location_id, start_time, end_time, total_capacity, remaining_capacity) \
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![location_id, slot.start_time, slot.end_time, slot.total_capacity],
                )?;
            }

            let location = tx.query_row(
                &format!("SELECT {LOCATION_COLS} FROM location_info WHERE id = ?1"),
                [location_id],
                location_from_row,
            )?;
            let slots = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {TIMESLOT_COLS} FROM timeslots \
                     WHERE location_id = ?1 ORDER BY start_time ASC"
                ))?;
                stmt.query_map([location_id], timeslot_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };

            tx.commit()?;
            Ok((location, slots))
        })
    }

    pub fn get_location(&self, id: i64) -> Result<Option<LocationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {LOCATION_COLS} FROM location_info WHERE id = ?1"),
                    [id],
                    location_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn all_locations(&self) -> Result<Vec<LocationRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {LOCATION_COLS} FROM location_info ORDER BY name"))?;
            let rows = stmt
                .query_map([], location_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Address substring match, case-insensitive via LIKE.
    pub fn locations_by_city(&self, city: &str) -> Result<Vec<LocationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LOCATION_COLS} FROM location_info WHERE address LIKE ?1 ORDER BY name"
            ))?;
            let pattern = format!("%{}%", city);
            let rows = stmt
                .query_map([pattern], location_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn location_name(&self, id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let name = conn
                .query_row("SELECT name FROM location_info WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(name)
        })
    }

    pub fn timeslots_by_location(&self, location_id: i64) -> Result<Vec<TimeslotRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TIMESLOT_COLS} FROM timeslots \
                 WHERE location_id = ?1 ORDER BY start_time ASC"
            ))?;
            let rows = stmt
                .query_map([location_id], timeslot_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_location(
        &self,
        id: i64,
        upd: &UpdateLocationRequest,
    ) -> Result<Option<LocationRow>> {
        self.with_conn(|conn| {
            let Some(existing) = conn
                .query_row(
                    &format!("SELECT {LOCATION_COLS} FROM location_info WHERE id = ?1"),
                    [id],
                    location_from_row,
                )
                .optional()?
            else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE location_info SET name = ?1, address = ?2, opening_hours = ?3, \
                 latitude = ?4, longitude = ?5 WHERE id = ?6",
                params![
                    upd.name.as_deref().unwrap_or(&existing.name),
                    upd.address.as_deref().unwrap_or(&existing.address),
                    upd.opening_hours.as_deref().unwrap_or(&existing.opening_hours),
                    upd.latitude.as_deref().unwrap_or(&existing.latitude),
                    upd.longitude.as_deref().unwrap_or(&existing.longitude),
                    id,
                ],
            )?;

            let row = conn.query_row(
                &format!("SELECT {LOCATION_COLS} FROM location_info WHERE id = ?1"),
                [id],
                location_from_row,
            )?;
            Ok(Some(row))
        })
    }

    /// Timeslots cascade with the location.
    pub fn delete_location(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM location_info WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::models::NewTimeslot;
    use crate::queries::test_support::*;

    #[test]
    fn create_with_timeslots() {
        let db = test_db();
        let (location, slots) = db
            .create_location(
                "Center West",
                "Westplein 2, Rotterdam",
                "08:00-18:00",
                "51.92",
                "4.47",
                &[
                    NewTimeslot {
                        start_time: "2024-06-01 09:00:00".into(),
                        end_time: "2024-06-01 10:00:00".into(),
                        total_capacity: 8,
                    },
                    NewTimeslot {
                        start_time: "2024-06-01 10:00:00".into(),
                        end_time: "2024-06-01 11:00:00".into(),
                        total_capacity: 8,
                    },
                ],
            )
            .unwrap();

        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.remaining_capacity == s.total_capacity));
        assert_eq!(db.timeslots_by_location(location.id).unwrap().len(), 2);
    }

    #[test]
    fn city_search_matches_address_substring() {
        let db = test_db();
        seed_location(&db); // address contains Amsterdam
        db.create_location("Other", "Somewhere 1, Utrecht", "09:00-17:00", "52.09", "5.12", &[])
            .unwrap();

        assert_eq!(db.locations_by_city("Amsterdam").unwrap().len(), 1);
        assert_eq!(db.locations_by_city("Utrecht").unwrap().len(), 1);
        assert!(db.locations_by_city("Groningen").unwrap().is_empty());
    }

    #[test]
    fn delete_cascades_to_timeslots() {
        let db = test_db();
        let (location, _) = db
            .create_location(
                "Center",
                "Laan 3, Den Haag",
                "09:00-17:00",
                "52.07",
                "4.30",
                &[NewTimeslot {
                    start_time: "2024-06-01 09:00:00".into(),
                    end_time: "2024-06-01 10:00:00".into(),
                    total_capacity: 4,
                }],
            )
            .unwrap();

        assert!(db.delete_location(location.id).unwrap());
        assert!(db.timeslots_by_location(location.id).unwrap().is_empty());
        assert!(db.location_name(location.id).unwrap().is_none());
    }
}
