use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use super::BookingStore;
use crate::models::{Address, Booking, BookingStatus, ServiceType};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, owner, service, date, time_slot, notes, street, city, state, zip_code, status, created_at";

#[derive(Clone)]
pub struct SqliteBookingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookingStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn insert(&self, booking: &Booking) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO bookings ({BOOKING_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                booking.id,
                booking.owner,
                booking.service.as_str(),
                booking.date.format(DATE_FORMAT).to_string(),
                booking.time_slot,
                booking.notes,
                booking.address.street,
                booking.address.city,
                booking.address.state,
                booking.address.zip_code,
                booking.status.as_str(),
                booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )
        .context("failed to insert booking")?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![id],
                |row| Ok(parse_booking_row(row)),
            )
            .optional()
            .context("failed to load booking")?;

        row.transpose()
    }

    async fn find_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Booking>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE owner = ?1 ORDER BY date DESC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![owner], |row| Ok(parse_booking_row(row)))?;

        let mut bookings = vec![];
        for row in rows {
            bookings.push(row??);
        }
        Ok(bookings)
    }

    // `id`, `owner` and `created_at` are never rewritten.
    async fn save(&self, booking: &Booking) -> anyhow::Result<()> {
        let conn = self.lock()?;
        let count = conn
            .execute(
                "UPDATE bookings SET service = ?1, date = ?2, time_slot = ?3, notes = ?4,
                   street = ?5, city = ?6, state = ?7, zip_code = ?8, status = ?9
                 WHERE id = ?10",
                params![
                    booking.service.as_str(),
                    booking.date.format(DATE_FORMAT).to_string(),
                    booking.time_slot,
                    booking.notes,
                    booking.address.street,
                    booking.address.city,
                    booking.address.state,
                    booking.address.zip_code,
                    booking.status.as_str(),
                    booking.id,
                ],
            )
            .context("failed to save booking")?;

        if count == 0 {
            return Err(anyhow!("booking {} vanished before save", booking.id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.lock()?;
        let count = conn
            .execute("DELETE FROM bookings WHERE id = ?1", params![id])
            .context("failed to delete booking")?;
        Ok(count > 0)
    }
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let service_str: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let time_slot: String = row.get(4)?;
    let notes: Option<String> = row.get(5)?;
    let street: String = row.get(6)?;
    let city: String = row.get(7)?;
    let state: String = row.get(8)?;
    let zip_code: String = row.get(9)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;

    let service = ServiceType::parse(&service_str)
        .ok_or_else(|| anyhow!("booking {id} has unknown service {service_str:?}"))?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| anyhow!("booking {id} has unknown status {status_str:?}"))?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .with_context(|| format!("booking {id} has malformed date {date_str:?}"))?;
    // Stored as UTC without an offset.
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .with_context(|| format!("booking {id} has malformed created_at {created_at_str:?}"))?
        .and_utc();

    Ok(Booking {
        id,
        owner,
        service,
        date,
        time_slot,
        notes,
        address: Address {
            street,
            city,
            state,
            zip_code,
        },
        status,
        created_at,
    })
}
