pub mod migrations;
pub mod queries;

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;

use crate::models::Booking;

pub use queries::SqliteBookingStore;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Storage for bookings. Each call is atomic on its own; a load followed by a
/// save is not, so concurrent writers to one booking resolve last-write-wins.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Booking>>;
    /// Newest `date` first; bookings on the same date keep insertion order.
    async fn find_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Booking>>;
    async fn save(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn delete_by_id(&self, id: &str) -> anyhow::Result<bool>;
}
