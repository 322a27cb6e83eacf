use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Booking, BookingId, HistoryRecord, NewHistoryRecord, Result, StoreError, store::BookingStore,
};

const BOOKING_COLUMNS: &str =
    "id, user_id, hotel_id, promo_code, discount_percent, price, status, created_at";

const HISTORY_COLUMNS: &str =
    "id, booking_id, final_price, user_id, hotel_id, status, reason, recorded_at";

/// PostgreSQL-backed booking store implementation.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let status: String = row.try_get("status")?;

        Ok(Booking {
            id: BookingId::new(row.try_get::<String, _>("id")?),
            user_id: row.try_get("user_id")?,
            hotel_id: row.try_get("hotel_id")?,
            promo_code: row.try_get("promo_code")?,
            discount_percent: row.try_get("discount_percent")?,
            price: row.try_get("price")?,
            status: status.parse()?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_history(row: PgRow) -> Result<HistoryRecord> {
        let status: String = row.try_get("status")?;

        Ok(HistoryRecord {
            id: row.try_get("id")?,
            booking_id: BookingId::new(row.try_get::<String, _>("booking_id")?),
            user_id: row.try_get("user_id")?,
            hotel_id: row.try_get("hotel_id")?,
            status: status.parse()?,
            final_price: row.try_get("final_price")?,
            reason: row.try_get("reason")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, hotel_id, promo_code, discount_percent, price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(booking.id.as_str())
        .bind(&booking.user_id)
        .bind(&booking.hotel_id)
        .bind(&booking.promo_code)
        .bind(booking.discount_percent)
        .bind(booking.price)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateBooking(booking.id.clone());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn list_bookings(&self, user_id: Option<&str>) -> Result<Vec<Booking>> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at ASC, id ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn confirm_booking(
        &self,
        id: &BookingId,
        price: f64,
        discount_percent: f64,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE bookings
            SET status = 'confirmed', price = $2, discount_percent = $3
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(price)
        .bind(discount_percent)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn delete_booking(&self, id: &BookingId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = 'pending' AND created_at < $1 ORDER BY created_at ASC"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn append_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO history (booking_id, final_price, user_id, hotel_id, status, reason, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(record.booking_id.as_str())
        .bind(record.final_price)
        .bind(&record.user_id)
        .bind(&record.hotel_id)
        .bind(record.status.as_str())
        .bind(&record.reason)
        .bind(record.recorded_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.with_id(id))
    }

    async fn history_for_booking(&self, booking_id: &BookingId) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM history WHERE booking_id = $1 ORDER BY id ASC"
        ))
        .bind(booking_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_history).collect()
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM history ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_history).collect()
    }
}
