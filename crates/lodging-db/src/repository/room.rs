//! # Room Repository
//!
//! The room catalogue and the "which rooms are free" search.
//!
//! ## Availability Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rooms r                                                                │
//! │   WHERE r.is_active = 1                                                 │
//! │     AND [capacity ≥ ?] AND [category = ?] AND [hotel_id = ?]            │
//! │     AND r.id NOT IN (                                                   │
//! │           SELECT room_id FROM reservations                              │
//! │            WHERE status != 'cancelled'                                  │
//! │              AND check_in_date  <= :check_out     ← inclusive on both   │
//! │              AND check_out_date >= :check_in        ends, same as the   │
//! │         )                                           core predicate      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lodging_core::{Room, RoomCategory, StayDates};

const ROOM_COLUMNS: &str = "id, hotel_id, room_number, category, capacity, base_price_cents, \
                            description, is_active, created_at, updated_at";

/// Optional narrowing of an availability search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomFilter {
    pub min_capacity: Option<i64>,
    pub category: Option<RoomCategory>,
    pub hotel_id: Option<String>,
}

impl RoomFilter {
    pub fn new() -> Self {
        RoomFilter::default()
    }

    pub fn min_capacity(mut self, guests: i64) -> Self {
        self.min_capacity = Some(guests);
        self
    }

    pub fn category(mut self, category: RoomCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn hotel(mut self, hotel_id: impl Into<String>) -> Self {
        self.hotel_id = Some(hotel_id.into());
        self
    }
}

/// Repository for room database operations.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    /// Gets a room by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Room>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    /// Gets a room by ID inside an open transaction.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1");
        let room = sqlx::query_as::<_, Room>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(room)
    }

    /// Lists every active room.
    pub async fn list_active(&self) -> DbResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_active = 1 ORDER BY hotel_id, room_number"
        );
        let rooms = sqlx::query_as::<_, Room>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    /// Lists a hotel's active rooms.
    pub async fn list_by_hotel(&self, hotel_id: &str) -> DbResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_active = 1 AND hotel_id = ?1 ORDER BY room_number"
        );
        let rooms = sqlx::query_as::<_, Room>(&sql)
            .bind(hotel_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    /// Lists active rooms of one category.
    pub async fn list_by_category(&self, category: RoomCategory) -> DbResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_active = 1 AND category = ?1 \
             ORDER BY hotel_id, room_number"
        );
        let rooms = sqlx::query_as::<_, Room>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    /// Lists active rooms sleeping at least `guests`, smallest first.
    pub async fn list_by_min_capacity(&self, guests: i64) -> DbResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_active = 1 AND capacity >= ?1 \
             ORDER BY capacity, base_price_cents"
        );
        let rooms = sqlx::query_as::<_, Room>(&sql)
            .bind(guests)
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    /// Lists active rooms whose base price lies in `[min_cents, max_cents]`,
    /// cheapest first.
    pub async fn list_by_price_range(&self, min_cents: i64, max_cents: i64) -> DbResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE is_active = 1 AND base_price_cents BETWEEN ?1 AND ?2 \
             ORDER BY base_price_cents, room_number"
        );
        let rooms = sqlx::query_as::<_, Room>(&sql)
            .bind(min_cents)
            .bind(max_cents)
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    /// Active rooms with no live reservation overlapping `stay`.
    pub async fn find_available(&self, stay: &StayDates, filter: &RoomFilter) -> DbResult<Vec<Room>> {
        debug!(stay = %stay, ?filter, "Searching available rooms");

        let sql = format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM rooms r
            WHERE r.is_active = 1
              AND (?3 IS NULL OR r.capacity >= ?3)
              AND (?4 IS NULL OR r.category = ?4)
              AND (?5 IS NULL OR r.hotel_id = ?5)
              AND r.id NOT IN (
                  SELECT room_id FROM reservations
                  WHERE status != 'cancelled'
                    AND check_in_date <= ?2
                    AND check_out_date >= ?1
              )
            ORDER BY r.hotel_id, r.base_price_cents, r.room_number
            "#
        );

        let rooms = sqlx::query_as::<_, Room>(&sql)
            .bind(stay.check_in)
            .bind(stay.check_out)
            .bind(filter.min_capacity)
            .bind(filter.category)
            .bind(filter.hotel_id.as_deref())
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rooms.len(), "Available rooms found");
        Ok(rooms)
    }

    /// Number of active rooms free for `stay`.
    pub async fn count_available(&self, stay: &StayDates) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rooms r
            WHERE r.is_active = 1
              AND r.id NOT IN (
                  SELECT room_id FROM reservations
                  WHERE status != 'cancelled'
                    AND check_in_date <= ?2
                    AND check_out_date >= ?1
              )
            "#,
        )
        .bind(stay.check_in)
        .bind(stay.check_out)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Inserts a new room.
    pub async fn insert(&self, room: &Room) -> DbResult<()> {
        debug!(room_id = %room.id, room_number = %room.room_number, "Inserting room");

        sqlx::query(
            r#"
            INSERT INTO rooms (
                id, hotel_id, room_number, category, capacity, base_price_cents,
                description, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&room.id)
        .bind(&room.hotel_id)
        .bind(&room.room_number)
        .bind(room.category)
        .bind(room.capacity)
        .bind(room.base_price_cents)
        .bind(&room.description)
        .bind(room.is_active)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a room's editable fields.
    ///
    /// Existing reservations keep the price they were booked at.
    pub async fn update(&self, room: &Room) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE rooms SET
                room_number = ?2,
                category = ?3,
                capacity = ?4,
                base_price_cents = ?5,
                description = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&room.id)
        .bind(&room.room_number)
        .bind(room.category)
        .bind(room.capacity)
        .bind(room.base_price_cents)
        .bind(&room.description)
        .bind(room.is_active)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", &room.id));
        }

        Ok(())
    }

    /// Soft-deletes a room. It stays referenced by past reservations.
    pub async fn deactivate(&self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE rooms SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", id));
        }

        debug!(room_id = %id, "Room deactivated");
        Ok(())
    }

    /// Count of active rooms.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
