//! # Reservation Repository
//!
//! Storage for reservations and the conditional insert that keeps two
//! bookings of one room from overlapping.
//!
//! ## Guarded Insert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO reservations (...)                                        │
//! │  SELECT ...                                                             │
//! │  WHERE NOT EXISTS (live reservation of the same room that overlaps)    │
//! │                                                                         │
//! │  rows_affected = 1 → booked                                            │
//! │  rows_affected = 0 → another writer got there first                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The in-process room lock in `BookingService` covers writers in this
//! process; the guard covers writers elsewhere sharing the database file.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lodging_core::{Money, Reservation, ReservationStats, StayDates};

const RESERVATION_COLUMNS: &str = "id, booking_reference, confirmation_number, room_id, user_id, \
     check_in_date, check_out_date, guest_count, total_amount_cents, status, \
     guest_name, guest_email, guest_phone, special_requests, \
     created_at, updated_at, cancelled_at, actual_check_in, actual_check_out";

/// Repository for reservation database operations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Gets a reservation by ID inside an open transaction.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1");
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(reservation)
    }

    /// Live reservations of `room_id` that overlap `stay`.
    pub async fn overlapping(
        conn: &mut SqliteConnection,
        room_id: &str,
        stay: &StayDates,
    ) -> DbResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE room_id = ?1 AND status != 'cancelled' \
               AND check_in_date <= ?3 AND check_out_date >= ?2 \
             ORDER BY check_in_date"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(room_id)
            .bind(stay.check_in)
            .bind(stay.check_out)
            .fetch_all(conn)
            .await?;
        Ok(reservations)
    }

    /// Inserts `reservation` unless a live reservation of the same room
    /// overlaps it. Returns whether the row was written.
    pub async fn insert_if_available(
        conn: &mut SqliteConnection,
        reservation: &Reservation,
    ) -> DbResult<bool> {
        debug!(
            reservation_id = %reservation.id,
            room_id = %reservation.room_id,
            check_in = %reservation.check_in_date,
            check_out = %reservation.check_out_date,
            "Inserting reservation"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO reservations (
                id, booking_reference, confirmation_number, room_id, user_id,
                check_in_date, check_out_date, guest_count, total_amount_cents, status,
                guest_name, guest_email, guest_phone, special_requests,
                created_at, updated_at, cancelled_at, actual_check_in, actual_check_out
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                   ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            WHERE NOT EXISTS (
                SELECT 1 FROM reservations
                WHERE room_id = ?4
                  AND status != 'cancelled'
                  AND check_in_date <= ?7
                  AND check_out_date >= ?6
            )
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.booking_reference)
        .bind(&reservation.confirmation_number)
        .bind(&reservation.room_id)
        .bind(&reservation.user_id)
        .bind(reservation.check_in_date)
        .bind(reservation.check_out_date)
        .bind(reservation.guest_count)
        .bind(reservation.total_amount_cents)
        .bind(reservation.status)
        .bind(&reservation.guest_name)
        .bind(&reservation.guest_email)
        .bind(&reservation.guest_phone)
        .bind(&reservation.special_requests)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .bind(reservation.cancelled_at)
        .bind(reservation.actual_check_in)
        .bind(reservation.actual_check_out)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Writes the lifecycle fields (status and its timestamps).
    pub async fn save_status(conn: &mut SqliteConnection, reservation: &Reservation) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                status = ?2,
                updated_at = ?3,
                cancelled_at = ?4,
                actual_check_in = ?5,
                actual_check_out = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&reservation.id)
        .bind(reservation.status)
        .bind(reservation.updated_at)
        .bind(reservation.cancelled_at)
        .bind(reservation.actual_check_in)
        .bind(reservation.actual_check_out)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reservation", &reservation.id));
        }

        debug!(reservation_id = %reservation.id, status = %reservation.status, "Reservation status saved");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    /// Front-desk lookup.
    pub async fn get_by_confirmation_number(&self, confirmation_number: &str) -> DbResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE confirmation_number = ?1");
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(confirmation_number.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(reservation)
    }

    pub async fn get_by_booking_reference(&self, booking_reference: &str) -> DbResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE booking_reference = ?1");
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(booking_reference.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(reservation)
    }

    /// A user's reservations, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = ?1 \
             ORDER BY created_at DESC, id DESC"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    /// Reservations checking in between `start` and `end`, both inclusive.
    pub async fn list_by_check_in_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE check_in_date BETWEEN ?1 AND ?2 \
             ORDER BY check_in_date, created_at"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    /// Read-only availability check.
    pub async fn is_room_available(&self, room_id: &str, stay: &StayDates) -> DbResult<bool> {
        let conflicts: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE room_id = ?1
              AND status != 'cancelled'
              AND check_in_date <= ?3
              AND check_out_date >= ?2
            "#,
        )
        .bind(room_id)
        .bind(stay.check_in)
        .bind(stay.check_out)
        .fetch_one(&self.pool)
        .await?;

        Ok(conflicts == 0)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Confirmed plus checked-in reservations.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE status IN ('confirmed', 'checked_in')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of total amounts over completed stays.
    pub async fn total_revenue(&self) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount_cents), 0) FROM reservations WHERE status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_cents(cents))
    }

    pub async fn stats(&self) -> DbResult<ReservationStats> {
        Ok(ReservationStats {
            total_reservations: self.count().await?,
            active_reservations: self.count_active().await?,
            total_revenue: self.total_revenue().await?,
        })
    }
}
