//! # Payment Repository
//!
//! Payment rows are written by the ledger through `BookingService`; this
//! repository only persists what the ledger decided.
//!
//! The partial unique index `idx_payments_one_pending` rejects a second
//! pending row for a reservation with a `UniqueViolation`.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lodging_core::Payment;

const PAYMENT_COLUMNS: &str = "id, reservation_id, amount_cents, method, status, transaction_ref, \
                               gateway_order_id, external_ref, processed_at, created_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// All payments of a reservation, oldest first, inside a transaction.
    pub async fn fetch_for_reservation(
        conn: &mut SqliteConnection,
        reservation_id: &str,
    ) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reservation_id = ?1 \
             ORDER BY created_at, rowid"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(reservation_id)
            .fetch_all(conn)
            .await?;
        Ok(payments)
    }

    pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        debug!(
            payment_id = %payment.id,
            reservation_id = %payment.reservation_id,
            amount_cents = payment.amount_cents,
            method = %payment.method,
            "Inserting payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, reservation_id, amount_cents, method, status, transaction_ref,
                gateway_order_id, external_ref, processed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.reservation_id)
        .bind(payment.amount_cents)
        .bind(&payment.method)
        .bind(payment.status)
        .bind(&payment.transaction_ref)
        .bind(&payment.gateway_order_id)
        .bind(&payment.external_ref)
        .bind(payment.processed_at)
        .bind(payment.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Writes the mutable fields of an existing payment.
    pub async fn save(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                method = ?2,
                status = ?3,
                gateway_order_id = ?4,
                external_ref = ?5,
                processed_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.method)
        .bind(payment.status)
        .bind(&payment.gateway_order_id)
        .bind(&payment.external_ref)
        .bind(payment.processed_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", &payment.id));
        }

        debug!(payment_id = %payment.id, status = %payment.status, "Payment saved");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    pub async fn get_by_transaction_ref(&self, transaction_ref: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_ref = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(transaction_ref)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    /// All payments of a reservation, oldest first.
    pub async fn list_for_reservation(&self, reservation_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_for_reservation(&mut conn, reservation_id).await
    }

    /// The settled (positive) charge of a reservation, if any.
    pub async fn completed_charge(&self, reservation_id: &str) -> DbResult<Option<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE reservation_id = ?1 AND status = 'completed' AND amount_cents > 0 \
             ORDER BY created_at LIMIT 1"
        );
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(reservation_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }
}
