use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use voyago_core::booking::{Booking, BookingStatus, HistoryEntry, ServiceKind};
use voyago_core::repository::{BookingRepository, DashboardSummary, RepoError, ServiceSummary};
use voyago_shared::pii::Masked;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    service_kind: String,
    service_id: Uuid,
    customer_id: Uuid,
    status: String,
    contact_email: String,
    pnr: Option<String>,
    unit_count: i32,
    total_cents: i64,
    paid_cents: i64,
    refunded_cents: i64,
    details: serde_json::Value,
    service_start: DateTime<Utc>,
    service_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, RepoError> {
        Ok(Booking {
            id: self.id,
            reference: self.reference,
            service_kind: ServiceKind::parse(&self.service_kind)
                .ok_or_else(|| format!("unknown service kind: {}", self.service_kind))?,
            service_id: self.service_id,
            customer_id: self.customer_id,
            status: BookingStatus::parse(&self.status)
                .ok_or_else(|| format!("unknown booking status: {}", self.status))?,
            contact_email: Masked::new(self.contact_email),
            pnr: self.pnr,
            unit_count: self.unit_count,
            total_cents: self.total_cents,
            paid_cents: self.paid_cents,
            refunded_cents: self.refunded_cents,
            details: self.details,
            service_start: self.service_start,
            service_end: self.service_end,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    booking_id: Uuid,
    from_status: Option<String>,
    to_status: String,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_entry(self) -> Result<HistoryEntry, RepoError> {
        let from_status = match self.from_status {
            Some(s) => Some(
                BookingStatus::parse(&s).ok_or_else(|| format!("unknown booking status: {}", s))?,
            ),
            None => None,
        };
        Ok(HistoryEntry {
            id: self.id,
            booking_id: self.booking_id,
            from_status,
            to_status: BookingStatus::parse(&self.to_status)
                .ok_or_else(|| format!("unknown booking status: {}", self.to_status))?,
            note: self.note,
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ServiceSummaryRow {
    service_kind: String,
    bookings: i64,
    revenue_cents: i64,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_bookings: i64,
    pending: i64,
    confirmed: i64,
    cancelled: i64,
    expired: i64,
    gross_revenue_cents: i64,
    refunded_cents: i64,
}

const BOOKING_COLUMNS: &str = "id, reference, service_kind, service_id, customer_id, status, \
     contact_email, pnr, unit_count, total_cents, paid_cents, refunded_cents, details, \
     service_start, service_end, created_at, updated_at";

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, reference, service_kind, service_id, customer_id, status,
                contact_email, pnr, unit_count, total_cents, paid_cents, refunded_cents, details,
                service_start, service_end, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.service_kind.as_str())
        .bind(booking.service_id)
        .bind(booking.customer_id)
        .bind(booking.status.as_str())
        .bind(booking.contact_email.inner())
        .bind(&booking.pnr)
        .bind(booking.unit_count)
        .bind(booking.total_cents)
        .bind(booking.paid_cents)
        .bind(booking.refunded_cents)
        .bind(&booking.details)
        .bind(booking.service_start)
        .bind(booking.service_end)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(booking.id)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Booking>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE reference = $1",
            BOOKING_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_bookings(&self, customer_id: Uuid) -> Result<Vec<Booking>, RepoError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE customer_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_amounts(
        &self,
        id: Uuid,
        paid_cents: i64,
        refunded_cents: i64,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE bookings SET paid_cents = $1, refunded_cents = $2, updated_at = NOW() \
             WHERE id = $3",
        )
        .bind(paid_cents)
        .bind(refunded_cents)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_history(&self, entry: &HistoryEntry) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO booking_history (id, booking_id, from_status, to_status, note, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.booking_id)
        .bind(entry.from_status.map(|s| s.as_str()))
        .bind(entry.to_status.as_str())
        .bind(&entry.note)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_history(&self, booking_id: Uuid) -> Result<Vec<HistoryEntry>, RepoError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT id, booking_id, from_status, to_status, note, recorded_at \
             FROM booking_history WHERE booking_id = $1 ORDER BY recorded_at ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryRow::into_entry).collect()
    }

    async fn list_unpaid_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, RepoError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE status = 'PENDING' AND created_at < $1",
            BOOKING_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, RepoError> {
        let row: SummaryRow = sqlx::query_as(
            r#"
            SELECT COUNT(*) AS total_bookings,
                   COUNT(*) FILTER (WHERE status = 'PENDING') AS pending,
                   COUNT(*) FILTER (WHERE status = 'CONFIRMED') AS confirmed,
                   COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled,
                   COUNT(*) FILTER (WHERE status = 'EXPIRED') AS expired,
                   COALESCE(SUM(paid_cents), 0) AS gross_revenue_cents,
                   COALESCE(SUM(refunded_cents), 0) AS refunded_cents
            FROM bookings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let service_rows: Vec<ServiceSummaryRow> = sqlx::query_as(
            r#"
            SELECT service_kind, COUNT(*) AS bookings,
                   COALESCE(SUM(paid_cents), 0) AS revenue_cents
            FROM bookings
            GROUP BY service_kind
            ORDER BY service_kind
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let by_service = service_rows
            .into_iter()
            .map(|r| {
                Ok(ServiceSummary {
                    service: ServiceKind::parse(&r.service_kind)
                        .ok_or_else(|| format!("unknown service kind: {}", r.service_kind))?,
                    bookings: r.bookings,
                    revenue_cents: r.revenue_cents,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(DashboardSummary {
            total_bookings: row.total_bookings,
            pending: row.pending,
            confirmed: row.confirmed,
            cancelled: row.cancelled,
            expired: row.expired,
            gross_revenue_cents: row.gross_revenue_cents,
            refunded_cents: row.refunded_cents,
            by_service,
        })
    }
}
