use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use voyago_core::payment::{
    LedgerKind, Payment, PaymentMethod, PaymentStatus, Refund, Wallet, WalletTransaction,
};
use voyago_core::repository::{DebitOutcome, PaymentRepository, RepoError, WalletRepository};

pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    reference: String,
    method: String,
    amount_cents: i64,
    status: String,
    gateway_txn: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, RepoError> {
        Ok(Payment {
            id: self.id,
            booking_id: self.booking_id,
            reference: self.reference,
            method: PaymentMethod::parse(&self.method)
                .ok_or_else(|| format!("unknown payment method: {}", self.method))?,
            amount_cents: self.amount_cents,
            status: PaymentStatus::parse(&self.status)
                .ok_or_else(|| format!("unknown payment status: {}", self.status))?,
            gateway_txn: self.gateway_txn,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefundRow {
    id: Uuid,
    payment_id: Uuid,
    booking_id: Uuid,
    reference: String,
    amount_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl RefundRow {
    fn into_refund(self) -> Result<Refund, RepoError> {
        Ok(Refund {
            id: self.id,
            payment_id: self.payment_id,
            booking_id: self.booking_id,
            reference: self.reference,
            amount_cents: self.amount_cents,
            status: PaymentStatus::parse(&self.status)
                .ok_or_else(|| format!("unknown payment status: {}", self.status))?,
            created_at: self.created_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, booking_id, reference, method, amount_cents, status, \
     gateway_txn, created_at, updated_at";

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, reference, method, amount_cents, status,
                gateway_txn, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(&payment.reference)
        .bind(payment.method.as_str())
        .bind(payment.amount_cents)
        .bind(payment.status.as_str())
        .bind(&payment.gateway_txn)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(payment.id)
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, RepoError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PaymentRow::into_payment).transpose()
    }

    async fn get_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, RepoError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE reference = $1",
            PAYMENT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PaymentRow::into_payment).transpose()
    }

    async fn latest_payment_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<Payment>, RepoError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE booking_id = $1 ORDER BY created_at DESC LIMIT 1",
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PaymentRow::into_payment).transpose()
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        gateway_txn: Option<&str>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE payments SET status = $1, gateway_txn = COALESCE($2, gateway_txn), \
             updated_at = NOW() WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(gateway_txn)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_refund(&self, refund: &Refund) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO refunds (id, payment_id, booking_id, reference, amount_cents, status,
                created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(refund.id)
        .bind(refund.payment_id)
        .bind(refund.booking_id)
        .bind(&refund.reference)
        .bind(refund.amount_cents)
        .bind(refund.status.as_str())
        .bind(refund.created_at)
        .execute(&self.pool)
        .await?;

        Ok(refund.id)
    }

    async fn list_refunds(&self, booking_id: Uuid) -> Result<Vec<Refund>, RepoError> {
        let rows: Vec<RefundRow> = sqlx::query_as(
            "SELECT id, payment_id, booking_id, reference, amount_cents, status, created_at \
             FROM refunds WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RefundRow::into_refund).collect()
    }
}

pub struct StoreWalletRepository {
    pool: PgPool,
}

impl StoreWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    customer_id: Uuid,
    balance_cents: i64,
    updated_at: DateTime<Utc>,
}

impl WalletRow {
    fn into_wallet(self) -> Wallet {
        Wallet {
            id: self.id,
            customer_id: self.customer_id,
            balance_cents: self.balance_cents,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    wallet_id: Uuid,
    reference: String,
    kind: String,
    amount_cents: i64,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<WalletTransaction, RepoError> {
        Ok(WalletTransaction {
            id: self.id,
            wallet_id: self.wallet_id,
            reference: self.reference,
            kind: LedgerKind::parse(&self.kind)
                .ok_or_else(|| format!("unknown ledger kind: {}", self.kind))?,
            amount_cents: self.amount_cents,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

impl StoreWalletRepository {
    async fn record_entry(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        wallet_id: Uuid,
        kind: LedgerKind,
        amount_cents: i64,
        reference: &str,
        note: Option<&str>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (id, wallet_id, reference, kind, amount_cents, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(wallet_id)
        .bind(reference)
        .bind(kind.as_str())
        .bind(amount_cents)
        .bind(note)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl WalletRepository for StoreWalletRepository {
    async fn get_or_create(&self, customer_id: Uuid) -> Result<Wallet, RepoError> {
        let row: WalletRow = sqlx::query_as(
            r#"
            INSERT INTO wallets (id, customer_id, balance_cents)
            VALUES ($1, $2, 0)
            ON CONFLICT (customer_id) DO UPDATE SET customer_id = EXCLUDED.customer_id
            RETURNING id, customer_id, balance_cents, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_wallet())
    }

    async fn credit(
        &self,
        customer_id: Uuid,
        amount_cents: i64,
        reference: &str,
        note: Option<&str>,
    ) -> Result<Wallet, RepoError> {
        self.get_or_create(customer_id).await?;

        let mut tx = self.pool.begin().await?;

        let row: WalletRow = sqlx::query_as(
            r#"
            UPDATE wallets SET balance_cents = balance_cents + $1, updated_at = NOW()
            WHERE customer_id = $2
            RETURNING id, customer_id, balance_cents, updated_at
            "#,
        )
        .bind(amount_cents)
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::record_entry(&mut tx, row.id, LedgerKind::Credit, amount_cents, reference, note)
            .await?;

        tx.commit().await?;
        Ok(row.into_wallet())
    }

    async fn try_debit(
        &self,
        customer_id: Uuid,
        amount_cents: i64,
        reference: &str,
        note: Option<&str>,
    ) -> Result<DebitOutcome, RepoError> {
        self.get_or_create(customer_id).await?;

        let mut tx = self.pool.begin().await?;

        // Row lock keeps concurrent debits from overdrawing.
        let row: WalletRow = sqlx::query_as(
            "SELECT id, customer_id, balance_cents, updated_at FROM wallets \
             WHERE customer_id = $1 FOR UPDATE",
        )
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await?;

        if row.balance_cents < amount_cents {
            tx.rollback().await?;
            return Ok(DebitOutcome::Insufficient {
                balance_cents: row.balance_cents,
            });
        }

        let updated: WalletRow = sqlx::query_as(
            r#"
            UPDATE wallets SET balance_cents = balance_cents - $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, customer_id, balance_cents, updated_at
            "#,
        )
        .bind(amount_cents)
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        Self::record_entry(&mut tx, row.id, LedgerKind::Debit, amount_cents, reference, note)
            .await?;

        tx.commit().await?;
        Ok(DebitOutcome::Debited(updated.into_wallet()))
    }

    async fn list_transactions(
        &self,
        customer_id: Uuid,
        kind: Option<LedgerKind>,
    ) -> Result<Vec<WalletTransaction>, RepoError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.wallet_id, t.reference, t.kind, t.amount_cents, t.note, t.created_at
            FROM wallet_transactions t
            JOIN wallets w ON w.id = t.wallet_id
            WHERE w.customer_id = $1 AND ($2::text IS NULL OR t.kind = $2)
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(customer_id)
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }
}
