use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Cents;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Upi,
    NetBanking,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::NetBanking => "NET_BANKING",
            PaymentMethod::Wallet => "WALLET",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CARD" => Some(PaymentMethod::Card),
            "UPI" => Some(PaymentMethod::Upi),
            "NET_BANKING" => Some(PaymentMethod::NetBanking),
            "WALLET" => Some(PaymentMethod::Wallet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Succeeded => "SUCCEEDED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "SUCCEEDED" => Some(PaymentStatus::Succeeded),
            "FAILED" => Some(PaymentStatus::Failed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reference: String,
    pub method: PaymentMethod,
    pub amount_cents: Cents,
    pub status: PaymentStatus,
    /// Provider-side transaction id once the gateway responds.
    pub gateway_txn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub reference: String,
    pub amount_cents: Cents,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub balance_cents: Cents,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerKind {
    Credit,
    Debit,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Credit => "CREDIT",
            LedgerKind::Debit => "DEBIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREDIT" => Some(LedgerKind::Credit),
            "DEBIT" => Some(LedgerKind::Debit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub reference: String,
    pub kind: LedgerKind,
    pub amount_cents: Cents,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Gateway-facing view of a charge attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub booking_id: Uuid,
    pub reference: String,
    pub amount_cents: Cents,
    pub method: PaymentMethod,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Submit a charge to the provider and return its final status.
    async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>>;

    /// Return money to the original instrument.
    async fn refund(
        &self,
        payment_reference: &str,
        amount_cents: Cents,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>>;
}
