use std::sync::Arc;

use voyago_core::money::Cents;
use voyago_core::payment::{ChargeRequest, PaymentAdapter, PaymentStatus};

/// Routes charge and refund calls to the configured gateway adapter.
pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
}

impl PaymentOrchestrator {
    pub fn new(adapter: Arc<dyn PaymentAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        self.adapter.charge(request).await
    }

    pub async fn refund(
        &self,
        payment_reference: &str,
        amount_cents: Cents,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        self.adapter.refund(payment_reference, amount_cents).await
    }
}

/// In-process stand-in for a real payment provider. Declines charges
/// whose reference carries the `-FAIL` suffix so tests can exercise the
/// failure path.
pub struct SimulatedGateway;

#[async_trait::async_trait]
impl PaymentAdapter for SimulatedGateway {
    async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        if request.amount_cents <= 0 {
            return Err("charge amount must be positive".into());
        }
        if request.reference.ends_with("-FAIL") {
            return Ok(PaymentStatus::Failed);
        }
        Ok(PaymentStatus::Succeeded)
    }

    async fn refund(
        &self,
        _payment_reference: &str,
        amount_cents: Cents,
    ) -> Result<PaymentStatus, Box<dyn std::error::Error + Send + Sync>> {
        if amount_cents <= 0 {
            return Err("refund amount must be positive".into());
        }
        Ok(PaymentStatus::Refunded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use voyago_core::payment::PaymentMethod;

    fn request(reference: &str, amount: Cents) -> ChargeRequest {
        ChargeRequest {
            booking_id: Uuid::new_v4(),
            reference: reference.to_string(),
            amount_cents: amount,
            method: PaymentMethod::Card,
        }
    }

    #[tokio::test]
    async fn test_charge_succeeds() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(SimulatedGateway));
        let status = orchestrator
            .charge(&request("PAY-ABC123", 10_000))
            .await
            .unwrap();
        assert_eq!(status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_fail_suffix_declines() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(SimulatedGateway));
        let status = orchestrator
            .charge(&request("PAY-FAIL", 10_000))
            .await
            .unwrap();
        assert_eq!(status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_zero_amount_is_an_error() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(SimulatedGateway));
        assert!(orchestrator.charge(&request("PAY-ABC123", 0)).await.is_err());
    }
}
