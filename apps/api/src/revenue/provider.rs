//! Payout transfer providers, behind a trait so development environments
//! without Stripe credentials fall back to a simulated-success path.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected transfer (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Amount {0} cannot be expressed in cents")]
    BadAmount(Decimal),
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub payout_id: Uuid,
    pub destination: String,
    pub amount: Decimal,
    pub description: String,
}

/// The external transfer seam. Returns the provider's transfer reference on
/// success; any error leaves the payout to be marked `failed` by the caller.
#[async_trait]
pub trait PayoutProvider: Send + Sync {
    async fn transfer(&self, req: &TransferRequest) -> Result<String, TransferError>;
}

/// Converts a decimal dollar amount to integer cents for payment APIs.
pub fn to_cents(amount: Decimal) -> Result<i64, TransferError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or(TransferError::BadAmount(amount))
}

// ────────────────────────────────────────────────────────────────────────────
// Stripe transfers
// ────────────────────────────────────────────────────────────────────────────

const STRIPE_TRANSFERS_URL: &str = "https://api.stripe.com/v1/transfers";

#[derive(Debug, Deserialize)]
struct StripeTransfer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

pub struct StripeTransferProvider {
    client: reqwest::Client,
    secret_key: String,
}

impl StripeTransferProvider {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            secret_key,
        }
    }
}

#[async_trait]
impl PayoutProvider for StripeTransferProvider {
    async fn transfer(&self, req: &TransferRequest) -> Result<String, TransferError> {
        let cents = to_cents(req.amount)?;
        let payout_id = req.payout_id.to_string();
        let cents_str = cents.to_string();
        let form = [
            ("amount", cents_str.as_str()),
            ("currency", "usd"),
            ("destination", req.destination.as_str()),
            ("description", req.description.as_str()),
            ("metadata[payout_id]", payout_id.as_str()),
        ];

        let response = self
            .client
            .post(STRIPE_TRANSFERS_URL)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TransferError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let transfer: StripeTransfer = response.json().await?;
        info!(
            "Stripe transfer {} created for payout {}",
            transfer.id, req.payout_id
        );
        Ok(transfer.id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated provider (no Stripe key configured)
// ────────────────────────────────────────────────────────────────────────────

pub struct SimulatedPayoutProvider;

#[async_trait]
impl PayoutProvider for SimulatedPayoutProvider {
    async fn transfer(&self, req: &TransferRequest) -> Result<String, TransferError> {
        warn!(
            "Stripe not configured - simulating payout success for {}",
            req.payout_id
        );
        Ok(format!("sim_{}", req.payout_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_cents_exact() {
        assert_eq!(to_cents(dec!(50.00)).unwrap(), 5000);
        assert_eq!(to_cents(dec!(49.99)).unwrap(), 4999);
        assert_eq!(to_cents(dec!(0.01)).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_simulated_provider_always_succeeds() {
        let provider = SimulatedPayoutProvider;
        let req = TransferRequest {
            payout_id: Uuid::new_v4(),
            destination: "acct_123".to_string(),
            amount: dec!(75.00),
            description: "Payout".to_string(),
        };
        let reference = provider.transfer(&req).await.unwrap();
        assert!(reference.starts_with("sim_"));
    }
}
