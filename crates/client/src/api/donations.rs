//! Direct donations and donation history.

use causehive_core::{Amount, CauseId, CurrencyCode, Email};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::page_path;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::{Donation, DonationStatistics, Listing};

const DONATIONS_PATH: &str = "/api/donations/";
const STATISTICS_PATH: &str = "/api/donations/statistics/";

/// A one-off donation to a single cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationRequest {
    pub cause_id: CauseId,
    pub amount: Amount,
    pub currency: CurrencyCode,
    /// Contact email for anonymous donors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl DonationRequest {
    /// A donation in the default currency.
    #[must_use]
    pub fn new(cause_id: CauseId, amount: Amount) -> Self {
        Self {
            cause_id,
            amount,
            currency: CurrencyCode::default(),
            email: None,
        }
    }
}

impl ApiClient {
    /// Record a donation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self, donation), fields(cause_id = %donation.cause_id, amount = %donation.amount))]
    pub async fn donate(&self, donation: &DonationRequest) -> Result<Donation, ApiError> {
        let body = RequestBody::json(donation)?;
        self.request_json(Method::POST, DONATIONS_PATH, body).await
    }

    /// The signed-in user's donations, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_donations(&self, page: u32) -> Result<Listing<Donation>, ApiError> {
        self.request_json(Method::GET, &page_path(DONATIONS_PATH, page), RequestBody::Empty)
            .await
    }

    /// Totals over the signed-in user's donations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn donation_statistics(&self) -> Result<DonationStatistics, ApiError> {
        self.request_json(Method::GET, STATISTICS_PATH, RequestBody::Empty)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_defaults_to_cedis() {
        let request = DonationRequest::new(
            CauseId::from_str("0d8f6a52-3c1e-4a8e-9d40-6f5d2b7c1e90").unwrap(),
            Amount::from_str("10.50").unwrap(),
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "cause_id": "0d8f6a52-3c1e-4a8e-9d40-6f5d2b7c1e90",
                "amount": "10.5",
                "currency": "GHS"
            })
        );
    }
}
