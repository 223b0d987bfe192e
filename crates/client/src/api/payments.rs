//! Payment initiation and verification.

use causehive_core::{Amount, DonationId, Email, UserId};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use super::response_message;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::PaymentSession;

const INITIATE_PATH: &str = "/api/payments/initiate/";

/// Payment for an existing donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub email: Email,
    pub amount: Amount,
    pub donation_id: DonationId,
    /// Defaults to the signed-in user.
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
struct InitiateRequest<'a> {
    email: &'a str,
    amount: Amount,
    donation_id: DonationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl ApiClient {
    /// Start a payment and return the hosted payment page.
    ///
    /// A returned reference is persisted for [`ApiClient::verify_payment`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider declines it.
    #[instrument(skip(self, payment), fields(donation_id = %payment.donation_id))]
    pub async fn initiate_payment(&self, payment: &PaymentRequest) -> Result<PaymentSession, ApiError> {
        let user_id = payment
            .user_id
            .map(|id| id.to_string())
            .or_else(|| self.stored_user_id());
        let body = RequestBody::json(&InitiateRequest {
            email: payment.email.as_str(),
            amount: payment.amount,
            donation_id: payment.donation_id,
            user_id,
        })?;

        let session: PaymentSession = self.request_json(Method::POST, INITIATE_PATH, body).await?;
        self.remember_payment_reference(session.reference.as_deref());
        Ok(session)
    }

    /// Verify a payment with the provider.
    ///
    /// Without an explicit reference, the last persisted one is used.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if no reference is available, or
    /// an HTTP error if the payment was not successful.
    #[instrument(skip(self))]
    pub async fn verify_payment(&self, reference: Option<&str>) -> Result<Option<String>, ApiError> {
        let reference = reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned)
            .or_else(|| self.last_payment_reference())
            .ok_or_else(|| ApiError::InvalidRequest("no payment reference to verify".to_owned()))?;

        let path = format!("/api/payments/verify/{}/", urlencoding::encode(&reference));
        let response = self.request(Method::GET, &path, RequestBody::Empty).await?;
        info!(%reference, "Payment verified");
        Ok(response_message(response))
    }
}
