use causehive_core::Email;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::response_message;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;

const SUBSCRIBE_PATH: &str = "/api/newsletter/subscribe/";

impl ApiClient {
    /// Subscribe an address to the newsletter.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn subscribe_newsletter(&self, email: &Email) -> Result<Option<String>, ApiError> {
        let body = RequestBody::Json(json!({ "email": email.as_str() }));
        let response = self.request(Method::POST, SUBSCRIBE_PATH, body).await?;
        Ok(response_message(response))
    }
}
