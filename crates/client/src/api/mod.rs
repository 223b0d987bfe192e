//! Typed endpoint methods on [`ApiClient`](crate::ApiClient), grouped by
//! backend resource.
//!
//! Every method is a thin layer over [`ApiClient::request`](crate::ApiClient::request):
//! it builds the path and body, and decodes the response into a model from
//! [`crate::models`].

mod admin;
mod auth;
mod cart;
mod causes;
mod donations;
mod newsletter;
mod payments;
mod profile;

pub use auth::Registration;
pub use cart::CartEntry;
pub use causes::NewCause;
pub use donations::DonationRequest;
pub use payments::PaymentRequest;
pub use profile::ProfileUpdate;

use serde_json::Value;

use crate::client::ApiResponse;

/// Path of a paginated list endpoint.
fn page_path(base: &str, page: u32) -> String {
    format!("{base}?page={}", page.max(1))
}

/// Human-readable message from an acknowledgement response, if any.
fn response_message(response: ApiResponse) -> Option<String> {
    match response {
        ApiResponse::Json(Value::Object(map)) => ["message", "detail", "status"]
            .iter()
            .find_map(|key| map.get(*key)?.as_str().map(str::to_owned)),
        ApiResponse::Json(_) => None,
        ApiResponse::Text(text) => Some(text).filter(|t| !t.trim().is_empty()),
    }
}
