//! Fundraising causes.

use causehive_core::{Amount, CauseId, UserId};
use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument};

use super::page_path;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::{Cause, Listing};
use crate::multipart::{FilePart, MultipartForm};

const LIST_PATH: &str = "/api/causes/list/";
const CREATE_PATH: &str = "/api/causes/create/";

/// A cause to create.
#[derive(Debug, Clone)]
pub struct NewCause {
    pub name: String,
    pub description: String,
    /// Defaults to the signed-in user.
    pub organizer_id: Option<UserId>,
    pub target_amount: Option<Amount>,
    pub category: Option<String>,
    pub cover_image: Option<FilePart>,
}

impl NewCause {
    /// A cause with only the required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            organizer_id: None,
            target_amount: None,
            category: None,
            cover_image: None,
        }
    }

    /// The multipart body for this cause, with `organizer` used when no
    /// explicit organizer is set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the category cannot be encoded.
    pub fn to_form(&self, organizer: Option<&str>) -> Result<MultipartForm, ApiError> {
        let organizer = self
            .organizer_id
            .map(|id| id.to_string())
            .or_else(|| organizer.map(str::to_owned));
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|name| json!({ "name": name }));

        Ok(MultipartForm::new()
            .text("name", self.name.as_str())
            .text("description", self.description.as_str())
            .optional_text("organizer_id", organizer)
            .optional_text("target_amount", self.target_amount.map(|a| a.value().to_string()))
            .optional_json("category_data", category.as_ref())?
            .optional_file("cover_image", self.cover_image.clone()))
    }
}

impl ApiClient {
    /// List causes, one page at a time (pages start at 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_causes(&self, page: u32) -> Result<Listing<Cause>, ApiError> {
        self.request_json(Method::GET, &page_path(LIST_PATH, page), RequestBody::Empty)
            .await
    }

    /// Fetch one cause.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the cause does not exist.
    #[instrument(skip(self), fields(cause_id = %id))]
    pub async fn get_cause(&self, id: CauseId) -> Result<Cause, ApiError> {
        let path = format!("/api/causes/details/{id}/");
        self.request_json(Method::GET, &path, RequestBody::Empty).await
    }

    /// Create a cause. New causes start under review.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects a field.
    #[instrument(skip(self, cause), fields(name = %cause.name))]
    pub async fn create_cause(&self, cause: &NewCause) -> Result<Cause, ApiError> {
        let form = cause.to_form(self.stored_user_id().as_deref())?;
        let created: Cause = self
            .request_json(Method::POST, CREATE_PATH, RequestBody::Multipart(form))
            .await?;
        info!(cause_id = %created.id, "Cause created");
        Ok(created)
    }

    /// Delete a cause.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller may not delete it.
    #[instrument(skip(self), fields(cause_id = %id))]
    pub async fn delete_cause(&self, id: CauseId) -> Result<(), ApiError> {
        let path = format!("/api/causes/delete/{id}/");
        self.request(Method::DELETE, &path, RequestBody::Empty).await?;
        Ok(())
    }
}
