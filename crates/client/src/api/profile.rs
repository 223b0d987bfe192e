//! The signed-in user's profile.

use reqwest::Method;
use tracing::instrument;

use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::Profile;
use crate::multipart::{FilePart, MultipartForm};

const PROFILE_PATH: &str = "/api/user/profile/";

/// Partial profile update. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub withdrawal_wallet: Option<String>,
    pub profile_picture: Option<FilePart>,
}

impl ProfileUpdate {
    /// The multipart body for this update.
    #[must_use]
    pub fn to_form(&self) -> MultipartForm {
        MultipartForm::new()
            .optional_text("bio", self.bio.as_deref())
            .optional_text("phone_number", self.phone_number.as_deref())
            .optional_text("address", self.address.as_deref())
            .optional_text("withdrawal_wallet", self.withdrawal_wallet.as_deref())
            .optional_file("profile_picture", self.profile_picture.clone())
    }
}

impl ApiClient {
    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not signed in.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<Profile, ApiError> {
        self.request_json(Method::GET, PROFILE_PATH, RequestBody::Empty)
            .await
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects a field.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let body = RequestBody::Multipart(update.to_form());
        self.request_json(Method::PATCH, PROFILE_PATH, body).await
    }
}
