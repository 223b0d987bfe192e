//! Sign-up, login and logout.

use causehive_core::{Email, SessionKey};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::response_message;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::{LoginResponse, User};

const LOGIN_PATH: &str = "/api/user/auth/login/";
const SIGNUP_PATH: &str = "/api/user/auth/signup/";
const LOGOUT_PATH: &str = "/api/user/auth/logout/";
const GOOGLE_PATH: &str = "/api/user/google/";
const PASSWORD_RESET_PATH: &str = "/api/user/password-reset/";

/// New account details.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: SecretString,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
    password2: &'a str,
}

impl ApiClient {
    /// Log in with email and password.
    ///
    /// On success both tokens are persisted, the user ID is decoded from the
    /// access token, and the access token becomes this client's bearer.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<LoginResponse, ApiError> {
        let body = RequestBody::json(&LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        })?;

        let response: LoginResponse = self.request_json(Method::POST, LOGIN_PATH, body).await?;
        self.install_tokens(&response).await;
        info!("Logged in");
        Ok(response)
    }

    /// Log in with a Google OAuth access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip_all)]
    pub async fn google_login(&self, google_token: &SecretString) -> Result<LoginResponse, ApiError> {
        let body = RequestBody::Json(json!({ "access_token": google_token.expose_secret() }));
        let response: LoginResponse = self.request_json(Method::POST, GOOGLE_PATH, body).await?;
        self.install_tokens(&response).await;
        info!("Logged in with Google");
        Ok(response)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the registration (for example
    /// an email already in use) or the request fails.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let password = registration.password.expose_secret();
        let body = RequestBody::json(&SignupRequest {
            email: registration.email.as_str(),
            first_name: &registration.first_name,
            last_name: &registration.last_name,
            password,
            password2: password,
        })?;
        self.request_json(Method::POST, SIGNUP_PATH, body).await
    }

    /// Ask the server to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_password_reset(&self, email: &Email) -> Result<Option<String>, ApiError> {
        let body = RequestBody::Json(json!({ "email": email.as_str() }));
        let response = self.request(Method::POST, PASSWORD_RESET_PATH, body).await?;
        Ok(response_message(response))
    }

    /// Log out on the server, then clear the local session.
    ///
    /// The local session is cleared even when the server call fails; the
    /// server error is still returned.
    ///
    /// # Errors
    ///
    /// Returns the server-side logout error, if any.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let body = match self.store().get(SessionKey::RefreshToken) {
            Some(refresh) => RequestBody::Json(json!({ "refresh": refresh })),
            None => RequestBody::Empty,
        };
        let result = self.request(Method::POST, LOGOUT_PATH, body).await;
        self.clear_session().await;

        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Server logout failed, local session cleared");
                Err(e)
            }
        }
    }

    async fn install_tokens(&self, response: &LoginResponse) {
        let access = SecretString::from(response.tokens.access.clone());
        let refresh = SecretString::from(response.tokens.refresh.clone());
        self.set_session_tokens(&access, &refresh).await;
    }
}
