//! Login, logout, registration and profile commands.

use std::path::PathBuf;

use causehive_client::{FilePart, ProfileUpdate, Registration};
use causehive_core::Email;
use secrecy::SecretString;
use tracing::warn;

use super::output::{json, line};
use super::{CliError, Context};

pub async fn login(ctx: &Context, email: &Email, password: SecretString) -> Result<(), CliError> {
    let response = ctx.client.login(email, &password).await?;
    match response.user {
        Some(user) => line(format_args!("Logged in as {} {} <{}>", user.first_name, user.last_name, user.email)),
        None => line(format_args!("Logged in as {email}")),
    }
    Ok(())
}

pub async fn google_login(ctx: &Context, token: SecretString) -> Result<(), CliError> {
    ctx.client.google_login(&token).await?;
    line("Logged in with Google");
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.client.logout().await?;
    line("Logged out");
    Ok(())
}

pub async fn register(ctx: &Context, registration: Registration) -> Result<(), CliError> {
    let user = ctx.client.register(&registration).await?;
    line(format_args!("Registered {} (id {}). Log in to continue.", user.email, user.id));
    Ok(())
}

pub async fn reset_password(ctx: &Context, email: &Email) -> Result<(), CliError> {
    let message = ctx.client.request_password_reset(email).await?;
    line(message.as_deref().unwrap_or("Password reset requested"));
    Ok(())
}

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_LEEWAY_SECS: i64 = 60;

pub async fn refresh(ctx: &Context) -> Result<(), CliError> {
    if ctx.client.refresh_access_token().await.is_none() {
        return Err(CliError::InvalidArgument(
            "Could not refresh the session; log in again".to_owned(),
        ));
    }
    match ctx.client.access_token_claims().await.and_then(|c| c.expires_at()) {
        Some(at) => line(format_args!("Access token refreshed, valid until {at}")),
        None => line("Access token refreshed"),
    }
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    match ctx.client.stored_user_id() {
        Some(user_id) => line(format_args!("User ID: {user_id}")),
        None => line("Not logged in"),
    }
    if !ctx.client.has_auth_token().await {
        return Ok(());
    }

    let expiring = ctx
        .client
        .access_token_claims()
        .await
        .is_some_and(|c| c.expires_within(EXPIRY_LEEWAY_SECS));
    if expiring && ctx.client.refresh_access_token().await.is_none() {
        warn!("Access token is expired and could not be refreshed");
    }
    if let Some(at) = ctx.client.access_token_claims().await.and_then(|c| c.expires_at()) {
        line(format_args!("Token valid until: {at}"));
    }

    let profile = ctx.client.get_profile().await?;
    if let Some(name) = profile.full_name.filter(|n| !n.trim().is_empty()) {
        line(format_args!("Name: {name}"));
    }
    if let Some(bio) = profile.bio.filter(|b| !b.trim().is_empty()) {
        line(format_args!("Bio: {bio}"));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ProfileArgs {
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub withdrawal_wallet: Option<String>,
    pub picture: Option<PathBuf>,
}

pub async fn update_profile(ctx: &Context, args: ProfileArgs) -> Result<(), CliError> {
    let profile_picture = match args.picture {
        Some(path) => Some(FilePart::from_path(path).await?),
        None => None,
    };
    let update = ProfileUpdate {
        bio: args.bio,
        phone_number: args.phone_number,
        address: args.address,
        withdrawal_wallet: args.withdrawal_wallet,
        profile_picture,
    };
    if update.to_form().is_empty() {
        return Err(CliError::InvalidArgument("Nothing to update".to_owned()));
    }

    let profile = ctx.client.update_profile(&update).await?;
    json(&serde_json::to_value(&profile).unwrap_or_default());
    Ok(())
}

pub async fn subscribe(ctx: &Context, email: &Email) -> Result<(), CliError> {
    let message = ctx.client.subscribe_newsletter(email).await?;
    line(message.as_deref().unwrap_or("Subscribed"));
    Ok(())
}
