//! Notifications, including the live feed.

use std::sync::Arc;

use causehive_client::models::LiveNotification;
use causehive_client::socket::{ReconnectingSocket, SocketHandlers};
use causehive_core::NotificationId;
use tracing::{info, warn};

use super::output::{json, line};
use super::{CliError, Context};

pub async fn list(ctx: &Context, page: u32) -> Result<(), CliError> {
    let notifications = ctx.client.list_notifications(page).await?;
    if notifications.items().is_empty() {
        line("No notifications");
    }
    for note in notifications.items() {
        let marker = if note.is_read { ' ' } else { '*' };
        line(format_args!("{marker} {}  {}", note.id, note.message));
    }
    Ok(())
}

pub async fn mark_read(ctx: &Context, id: NotificationId) -> Result<(), CliError> {
    ctx.client.mark_notification_read(id).await?;
    line(format_args!("Marked {id} as read"));
    Ok(())
}

pub async fn metrics(ctx: &Context) -> Result<(), CliError> {
    json(&ctx.client.dashboard_metrics().await?);
    Ok(())
}

/// Print live notifications until interrupted or the socket gives up.
pub async fn watch(ctx: &Context) -> Result<(), CliError> {
    let url = Arc::new(ctx.config.ws_url.clone());
    let open_url = Arc::clone(&url);

    let handlers = SocketHandlers::new()
        .on_open(move || info!(url = %open_url, "Watching for notifications"))
        .on_message(|text| match LiveNotification::parse(&text) {
            Some(note) => match note.cause.filter(|c| !c.is_empty()) {
                Some(cause) => line(format_args!("{} ({cause})", note.message)),
                None => line(&note.message),
            },
            None => tracing::debug!(%text, "Ignoring non-notification message"),
        })
        .on_close(|info| {
            if let Some(info) = info {
                info!(code = info.code, reason = %info.reason, "Notification feed closed");
            }
        })
        .on_error(|e| warn!(error = %e, "Notification feed error"));

    let socket = ReconnectingSocket::connect(url.as_str(), ctx.config.reconnect, handlers);

    let interrupted = tokio::select! {
        () = socket.closed() => false,
        result = tokio::signal::ctrl_c() => {
            result?;
            socket.close();
            true
        }
    };

    if interrupted {
        Ok(())
    } else {
        Err(CliError::FeedUnavailable(url.to_string()))
    }
}
