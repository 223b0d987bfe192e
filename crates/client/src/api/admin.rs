//! Notifications and dashboard metrics.

use causehive_core::NotificationId;
use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use super::page_path;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::{Listing, Notification};

const NOTIFICATIONS_PATH: &str = "/api/admin/notifications/";
const METRICS_PATH: &str = "/api/admin/dashboard/metrics/";

impl ApiClient {
    /// Stored notifications, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_notifications(&self, page: u32) -> Result<Listing<Notification>, ApiError> {
        self.request_json(Method::GET, &page_path(NOTIFICATIONS_PATH, page), RequestBody::Empty)
            .await
    }

    /// Mark a notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the notification is unknown.
    #[instrument(skip(self), fields(notification_id = %id))]
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<(), ApiError> {
        let path = format!("{NOTIFICATIONS_PATH}{id}/mark-read/");
        self.request(Method::POST, &path, RequestBody::Empty).await?;
        Ok(())
    }

    /// The most recent dashboard report.
    ///
    /// The report shape is owned by the reporting service and returned as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard_metrics(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, METRICS_PATH, RequestBody::Empty)
            .await
    }
}
