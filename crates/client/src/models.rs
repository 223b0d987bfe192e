//! Wire models for CauseHive backend payloads.
//!
//! Response models are lenient: optional fields default, and unknown fields
//! are ignored, because the backend services evolve independently of this
//! client.

use causehive_core::{CartItemId, CartStatus, CauseId, CauseStatus, NotificationId, PaymentStatus, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Listings
// =============================================================================

/// A list response: either a bare JSON array or a paginated envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    /// Bare array.
    Items(Vec<T>),
    /// `{count, next, previous, results}` envelope.
    Page(Page<T>),
}

/// A page of a paginated list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Listing<T> {
    /// The items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        match self {
            Self::Items(items) => items,
            Self::Page(page) => &page.results,
        }
    }

    /// Consume the listing and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) => items,
            Self::Page(page) => page.results,
        }
    }

    /// Whether the server reported a further page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        match self {
            Self::Items(_) => false,
            Self::Page(page) => page.next.is_some(),
        }
    }

    /// Total item count when the server reports one.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        match self {
            Self::Items(items) => u64::try_from(items.len()).ok(),
            Self::Page(page) => page.count,
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Access/refresh token pair returned by login.
#[derive(Clone, Deserialize)]
pub struct TokenPair {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(alias = "refresh_token")]
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Login response: the token pair, optionally alongside the user record.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    #[serde(default)]
    pub user: Option<User>,
}

/// Response of the token refresh endpoint.
#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

// =============================================================================
// Profile
// =============================================================================

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub withdrawal_wallet: Option<String>,
}

// =============================================================================
// Causes
// =============================================================================

/// A fundraising cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cause {
    pub id: CauseId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organizer_id: Option<UserId>,
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    #[serde(default)]
    pub current_amount: Option<Decimal>,
    #[serde(default)]
    pub status: CauseStatus,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Either a nested category object or a bare category name.
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Cause {
    /// Category name, whether the category is nested or a bare string.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        match self.category.as_ref()? {
            Value::String(name) => Some(name),
            Value::Object(map) => map.get("name")?.as_str(),
            _ => None,
        }
    }

    /// Fraction of the target raised so far, in percent, capped at 100.
    #[must_use]
    pub fn progress_percent(&self) -> Option<Decimal> {
        let target = self.target_amount.filter(|t| *t > Decimal::ZERO)?;
        let current = self.current_amount.unwrap_or_default();
        Some((current * Decimal::ONE_HUNDRED / target).min(Decimal::ONE_HUNDRED).round_dp(1))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A line in the donation cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cause_id: CauseId,
    pub donation_amount: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Amount times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.donation_amount * Decimal::from(self.quantity)
    }
}

/// The cart record embedded in a cart response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: CartStatus,
}

/// Response of the cart endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartView {
    #[serde(default)]
    pub cart_id: Option<String>,
    /// `null` while the visitor has no cart.
    #[serde(default)]
    pub cart: Option<CartRecord>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CartView {
    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Lifecycle status of the cart, `None` when there is no cart yet.
    #[must_use]
    pub fn status(&self) -> Option<CartStatus> {
        self.cart.as_ref().map(|cart| cart.status)
    }
}

/// Response of adding a cause to the cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartAddition {
    #[serde(default)]
    pub cart_id: Option<String>,
    #[serde(default)]
    pub item: Option<CartItem>,
}

/// A hosted payment page the donor must visit to complete payment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentSession {
    pub authorization_url: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_id: Option<Value>,
}

// =============================================================================
// Donations
// =============================================================================

/// A recorded donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Value,
    #[serde(default)]
    pub cause_id: Option<CauseId>,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub donated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Aggregate donation figures for the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct DonationStatistics {
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub total_donations: u64,
}

// =============================================================================
// Notifications
// =============================================================================

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub notif_type: Option<String>,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A notification pushed over the live socket.
///
/// Socket messages carry a `type` tag; only `"notification"` messages are
/// notifications.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveNotification {
    #[serde(default)]
    pub id: Option<Value>,
    pub message: String,
    #[serde(default)]
    pub cause: Option<String>,
}

impl LiveNotification {
    /// Parse a raw socket message, returning `None` for anything that is
    /// not a well-formed notification.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        if value.get("type")?.as_str()? != "notification" {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}
