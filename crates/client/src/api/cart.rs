//! The donation cart.
//!
//! Anonymous donors are identified by a cart ID the server hands out on the
//! first add. Every cart call takes an optional explicit ID, falls back to
//! the persisted one, and omits the field when neither exists. Any cart ID
//! the server returns is persisted for the next call.

use causehive_core::{Amount, CartItemId, CauseId, Email};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use super::response_message;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiError;
use crate::models::{CartAddition, CartView, PaymentSession};

const CART_PATH: &str = "/api/cart/";
const ADD_PATH: &str = "/api/cart/add/";
const CHECKOUT_PATH: &str = "/api/cart/checkout/";

/// A cause to add to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartEntry {
    pub cause_id: CauseId,
    pub donation_amount: Amount,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
struct AddToCartRequest<'a> {
    cause_id: CauseId,
    donation_amount: Amount,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CartItemRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CheckoutRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_id: Option<&'a str>,
}

impl ApiClient {
    /// Fetch the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: Option<&str>) -> Result<CartView, ApiError> {
        let path = match self.resolve_cart_id(cart_id) {
            Some(id) => format!("{CART_PATH}?cart_id={}", urlencoding::encode(&id)),
            None => CART_PATH.to_owned(),
        };
        let cart: CartView = self.request_json(Method::GET, &path, RequestBody::Empty).await?;
        self.remember_cart_id(cart.cart_id.as_deref());
        Ok(cart)
    }

    /// Add a cause to the cart. Adding a cause already in the cart raises
    /// its quantity server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the entry.
    #[instrument(skip(self, entry), fields(cause_id = %entry.cause_id))]
    pub async fn add_to_cart(
        &self,
        entry: &CartEntry,
        cart_id: Option<&str>,
    ) -> Result<CartAddition, ApiError> {
        let cart_id = self.resolve_cart_id(cart_id);
        let body = RequestBody::json(&AddToCartRequest {
            cause_id: entry.cause_id,
            donation_amount: entry.donation_amount,
            quantity: entry.quantity.max(1),
            cart_id: cart_id.as_deref(),
        })?;

        let added: CartAddition = self.request_json(Method::POST, ADD_PATH, body).await?;
        self.remember_cart_id(added.cart_id.as_deref());
        Ok(added)
    }

    /// Change the quantity of a cart line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the line does not exist.
    #[instrument(skip(self), fields(item_id = %item))]
    pub async fn update_cart_item(
        &self,
        item: CartItemId,
        quantity: u32,
        cart_id: Option<&str>,
    ) -> Result<Option<String>, ApiError> {
        let cart_id = self.resolve_cart_id(cart_id);
        let body = RequestBody::json(&CartItemRequest {
            cart_id: cart_id.as_deref(),
            quantity: Some(quantity),
        })?;
        let path = format!("/api/cart/donations/{item}/");
        let response = self.request(Method::PUT, &path, body).await?;
        Ok(response_message(response))
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the line does not exist.
    #[instrument(skip(self), fields(item_id = %item))]
    pub async fn remove_from_cart(
        &self,
        item: CartItemId,
        cart_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let cart_id = self.resolve_cart_id(cart_id);
        let body = RequestBody::json(&CartItemRequest {
            cart_id: cart_id.as_deref(),
            quantity: None,
        })?;
        let path = format!("/api/cart/donations/{item}/remove/");
        self.request(Method::DELETE, &path, body).await?;
        Ok(())
    }

    /// Check out the cart and start a payment.
    ///
    /// Anonymous donors must supply an email. The returned payment reference
    /// is persisted so the payment can be verified later.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty, the email is missing, or the
    /// request fails.
    #[instrument(skip(self, email))]
    pub async fn checkout(
        &self,
        email: Option<&Email>,
        cart_id: Option<&str>,
    ) -> Result<PaymentSession, ApiError> {
        let cart_id = self.resolve_cart_id(cart_id);
        let body = RequestBody::json(&CheckoutRequest {
            email: email.map(Email::as_str),
            cart_id: cart_id.as_deref(),
        })?;

        let session: PaymentSession = self.request_json(Method::POST, CHECKOUT_PATH, body).await?;
        self.remember_payment_reference(session.reference.as_deref());
        info!(reference = ?session.reference, "Checkout started");
        Ok(session)
    }
}
