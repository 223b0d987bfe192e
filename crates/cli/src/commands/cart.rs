//! Cart and checkout commands.

use causehive_client::CartEntry;
use causehive_core::{Amount, CartItemId, CauseId, Email};

use super::output::{line, money};
use super::{CliError, Context};

pub async fn show(ctx: &Context, cart_id: Option<&str>) -> Result<(), CliError> {
    let cart = ctx.client.get_cart(cart_id).await?;
    if cart.items.is_empty() {
        line(cart.message.as_deref().unwrap_or("Cart is empty"));
        return Ok(());
    }
    match (&cart.cart_id, cart.status()) {
        (Some(id), Some(status)) => line(format_args!("Cart {id} ({status})")),
        (Some(id), None) => line(format_args!("Cart {id}")),
        _ => {}
    }
    for item in &cart.items {
        line(format_args!(
            "#{}  cause {}  {} x {} = {}",
            item.id,
            item.cause_id,
            money(item.donation_amount),
            item.quantity,
            money(item.line_total())
        ));
    }
    line(format_args!("Total: {}", money(cart.total())));
    Ok(())
}

pub async fn add(
    ctx: &Context,
    cause_id: CauseId,
    amount: Amount,
    quantity: u32,
    cart_id: Option<&str>,
) -> Result<(), CliError> {
    let entry = CartEntry {
        cause_id,
        donation_amount: amount,
        quantity,
    };
    let added = ctx.client.add_to_cart(&entry, cart_id).await?;
    match added.cart_id {
        Some(id) => line(format_args!("Added to cart {id}")),
        None => line("Added to cart"),
    }
    Ok(())
}

pub async fn update(
    ctx: &Context,
    item: CartItemId,
    quantity: u32,
    cart_id: Option<&str>,
) -> Result<(), CliError> {
    let message = ctx.client.update_cart_item(item, quantity, cart_id).await?;
    line(message.as_deref().unwrap_or("Cart item updated"));
    Ok(())
}

pub async fn remove(ctx: &Context, item: CartItemId, cart_id: Option<&str>) -> Result<(), CliError> {
    ctx.client.remove_from_cart(item, cart_id).await?;
    line(format_args!("Removed item #{item}"));
    Ok(())
}

pub async fn checkout(ctx: &Context, email: Option<&Email>, cart_id: Option<&str>) -> Result<(), CliError> {
    let session = ctx.client.checkout(email, cart_id).await?;
    if let Some(total) = session.total_amount {
        line(format_args!("Total: {}", money(total)));
    }
    line(format_args!("Complete payment at: {}", session.authorization_url));
    if let Some(reference) = &session.reference {
        line(format_args!("Reference: {reference} (verify with `hive payments verify`)"));
    }
    Ok(())
}
