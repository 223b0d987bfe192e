//! Donations and payments.

use causehive_client::{DonationRequest, PaymentRequest};
use causehive_core::{Amount, CauseId, DonationId, Email};

use super::output::{line, money};
use super::{CliError, Context};

pub async fn donate(
    ctx: &Context,
    cause_id: CauseId,
    amount: Amount,
    email: Option<Email>,
) -> Result<(), CliError> {
    let request = DonationRequest {
        email,
        ..DonationRequest::new(cause_id, amount)
    };
    let donation = ctx.client.donate(&request).await?;
    line(format_args!(
        "Donation {} of {} recorded ({:?})",
        donation.id,
        money(donation.amount),
        donation.status
    ));
    Ok(())
}

pub async fn history(ctx: &Context, page: u32) -> Result<(), CliError> {
    let donations = ctx.client.list_donations(page).await?;
    if donations.items().is_empty() {
        line("No donations yet");
    }
    for donation in donations.items() {
        let when = donation
            .donated_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let cause = donation
            .cause_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        line(format_args!(
            "{when}  {}  {cause}  {:?}",
            money(donation.amount),
            donation.status
        ));
    }
    Ok(())
}

pub async fn statistics(ctx: &Context) -> Result<(), CliError> {
    let stats = ctx.client.donation_statistics().await?;
    line(format_args!(
        "{} donations, {} in total",
        stats.total_donations,
        money(stats.total_amount)
    ));
    Ok(())
}

pub async fn pay(
    ctx: &Context,
    donation_id: DonationId,
    amount: Amount,
    email: Email,
) -> Result<(), CliError> {
    let request = PaymentRequest {
        email,
        amount,
        donation_id,
        user_id: None,
    };
    let session = ctx.client.initiate_payment(&request).await?;
    line(format_args!("Complete payment at: {}", session.authorization_url));
    Ok(())
}

pub async fn verify(ctx: &Context, reference: Option<&str>) -> Result<(), CliError> {
    let message = ctx.client.verify_payment(reference).await?;
    line(message.as_deref().unwrap_or("Payment verified"));
    Ok(())
}
