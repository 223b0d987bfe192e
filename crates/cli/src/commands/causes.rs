//! Cause browsing and management.

use std::path::PathBuf;

use causehive_client::models::Cause;
use causehive_client::{FilePart, NewCause};
use causehive_core::{Amount, CauseId};

use super::output::{line, money};
use super::{CliError, Context};

fn summary(cause: &Cause) -> String {
    let progress = cause
        .progress_percent()
        .map(|p| format!(" {p}%"))
        .unwrap_or_default();
    let target = cause.target_amount.map(money).unwrap_or_default();
    format!("{}  {} [{}] {target}{progress}", cause.id, cause.name, cause.status)
}

pub async fn list(ctx: &Context, page: u32) -> Result<(), CliError> {
    let causes = ctx.client.list_causes(page).await?;
    if causes.items().is_empty() {
        line("No causes found");
    }
    for cause in causes.items() {
        line(summary(cause));
    }
    if causes.has_next() {
        line(format_args!("More on page {}", page.max(1) + 1));
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: CauseId) -> Result<(), CliError> {
    let cause = ctx.client.get_cause(id).await?;
    line(summary(&cause));
    if let Some(category) = cause.category_name() {
        line(format_args!("Category: {category}"));
    }
    if let Some(raised) = cause.current_amount {
        line(format_args!("Raised: {}", money(raised)));
    }
    if !cause.description.is_empty() {
        line("");
        line(&cause.description);
    }
    Ok(())
}

#[derive(Debug)]
pub struct CreateArgs {
    pub name: String,
    pub description: String,
    pub target: Option<Amount>,
    pub category: Option<String>,
    pub cover: Option<PathBuf>,
}

pub async fn create(ctx: &Context, args: CreateArgs) -> Result<(), CliError> {
    let cover_image = match args.cover {
        Some(path) => Some(FilePart::from_path(path).await?),
        None => None,
    };
    let cause = NewCause {
        target_amount: args.target,
        category: args.category,
        cover_image,
        ..NewCause::new(args.name, args.description)
    };

    let created = ctx.client.create_cause(&cause).await?;
    line(format_args!("Created cause {} ({})", created.id, created.status));
    Ok(())
}

pub async fn delete(ctx: &Context, id: CauseId) -> Result<(), CliError> {
    ctx.client.delete_cause(id).await?;
    line(format_args!("Deleted cause {id}"));
    Ok(())
}
