//! CauseHive CLI - Browse causes, manage the donation cart, and follow live
//! notifications from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (tokens are kept in the session file)
//! hive login -e ama@example.com --password '...'
//!
//! # Browse causes and add one to the cart
//! hive causes list
//! hive cart add 0d8f6a52-3c1e-4a8e-9d40-6f5d2b7c1e90 25
//!
//! # Check out as an anonymous donor
//! hive cart checkout --email ama@example.com
//!
//! # Follow live notifications
//! hive notifications watch
//! ```
//!
//! # Environment Variables
//!
//! - `CAUSEHIVE_API_URL` / `API_URL` - REST base URL
//! - `CAUSEHIVE_WS_URL` / `WEBSOCKET_URL` - Notification socket URL
//! - `CAUSEHIVE_SESSION_FILE` - Session file (default: `.causehive-session.json`)
//! - `SENTRY_DSN` - Enables error reporting when set
//! - `RUST_LOG` - Log filter (default: `causehive_cli=info,causehive_client=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use causehive_client::{ApiClient, ClientConfig, FileSessionStore, Registration};
use causehive_core::{Amount, CartItemId, CauseId, DonationId, Email, NotificationId};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::{CliError, Context, account, cart, causes, donations, notifications};

const DEFAULT_SESSION_FILE: &str = ".causehive-session.json";

#[derive(Parser)]
#[command(name = "hive")]
#[command(author, version, about = "CauseHive donation platform CLI")]
struct Cli {
    /// Session file holding tokens and the cart ID
    #[arg(long, global = true, env = "CAUSEHIVE_SESSION_FILE", default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: Email,

        #[arg(long, env = "CAUSEHIVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in with a Google OAuth access token
    GoogleLogin {
        #[arg(long, env = "CAUSEHIVE_GOOGLE_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Log out and forget the local session
    Logout,
    /// Create an account
    Register {
        #[arg(short, long)]
        email: Email,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, env = "CAUSEHIVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Request a password reset email
    ResetPassword {
        #[arg(short, long)]
        email: Email,
    },
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Show the signed-in user
    Whoami,
    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        bio: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        wallet: Option<String>,

        /// Profile picture (JPEG, PNG or GIF)
        #[arg(long)]
        picture: Option<PathBuf>,
    },
    /// Browse and manage causes
    Causes {
        #[command(subcommand)]
        action: CauseAction,
    },
    /// Manage the donation cart
    Cart {
        /// Cart to use instead of the stored one
        #[arg(long, global = true)]
        cart_id: Option<String>,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Donate directly to a cause
    Donate {
        cause_id: CauseId,

        amount: Amount,

        /// Contact email for anonymous donations
        #[arg(short, long)]
        email: Option<Email>,
    },
    /// Donation history and totals
    Donations {
        #[command(subcommand)]
        action: DonationAction,
    },
    /// Start or verify payments
    Payments {
        #[command(subcommand)]
        action: PaymentAction,
    },
    /// Stored and live notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
    /// Show the latest dashboard report
    Metrics,
    /// Subscribe an email address to the newsletter
    Subscribe { email: Email },
}

#[derive(Subcommand)]
enum CauseAction {
    /// List causes
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one cause
    Show { id: CauseId },
    /// Create a cause
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        target: Option<Amount>,

        #[arg(short, long)]
        category: Option<String>,

        /// Cover image (JPEG, PNG or GIF)
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    /// Delete a cause
    Delete { id: CauseId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a cause to the cart
    Add {
        cause_id: CauseId,

        amount: Amount,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change the quantity of a cart item (0 removes it)
    Update { item: CartItemId, quantity: u32 },
    /// Remove a cart item
    Remove { item: CartItemId },
    /// Check out and print the payment link
    Checkout {
        /// Required for anonymous donors
        #[arg(short, long)]
        email: Option<Email>,
    },
}

#[derive(Subcommand)]
enum DonationAction {
    /// List past donations
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show donation totals
    Stats,
}

#[derive(Subcommand)]
enum PaymentAction {
    /// Start a payment for an existing donation
    Initiate {
        donation_id: DonationId,

        amount: Amount,

        #[arg(short, long)]
        email: Email,
    },
    /// Verify a payment (defaults to the last checkout)
    Verify { reference: Option<String> },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List stored notifications
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Mark a notification as read
    Read { id: NotificationId },
    /// Print live notifications until interrupted
    Watch,
}

/// Initialize Sentry error tracking when `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.trim().is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "causehive_cli=info,causehive_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let store = Arc::new(FileSessionStore::open(cli.session_file));
    let client = ApiClient::new(&config, store)?;
    let ctx = Context { config, client };

    match cli.command {
        Commands::Login { email, password } => {
            account::login(&ctx, &email, SecretString::from(password)).await?;
        }
        Commands::GoogleLogin { token } => {
            account::google_login(&ctx, SecretString::from(token)).await?;
        }
        Commands::Logout => account::logout(&ctx).await?,
        Commands::Register {
            email,
            first_name,
            last_name,
            password,
        } => {
            let registration = Registration {
                first_name,
                last_name,
                email,
                password: SecretString::from(password),
            };
            account::register(&ctx, registration).await?;
        }
        Commands::ResetPassword { email } => account::reset_password(&ctx, &email).await?,
        Commands::Refresh => account::refresh(&ctx).await?,
        Commands::Whoami => account::whoami(&ctx).await?,
        Commands::Profile {
            bio,
            phone,
            address,
            wallet,
            picture,
        } => {
            let args = account::ProfileArgs {
                bio,
                phone_number: phone,
                address,
                withdrawal_wallet: wallet,
                picture,
            };
            account::update_profile(&ctx, args).await?;
        }
        Commands::Causes { action } => match action {
            CauseAction::List { page } => causes::list(&ctx, page).await?,
            CauseAction::Show { id } => causes::show(&ctx, id).await?,
            CauseAction::Create {
                name,
                description,
                target,
                category,
                cover,
            } => {
                let args = causes::CreateArgs {
                    name,
                    description,
                    target,
                    category,
                    cover,
                };
                causes::create(&ctx, args).await?;
            }
            CauseAction::Delete { id } => causes::delete(&ctx, id).await?,
        },
        Commands::Cart { cart_id, action } => {
            let cart_id = cart_id.as_deref();
            match action {
                CartAction::Show => cart::show(&ctx, cart_id).await?,
                CartAction::Add {
                    cause_id,
                    amount,
                    quantity,
                } => cart::add(&ctx, cause_id, amount, quantity, cart_id).await?,
                CartAction::Update { item, quantity } => {
                    cart::update(&ctx, item, quantity, cart_id).await?;
                }
                CartAction::Remove { item } => cart::remove(&ctx, item, cart_id).await?,
                CartAction::Checkout { email } => {
                    cart::checkout(&ctx, email.as_ref(), cart_id).await?;
                }
            }
        }
        Commands::Donate {
            cause_id,
            amount,
            email,
        } => donations::donate(&ctx, cause_id, amount, email).await?,
        Commands::Donations { action } => match action {
            DonationAction::List { page } => donations::history(&ctx, page).await?,
            DonationAction::Stats => donations::statistics(&ctx).await?,
        },
        Commands::Payments { action } => match action {
            PaymentAction::Initiate {
                donation_id,
                amount,
                email,
            } => donations::pay(&ctx, donation_id, amount, email).await?,
            PaymentAction::Verify { reference } => {
                donations::verify(&ctx, reference.as_deref()).await?;
            }
        },
        Commands::Notifications { action } => match action {
            NotificationAction::List { page } => notifications::list(&ctx, page).await?,
            NotificationAction::Read { id } => notifications::mark_read(&ctx, id).await?,
            NotificationAction::Watch => notifications::watch(&ctx).await?,
        },
        Commands::Metrics => notifications::metrics(&ctx).await?,
        Commands::Subscribe { email } => account::subscribe(&ctx, &email).await?,
    }
    Ok(())
}
