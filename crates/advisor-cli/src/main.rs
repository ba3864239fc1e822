use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod client;
mod commands;

use client::Overrides;

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "Financial Advisor AI - chat client for the advisor backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config file and ADVISOR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the session credential (overrides ADVISOR_SESSION_DIR)
    #[arg(long, global = true)]
    session_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Google sign-in URL
    Login,
    /// Open a client location (e.g. an OAuth callback URL) and follow it
    Open {
        /// Full URL or path such as `/login/success?token=...`
        location: String,
    },
    /// Show the signed-in user and linked integrations
    Whoami,
    /// Send a chat message
    Send {
        text: String,
        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },
    /// List past chat sessions
    Sessions,
    /// Print the message history of a session
    History { session_id: String },
    /// Delete the message history of a session
    ClearHistory { session_id: String },
    /// Show or replace the ongoing instructions
    Instructions {
        /// New instructions; omit to print the current ones
        text: Option<String>,
    },
    /// Sign out and forget the stored credential
    Logout,
    /// Check the backend health endpoint
    Health,
    /// Post a sample payload to the email webhook test endpoint
    WebhookTest {
        /// JSON payload
        payload: String,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = Overrides {
        api_url: cli.api_url,
        session_dir: cli.session_dir,
    };

    let connect = || client::Client::connect(&overrides);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config::init()?,
            ConfigAction::Show => commands::config::show(&overrides)?,
        },
        Commands::Login => commands::auth::login(&connect()?),
        Commands::Open { location } => commands::auth::open(&connect()?, &location).await?,
        Commands::Whoami => commands::auth::whoami(&connect()?).await?,
        Commands::Logout => commands::auth::logout(&connect()?).await,
        Commands::Send { text, session } => {
            commands::chat::send(&connect()?, &text, session.as_deref()).await?
        }
        Commands::Sessions => commands::chat::sessions(&connect()?).await?,
        Commands::History { session_id } => {
            commands::chat::history(&connect()?, &session_id).await?
        }
        Commands::ClearHistory { session_id } => {
            commands::chat::clear_history(&connect()?, &session_id).await?
        }
        Commands::Instructions { text } => {
            commands::chat::instructions(&connect()?, text.as_deref()).await?
        }
        Commands::Health => commands::ops::health(&connect()?).await?,
        Commands::WebhookTest { payload } => {
            commands::ops::webhook_test(&connect()?, &payload).await?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
