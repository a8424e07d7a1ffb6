//! Tales CLI - browse and save travel tales from the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{ai, browse, logs, saved, session, status, upgrade};

/// Tales - travel experiences with guest, free and premium access
#[derive(Parser)]
#[command(name = "tales", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tier, quota and saved-item summary
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Show the current identity
    Whoami {
        #[arg(long)]
        json: bool,
    },

    /// Create an account and switch to it
    Signup {
        email: String,
        #[arg(long)]
        json: bool,
    },

    /// Sign in with an email address
    Signin {
        email: String,
        #[arg(long)]
        json: bool,
    },

    /// Start a new guest session
    Guest {
        #[arg(long)]
        json: bool,
    },

    /// Sign out of the current session
    Signout,

    /// Save a tale, or unsave it if already saved
    Save {
        /// Tale identifier
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// List saved tales
    Saved {
        /// Only show this kind (video, hotel, event, restaurant, attraction)
        #[arg(long)]
        kind: Option<String>,
        /// Case-insensitive text filter
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Remove every saved tale (trial saves are not refunded)
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        #[arg(long)]
        json: bool,
    },

    /// Use the AI travel companion once
    Ai {
        #[arg(long)]
        json: bool,
    },

    /// Upgrade to premium
    Upgrade {
        #[arg(long)]
        json: bool,
    },

    /// Restore the guest trial allotment
    ResetTrial {
        #[arg(long)]
        json: bool,
    },

    /// Browse the catalog
    Browse {
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Only featured tales
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::Whoami { .. } => "whoami",
            Commands::Signup { .. } => "signup",
            Commands::Signin { .. } => "signin",
            Commands::Guest { .. } => "guest",
            Commands::Signout => "signout",
            Commands::Save { .. } => "save",
            Commands::Saved { .. } => "saved",
            Commands::Clear { .. } => "clear",
            Commands::Ai { .. } => "ai",
            Commands::Upgrade { .. } => "upgrade",
            Commands::ResetTrial { .. } => "reset-trial",
            Commands::Browse { .. } => "browse",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TALES_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let logger = commands::get_logger();
    commands::log_command(&logger, cli.command.name());

    match run(cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, logger: &commands::Logger) -> Result<()> {
    match cli.command {
        Commands::Status { json } => status::run(json),
        Commands::Whoami { json } => status::whoami(json),
        Commands::Signup { email, json } => session::sign_up(&email, json),
        Commands::Signin { email, json } => session::sign_in(&email, json),
        Commands::Guest { json } => session::guest(json),
        Commands::Signout => session::sign_out(),
        Commands::Save { id, json } => saved::toggle(&id, json, logger),
        Commands::Saved { kind, search, json } => {
            saved::list(kind.as_deref(), search.as_deref(), json)
        }
        Commands::Clear { force, json } => saved::clear(force, json),
        Commands::Ai { json } => ai::run(json, logger),
        Commands::Upgrade { json } => upgrade::upgrade(json, logger),
        Commands::ResetTrial { json } => upgrade::reset_trial(json),
        Commands::Browse {
            kind,
            search,
            featured,
            json,
        } => browse::run(kind.as_deref(), search.as_deref(), featured, json),
        Commands::Logs { command } => logs::run(command),
    }
}
