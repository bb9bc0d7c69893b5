//! Replichat CLI
//!
//! Command-line tools for running the pull server and inspecting stores.
//!
//! # Commands
//!
//! - `serve` - Run the HTTP pull server
//! - `put` - Write a message (as the push path would)
//! - `delete` - Delete a message, leaving a tombstone
//! - `pull` - Compute a pull response locally and print it
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use replichat_server::{ServerConfig, DEFAULT_PULL_PATH};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replichat sync server and store tools.
#[derive(Parser)]
#[command(name = "replichat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database (in-memory when omitted for `serve`)
    #[arg(global = true, short, long)]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP pull server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Route serving pull requests
        #[arg(long, default_value = DEFAULT_PULL_PATH)]
        pull_path: String,

        /// Maximum request body size in bytes
        #[arg(long, default_value = "65536")]
        max_body_bytes: usize,

        /// Log request and response bodies at debug level
        #[arg(long)]
        log_payloads: bool,

        /// Seed the two demo messages into an empty store
        #[arg(long)]
        demo: bool,
    },

    /// Write a message
    Put {
        /// Message ID
        #[arg(long)]
        id: String,

        /// Author name
        #[arg(long)]
        from: String,

        /// Message body
        #[arg(long)]
        content: String,

        /// Ordering key
        #[arg(long)]
        order: i64,

        /// Client whose mutation this is
        #[arg(long, requires = "mutation_id")]
        client_id: Option<String>,

        /// Mutation ID to acknowledge for the client
        #[arg(long, requires = "client_id")]
        mutation_id: Option<u64>,
    },

    /// Delete a message
    Delete {
        /// Message ID
        #[arg(long)]
        id: String,

        /// Client whose mutation this is
        #[arg(long, requires = "mutation_id")]
        client_id: Option<String>,

        /// Mutation ID to acknowledge for the client
        #[arg(long, requires = "client_id")]
        mutation_id: Option<u64>,
    },

    /// Compute a pull response and print it
    Pull {
        /// Client ID
        #[arg(long)]
        client_id: String,

        /// Cookie from the client's previous pull (omit for a fresh client)
        #[arg(long)]
        cookie: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            bind,
            pull_path,
            max_body_bytes,
            log_payloads,
            demo,
        } => {
            let config = ServerConfig::new(bind)
                .with_pull_path(pull_path)
                .with_max_body_bytes(max_body_bytes)
                .with_payload_logging(log_payloads);
            commands::serve::run(cli.db.as_deref(), config, demo)?;
        }
        Commands::Put {
            id,
            from,
            content,
            order,
            client_id,
            mutation_id,
        } => {
            let path = cli.db.ok_or("Database path required for put")?;
            let ack = client_id.zip(mutation_id);
            commands::write::put(&path, id, from, content, order, ack)?;
        }
        Commands::Delete {
            id,
            client_id,
            mutation_id,
        } => {
            let path = cli.db.ok_or("Database path required for delete")?;
            let ack = client_id.zip(mutation_id);
            commands::write::delete(&path, id, ack)?;
        }
        Commands::Pull {
            client_id,
            cookie,
            format,
        } => {
            let path = cli.db.ok_or("Database path required for pull")?;
            commands::pull::run(&path, &client_id, cookie, &format)?;
        }
        Commands::Version => {
            println!("Replichat CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Pull protocol v{}", replichat_protocol::PULL_VERSION);
        }
    }

    Ok(())
}
