//! Command-line interface for duel_server.

use clap::{Parser, Subcommand};
use duel_server::StoreBackend;

/// Duel Server - server-authoritative tic-tac-toe sessions over HTTP
#[derive(Parser, Debug)]
#[command(name = "duel_server")]
#[command(about = "Two-player tic-tac-toe session server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to [default: 3000]
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist) [default: duel.db]
        #[arg(long)]
        db_path: Option<String>,

        /// Session store backend [default: sqlite]
        #[arg(long, value_enum)]
        store: Option<StoreBackend>,

        /// TOML config file; flags override its values
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Path to the database file
        #[arg(long, default_value = "duel.db")]
        db_path: String,
    },
}
