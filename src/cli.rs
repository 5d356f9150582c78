use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hacksteader")]
#[command(author, version, about = "Hacksteader database schema and steader management")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding the config
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending schema migrations
    Migrate {
        /// Stop after this migration version
        #[arg(long)]
        to: Option<usize>,
    },

    /// Show the current and latest schema version
    Status,

    /// Verify the live schema against the expected layout
    Check,

    /// Print the expected tables, foreign keys and composite types
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or inspect hacksteaders
    #[command(subcommand)]
    Steader(SteaderCommand),

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum SteaderCommand {
    /// Create a hacksteader with a profile and empty land
    New {
        /// User id of the new steader
        user_id: String,

        /// Number of empty tiles (defaults to the configured starting tiles)
        #[arg(long)]
        tiles: Option<usize>,
    },

    /// Print a hacksteader with their land and inventory
    Show {
        /// User id of the steader
        user_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
