use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sqlr-cli")]
#[command(about = "Command line console for a remote SQL runner service")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, env = "SQLR_PROFILE")]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Execute a SQL statement and show the result
    Query {
        /// Statement to execute; the profile's default query is used if omitted
        sql: Option<String>,
    },
    /// List the tables known to the service
    Tables,
    /// Show column metadata and sample rows for a table
    Preview {
        /// Table name
        table: String,
    },
    /// Interactive console session
    Console,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Login to the SQL runner service
    Login,
    /// Create a new account on the service
    Register,
    /// Logout and discard the stored token
    Logout,
    /// Show authentication status
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a configuration value on the active profile
    Set {
        /// Configuration key (service_url, username, default_query, timeout_seconds)
        key: String,
        /// Configuration value
        value: String,
    },
}
