use clap::{Parser, Subcommand};

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// AuthGate - refresh-token session lifecycle service
#[derive(Parser, Debug)]
#[command(name = "authgate")]
#[command(version)]
#[command(about = "Refresh-token session lifecycle service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<String>,

    /// Deployment environment
    #[arg(long, value_name = "ENV", help = "Environment: production, development")]
    pub env: Option<String>,

    /// HTTP listen address
    #[arg(long, value_name = "ADDRESS")]
    pub host: Option<String>,

    /// HTTP listen port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database connection URL (empty selects the in-memory store)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// JWT signing secret
    #[arg(long, value_name = "SECRET")]
    pub jwt_secret: Option<String>,

    /// Pre-shared key for the admin session API
    #[arg(long, value_name = "KEY")]
    pub service_key: Option<String>,

    /// Refresh-session lifetime in seconds
    #[arg(long, value_name = "SECS")]
    pub refresh_ttl_secs: Option<i64>,

    /// Log level
    #[arg(long, value_name = "LEVEL", help = "Level: trace, debug, info, warn, error")]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_name = "FORMAT", help = "Format: pretty, json, compact")]
    pub log_format: Option<String>,

    /// Verbose output (repeatable: -v, -vv, -vvv)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Development mode (same as --env development --log-level debug --log-format pretty)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run pending database migrations and exit
    Migrate,
    /// Write a default configuration file
    GenerateConfig {
        #[arg(value_name = "PATH", default_value = "config.toml")]
        path: String,
    },
    /// Validate a configuration file
    ValidateConfig {
        #[arg(value_name = "PATH", default_value = "config.toml")]
        path: String,
    },
    /// Print the merged configuration
    ShowConfig,
}

impl Cli {
    /// Effective log level, honoring quiet, dev mode and verbosity.
    pub fn get_log_level(&self) -> Option<String> {
        if self.quiet {
            return Some("error".to_string());
        }

        if self.dev {
            return Some("debug".to_string());
        }

        if let Some(level) = &self.log_level {
            return Some(level.clone());
        }

        match self.verbose {
            0 => None,
            1 => Some("info".to_string()),
            2 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }

    pub fn get_log_format(&self) -> Option<String> {
        if self.dev {
            return Some("pretty".to_string());
        }
        self.log_format.clone()
    }
}
