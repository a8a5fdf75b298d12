use crate::auth::RuntimeMode;
use crate::error::{Result, ServerError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::info;

/// Hard bounds for the refresh-session lifetime.
const MIN_REFRESH_TTL_SECS: i64 = 60;
const MAX_REFRESH_TTL_SECS: i64 = 90 * 24 * 3600;
/// Hard bounds for the access-token lifetime.
const MIN_ACCESS_TTL_SECS: i64 = 60;
const MAX_ACCESS_TTL_SECS: i64 = 24 * 3600;

/// Server configuration.
///
/// Lifetimes are plain integers of seconds, parsed and bounds-checked at
/// startup. Configuration is never evaluated as code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    pub host: String,
    /// HTTP listen port
    pub port: u16,
    /// Deployment environment: "production" or "development"
    pub environment: String,
    /// PostgreSQL connection string; empty selects the in-memory store
    pub database_url: String,
    /// JWT signing secret (required, must be non-empty)
    pub jwt_secret: String,
    /// Pre-shared key for the admin issue/revoke API (required)
    pub service_key: String,
    /// Refresh-session lifetime in seconds
    pub refresh_ttl_secs: i64,
    /// Access-token lifetime in seconds
    pub access_ttl_secs: i64,
    /// Per-operation session-store deadline in milliseconds
    pub store_timeout_ms: u64,
    /// Expiry sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Log level
    pub log_level: String,
    /// Log format: compact, pretty or json
    pub log_format: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3080,
            environment: "production".to_string(),
            database_url: String::new(),
            jwt_secret: String::new(),
            service_key: String::new(),
            refresh_ttl_secs: 7 * 24 * 3600,
            access_ttl_secs: 900,
            store_timeout_ms: 5_000,
            sweep_interval_secs: 300,
            log_level: "info".to_string(),
            log_format: None,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("cannot read config file: {:?}", path.as_ref()))?;

        let toml_config: TomlConfig =
            toml::from_str(&content).context("config file is not valid TOML")?;

        Ok(toml_config.into())
    }

    /// Merge settings from environment variables (`AUTHGATE_` prefix).
    pub fn merge_from_env(&mut self) {
        if let Ok(host) = env::var("AUTHGATE_HOST") {
            self.host = host;
        }
        if let Ok(port) = env::var("AUTHGATE_PORT") {
            self.port = port.parse().unwrap_or(self.port);
        }
        if let Ok(environment) = env::var("AUTHGATE_ENV") {
            self.environment = environment;
        }
        if let Ok(db_url) = env::var("DATABASE_URL") {
            self.database_url = db_url;
        }
        if let Ok(secret) = env::var("AUTHGATE_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Ok(service_key) = env::var("AUTHGATE_SERVICE_KEY") {
            self.service_key = service_key;
        }
        if let Ok(ttl) = env::var("AUTHGATE_REFRESH_TTL_SECS") {
            self.refresh_ttl_secs = ttl.parse().unwrap_or(self.refresh_ttl_secs);
        }
        if let Ok(ttl) = env::var("AUTHGATE_ACCESS_TTL_SECS") {
            self.access_ttl_secs = ttl.parse().unwrap_or(self.access_ttl_secs);
        }
        if let Ok(level) = env::var("AUTHGATE_LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Merge settings from command-line arguments (highest priority).
    pub fn merge_from_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(environment) = &cli.env {
            self.environment = environment.clone();
        }
        if cli.dev {
            self.environment = "development".to_string();
        }
        if let Some(db_url) = &cli.database_url {
            self.database_url = db_url.clone();
        }
        if let Some(secret) = &cli.jwt_secret {
            self.jwt_secret = secret.clone();
        }
        if let Some(service_key) = &cli.service_key {
            self.service_key = service_key.clone();
        }
        if let Some(ttl) = cli.refresh_ttl_secs {
            self.refresh_ttl_secs = ttl;
        }
        if let Some(level) = cli.get_log_level() {
            self.log_level = level;
        }
        if let Some(format) = cli.get_log_format() {
            self.log_format = Some(format);
        }
    }

    /// Load configuration by priority: CLI > environment > config file >
    /// defaults.
    pub fn load(cli: &crate::cli::Cli) -> anyhow::Result<Self> {
        let mut config = if let Some(config_file) = &cli.config_file {
            if Path::new(config_file).exists() {
                info!("📄 loading config file: {}", config_file);
                Self::from_toml_file(config_file)?
            } else {
                tracing::warn!("⚠️ config file not found: {}", config_file);
                Self::new()
            }
        } else if Path::new("config.toml").exists() {
            info!("📄 loading default config file: config.toml");
            Self::from_toml_file("config.toml")?
        } else {
            Self::new()
        };

        config.merge_from_env();
        config.merge_from_cli(cli);

        Ok(config)
    }

    /// Fatal startup validation.
    ///
    /// Returns the parsed runtime mode so the deployment environment is
    /// decided exactly once, here, and passed explicitly to the session
    /// manager.
    pub fn validate(&self) -> Result<RuntimeMode> {
        let mode: RuntimeMode = self.environment.parse()?;

        if self.jwt_secret.is_empty() {
            return Err(ServerError::Configuration(
                "AUTHGATE_JWT_SECRET must be set".to_string(),
            ));
        }
        if self.service_key.is_empty() {
            return Err(ServerError::Configuration(
                "AUTHGATE_SERVICE_KEY must be set".to_string(),
            ));
        }
        if !(MIN_REFRESH_TTL_SECS..=MAX_REFRESH_TTL_SECS).contains(&self.refresh_ttl_secs) {
            return Err(ServerError::Configuration(format!(
                "refresh_ttl_secs must be between {} and {}, got {}",
                MIN_REFRESH_TTL_SECS, MAX_REFRESH_TTL_SECS, self.refresh_ttl_secs
            )));
        }
        if !(MIN_ACCESS_TTL_SECS..=MAX_ACCESS_TTL_SECS).contains(&self.access_ttl_secs) {
            return Err(ServerError::Configuration(format!(
                "access_ttl_secs must be between {} and {}, got {}",
                MIN_ACCESS_TTL_SECS, MAX_ACCESS_TTL_SECS, self.access_ttl_secs
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(ServerError::Configuration(
                "store_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(mode)
    }

    /// Whether refresh cookies should carry the Secure attribute.
    pub fn cookie_secure(&self) -> bool {
        self.environment == "production"
    }
}

/// TOML configuration file structure (deserialization only).
#[derive(Debug, Deserialize)]
struct TomlConfig {
    server: Option<TomlServerConfig>,
    auth: Option<TomlAuthConfig>,
    store: Option<TomlStoreConfig>,
    logging: Option<TomlLoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct TomlServerConfig {
    host: Option<String>,
    port: Option<u16>,
    environment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlAuthConfig {
    jwt_secret: Option<String>,
    service_key: Option<String>,
    refresh_ttl_secs: Option<i64>,
    access_ttl_secs: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TomlStoreConfig {
    database_url: Option<String>,
    timeout_ms: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TomlLoggingConfig {
    level: Option<String>,
    format: Option<String>,
}

impl From<TomlConfig> for ServerConfig {
    fn from(toml: TomlConfig) -> Self {
        let mut config = Self::default();

        if let Some(server) = toml.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if let Some(environment) = server.environment {
                config.environment = environment;
            }
        }
        if let Some(auth) = toml.auth {
            if let Some(secret) = auth.jwt_secret {
                config.jwt_secret = secret;
            }
            if let Some(service_key) = auth.service_key {
                config.service_key = service_key;
            }
            if let Some(ttl) = auth.refresh_ttl_secs {
                config.refresh_ttl_secs = ttl;
            }
            if let Some(ttl) = auth.access_ttl_secs {
                config.access_ttl_secs = ttl;
            }
        }
        if let Some(store) = toml.store {
            if let Some(db_url) = store.database_url {
                config.database_url = db_url;
            }
            if let Some(timeout) = store.timeout_ms {
                config.store_timeout_ms = timeout;
            }
            if let Some(interval) = store.sweep_interval_secs {
                config.sweep_interval_secs = interval;
            }
        }
        if let Some(logging) = toml.logging {
            if let Some(level) = logging.level {
                config.log_level = level;
            }
            config.log_format = logging.format;
        }

        config
    }
}

/// Template written by the `generate-config` subcommand.
pub const CONFIG_TEMPLATE: &str = r#"[server]
host = "127.0.0.1"
port = 3080
environment = "production"

[auth]
# Required. Generate with: openssl rand -hex 32
jwt_secret = ""
# Required. Pre-shared key for the admin session API.
service_key = ""
refresh_ttl_secs = 604800
access_ttl_secs = 900

[store]
# Empty selects the in-memory store (single-process only).
database_url = ""
timeout_ms = 5000
sweep_interval_secs = 300

[logging]
level = "info"
format = "compact"
"#;
