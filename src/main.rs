use anyhow::{Context, Result};
use authgate::{
    auth::{
        spawn_expiry_sweeper, JwtService, MemorySessionStore, PgSessionStore, ServiceKeyManager,
        SessionManager, SessionStore,
    },
    cli::{Cli, Commands},
    config::{ServerConfig, CONFIG_TEMPLATE},
    http::{AuthHttpServer, HttpServerState},
    logging,
    repository::{MemoryUserDirectory, PgUserDirectory, UserDirectory},
};
use std::fs;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        match command {
            Commands::Migrate => {
                return run_migrate(&cli).await;
            }
            Commands::GenerateConfig { path } => {
                return generate_config(path);
            }
            Commands::ValidateConfig { path } => {
                return validate_config(path);
            }
            Commands::ShowConfig => {
                return show_config(&cli);
            }
        }
    }

    let log_level = cli.get_log_level().unwrap_or_else(|| "info".to_string());
    let log_format = cli.get_log_format();
    logging::init_logging(&log_level, log_format.as_deref(), cli.quiet)?;

    tracing::info!("🚀 AuthGate starting...");

    let config = ServerConfig::load(&cli).context("failed to load configuration")?;

    // Misconfiguration is fatal at startup, never a silent fallback.
    let mode = match config.validate() {
        Ok(mode) => mode,
        Err(e) => {
            tracing::error!("❌ invalid configuration: {}", e);
            process::exit(1);
        }
    };

    tracing::info!("📊 Server Configuration:");
    tracing::info!("  - Listen: {}:{}", config.host, config.port);
    tracing::info!("  - Environment: {}", mode.as_str());
    tracing::info!("  - Refresh TTL: {}s", config.refresh_ttl_secs);
    tracing::info!("  - Access TTL: {}s", config.access_ttl_secs);
    tracing::info!("  - Store timeout: {}ms", config.store_timeout_ms);
    tracing::info!("  - Sweep interval: {}s", config.sweep_interval_secs);
    tracing::info!("  - Log Level: {}", log_level);

    let jwt = match JwtService::new(&config.jwt_secret, config.access_ttl_secs) {
        Ok(jwt) => Arc::new(jwt),
        Err(e) => {
            tracing::error!("❌ signer initialization failed: {}", e);
            process::exit(1);
        }
    };

    let (store, users): (Arc<dyn SessionStore>, Arc<dyn UserDirectory>) =
        if config.database_url.is_empty() {
            tracing::warn!("⚠️ no DATABASE_URL, using the in-memory store (single-process only)");
            (
                Arc::new(MemorySessionStore::new()),
                Arc::new(MemoryUserDirectory::new()),
            )
        } else {
            let pool = sqlx::PgPool::connect(&config.database_url)
                .await
                .context("database connection failed, check DATABASE_URL")?;
            let pool = Arc::new(pool);
            tracing::info!("🗄️ connected to PostgreSQL");
            (
                Arc::new(PgSessionStore::new(pool.clone())),
                Arc::new(PgUserDirectory::new(pool)),
            )
        };

    let session_manager = Arc::new(SessionManager::new(
        jwt.clone(),
        store.clone(),
        users.clone(),
        config.refresh_ttl_secs,
        Duration::from_millis(config.store_timeout_ms),
        mode,
    ));

    let _sweeper = spawn_expiry_sweeper(
        store.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let state = HttpServerState {
        session_manager,
        access_issuer: jwt,
        service_key_manager: Arc::new(ServiceKeyManager::new(config.service_key.clone())),
        user_directory: users,
        cookie_secure: config.cookie_secure(),
    };

    let server = AuthHttpServer::new(state, config.host.clone(), config.port);
    if let Err(e) = server.start().await {
        tracing::error!("❌ server failed: {}", e);
        process::exit(1);
    }

    Ok(())
}

fn generate_config(path: &str) -> Result<()> {
    fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("cannot write config file: {}", path))?;

    println!("✅ config file generated: {}", path);
    Ok(())
}

fn validate_config(path: &str) -> Result<()> {
    let config = ServerConfig::from_toml_file(path)
        .with_context(|| format!("config file validation failed: {}", path))?;

    let mode = config
        .validate()
        .with_context(|| format!("config file validation failed: {}", path))?;

    println!("✅ config file is valid: {}", path);
    println!("📊 Summary:");
    println!("  - Listen: {}:{}", config.host, config.port);
    println!("  - Environment: {}", mode.as_str());
    println!("  - Refresh TTL: {}s", config.refresh_ttl_secs);

    Ok(())
}

fn show_config(cli: &Cli) -> Result<()> {
    let mut config = ServerConfig::load(cli).context("failed to load configuration")?;

    // Secrets never land on stdout.
    if !config.jwt_secret.is_empty() {
        config.jwt_secret = "<redacted>".to_string();
    }
    if !config.service_key.is_empty() {
        config.service_key = "<redacted>".to_string();
    }

    println!("📊 Merged configuration:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

// Generated at build time from migrations/*.sql.
include!(concat!(env!("OUT_DIR"), "/migrations.rs"));

/// Apply pending database migrations.
async fn run_migrate(cli: &Cli) -> Result<()> {
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .context("DATABASE_URL is required, set it in .env or the environment")?;

    println!("🔌 connecting to database...");
    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .context("database connection failed, check DATABASE_URL")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS authgate_migrations (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&pool)
    .await
    .context("failed to create migration tracking table")?;

    let applied: Vec<String> =
        sqlx::query_scalar("SELECT name FROM authgate_migrations ORDER BY id")
            .fetch_all(&pool)
            .await
            .context("failed to read migration records")?;

    let mut count = 0;
    for (name, sql) in MIGRATIONS {
        if applied.contains(&name.to_string()) {
            println!("  ⏭ {} (already applied)", name);
            continue;
        }

        println!("  ▶ applying {}...", name);
        sqlx::raw_sql(sql)
            .execute(&pool)
            .await
            .with_context(|| format!("migration failed: {}", name))?;

        sqlx::query("INSERT INTO authgate_migrations (name) VALUES ($1)")
            .bind(*name)
            .execute(&pool)
            .await
            .with_context(|| format!("failed to record migration: {}", name))?;

        println!("  ✅ {} done", name);
        count += 1;
    }

    if count == 0 {
        println!("✅ database is up to date");
    } else {
        println!("✅ applied {} migration(s)", count);
    }

    pool.close().await;
    Ok(())
}
