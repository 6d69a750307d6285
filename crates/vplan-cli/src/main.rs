mod config;
mod serve_cmd;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use vplan_core::pdf::WkhtmltopdfRenderer;
use vplan_db::pool;

use config::VplanConfig;

#[derive(Parser)]
#[command(name = "vplan", about = "Holiday plan REST API")]
struct Cli {
    /// Database URL (overrides VPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a vplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/vplan")]
        db_url: String,
        /// Username accepted by the login endpoint
        #[arg(long, default_value = "admin")]
        api_username: String,
        /// Password accepted by the login endpoint (generated when omitted)
        #[arg(long)]
        api_password: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the vplan database (requires config file or env vars)
    DbInit,
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// HTML-to-PDF binary used for exports
        #[arg(long, default_value = "wkhtmltopdf")]
        pdf_binary: String,
        /// Timeout for one PDF conversion, in seconds
        #[arg(long, default_value_t = 30)]
        pdf_timeout: u64,
    },
}

/// Execute the `vplan init` command: write config file.
fn cmd_init(
    db_url: &str,
    api_username: &str,
    api_password: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();
    let api_password = api_password.unwrap_or_else(config::generate_api_password);

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
            api_username: api_username.to_string(),
            api_password: api_password.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.token_secret = {}...{}",
        &token_secret[..8],
        &token_secret[56..]
    );
    println!("  auth.api_username = {api_username}");
    println!("  auth.api_password = {api_password}");
    println!();
    println!("Next: run `vplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `vplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = VplanConfig::resolve(cli_db_url)?;

    println!("Initializing vplan database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("vplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_username,
            api_password,
            force,
        } => {
            cmd_init(&db_url, &api_username, api_password, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve {
            bind,
            port,
            pdf_binary,
            pdf_timeout,
        } => {
            let resolved = VplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;

            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                tokens: resolved.token_config,
                credentials: resolved.credentials,
                renderer: Arc::new(WkhtmltopdfRenderer::new(
                    pdf_binary,
                    Duration::from_secs(pdf_timeout),
                )),
            };

            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
