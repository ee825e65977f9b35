//! Stagehand operator CLI.
//!
//! Reads the same environment as the services (DATABASE_URL, STORAGE_BACKEND, ...).

use anyhow::Context;
use clap::{Parser, Subcommand};
use stagehand_cli::init_tracing;
use stagehand_core::models::{CancelSessionInput, PresignGetInput};
use stagehand_core::Config;
use stagehand_db::{connect, run_migrations, PgUploadLedger};
use stagehand_services::{ObjectStorage, SessionReaper, UploadService, UploadServiceConfig};
use stagehand_storage::create_storage;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "stagehand", about = "Staged upload operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Delete expired sessions and their staged objects
    Reap {
        /// Keep running, sweeping every SESSION_REAP_INTERVAL_SECS
        #[arg(long)]
        watch: bool,
    },
    /// Cancel a session on behalf of its owner
    Cancel {
        /// Session UUID
        #[arg(long)]
        session: Uuid,
        /// Owner UUID
        #[arg(long)]
        owner: Uuid,
    },
    /// Print a presigned GET URL for an object key
    PresignGet {
        /// Object key, usually a final key
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = connect(&config).await?;

    match cli.command {
        Commands::Migrate => run_migrations(&pool).await?,
        Commands::Reap { watch } => {
            let storage = open_storage(&config).await?;
            let reaper = Arc::new(SessionReaper::new(
                Arc::new(PgUploadLedger::new(pool)),
                storage,
                config.session_reap_batch_size,
            ));

            if !watch {
                let report = reaper.reap_once().await?;
                println!(
                    "reaped {} sessions, deleted {} objects, {} failures",
                    report.sessions_reaped, report.objects_deleted, report.failures
                );
                return Ok(());
            }

            let every = config
                .session_reap_interval()
                .context("SESSION_REAP_INTERVAL_SECS must be > 0 for --watch")?;
            let handle = reaper.start(every);

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown requested, stopping session reaper");
            handle.abort();
        }
        Commands::Cancel { session, owner } => {
            let service = upload_service(&config, pool).await?;
            service
                .cancel_session(CancelSessionInput {
                    session_id: session,
                    owner_id: owner,
                })
                .await?;
            println!("cancelled session {}", session);
        }
        Commands::PresignGet { key } => {
            let service = upload_service(&config, pool).await?;
            let url = service
                .presign_get(PresignGetInput { object_key: key })
                .await?;
            println!("{}", url);
        }
    }

    Ok(())
}

async fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn ObjectStorage>> {
    create_storage(config)
        .await
        .context("Failed to initialize object storage")
}

async fn upload_service(config: &Config, pool: PgPool) -> anyhow::Result<UploadService> {
    let storage = open_storage(config).await?;
    Ok(UploadService::new(
        Arc::new(PgUploadLedger::new(pool)),
        storage,
        UploadServiceConfig::from(config),
    ))
}
