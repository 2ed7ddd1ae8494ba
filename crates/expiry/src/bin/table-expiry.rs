//! table-expiry — one reconciliation pass over Redshift external tables.
//!
//! Drops external tables older than the expiry threshold and back-fills the
//! DDL time of tables created without one, then exits. The exit code is zero
//! whenever the pass ran; reconciliation failures are reported in the logs.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use dpr_core::config::load_dotenv;
use dpr_core::DprConfig;
use dpr_expiry::{S3MetadataResolver, TableExpiryReconciler};
use dpr_redshift::{load_sdk_config, RedshiftDataService, StatementGateway};

// ── CLI ─────────────────────────────────────────────────────────────

/// Remove expired Redshift external tables and repair missing DDL times.
#[derive(Parser, Debug)]
#[command(name = "table-expiry", version, about)]
struct Cli {
    /// Config profile; keys are read as `{PROFILE}_{KEY}` before `{KEY}`.
    #[arg(long, env = "DPR_PROFILE", default_value = "")]
    profile: String,

    /// Override `EXPIRY_SECONDS`.
    #[arg(long)]
    expiry_seconds: Option<u64>,

    /// Override `REMOVAL_BATCH_SIZE`.
    #[arg(long)]
    removal_batch_size: Option<usize>,

    /// Override `UPDATE_BATCH_SIZE`.
    #[arg(long)]
    update_batch_size: Option<usize>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = DprConfig::for_profile(&cli.profile)?;
    if let Some(seconds) = cli.expiry_seconds {
        config.expiry.expiry_seconds = seconds;
    }
    if let Some(size) = cli.removal_batch_size {
        config.expiry.removal_batch_size = size;
    }
    if let Some(size) = cli.update_batch_size {
        config.expiry.update_batch_size = size;
    }
    config.expiry.validate()?;
    config.log_summary();

    let sdk_config = load_sdk_config(&config.redshift.region).await;
    let service = RedshiftDataService::new(
        aws_sdk_redshiftdata::Client::new(&sdk_config),
        &config.redshift,
    );
    let gateway = StatementGateway::new(Arc::new(service))
        .with_poll_interval(Duration::from_millis(config.redshift.poll_interval_ms));
    let resolver = S3MetadataResolver::new(aws_sdk_s3::Client::new(&sdk_config));

    let reconciler = TableExpiryReconciler::new(gateway, Arc::new(resolver), config.expiry);

    info!("Started expired table removal");
    reconciler.run().await;
    info!("Finished expired table removal");

    Ok(())
}
