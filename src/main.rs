use anyhow::Context;
use clap::{Parser, builder::RangedU64ValueParser};
use content_migrate::{
    config, logging,
    processing::{MigrationOptions, MigrationService, MigrationSummary},
    source::PostgresSource,
    store::FirestoreService,
};
use tokio::sync::watch;

/// Exit code used when the run completed but some rows were skipped.
const EXIT_PARTIAL: i32 = 2;

#[derive(Parser)]
#[command(
    name = "content-migrate",
    about = "Migrate content records from Postgres into Firestore search and content documents"
)]
struct Cli {
    /// Transform rows without writing any documents.
    #[arg(long)]
    dry_run: bool,
    /// Stop after this many rows.
    #[arg(long)]
    limit: Option<usize>,
    /// Rows processed concurrently (overrides MIGRATION_CONCURRENCY).
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    concurrency: Option<usize>,
    /// Written rows between progress lines (overrides MIGRATION_PROGRESS_INTERVAL).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    progress_interval: Option<u64>,
    /// Print the final summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(summary) if summary.failed == 0 => {}
        Ok(_) => std::process::exit(EXIT_PARTIAL),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<MigrationSummary> {
    let cli = Cli::parse();
    config::init_config().context("Failed to load config from environment")?;
    let config = config::get_config();
    logging::init_tracing(config.log_file.as_deref());
    tracing::debug!(
        content_table = %config.content_table,
        chunk_table = %config.chunk_table,
        firestore_project = %config.firestore_project,
        firestore_url = %config.firestore_url,
        search_collection = %config.search_collection,
        content_collection = %config.content_collection,
        concurrency = config.concurrency,
        "Loaded configuration"
    );

    let mut options = MigrationOptions::from_config(config);
    options.dry_run = cli.dry_run;
    options.limit = cli.limit;
    if let Some(concurrency) = cli.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(interval) = cli.progress_interval {
        options.progress_interval = interval;
    }

    let max_connections = u32::try_from(options.concurrency)
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    let source = PostgresSource::connect(config, max_connections)
        .await
        .context("Failed to connect to source database")?;
    let source = std::sync::Arc::new(source);
    let sink = FirestoreService::new(config).context("Failed to create Firestore client")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        tracing::warn!("Shutdown requested; finishing in-flight rows");
        let _ = shutdown_tx.send(true);
    });

    let service = MigrationService::new(Box::new(source.clone()), Box::new(sink), options);
    let summary = service.run(shutdown_rx).await;
    source.close().await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "migrated {} of {} rows ({} failed, {} chunks){}",
            summary.written,
            summary.attempted,
            summary.failed,
            summary.chunks_written,
            if summary.cancelled { ", cancelled" } else { "" }
        );
    }

    Ok(summary)
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = sigterm => {}
    }
}
