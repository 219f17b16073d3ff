use anyhow::Context;
use clap::Parser;
use collection_sync::app::report::{render_summary, write_summary_json};
use collection_sync::core::dry_run::DryRunLibrary;
use collection_sync::core::LibraryPort;
use collection_sync::utils::error::ErrorSeverity;
use collection_sync::utils::{logger, validation::Validate};
use collection_sync::{
    CliArgs, CollectionJob, FailurePolicy, LogFormat, PlexLibrary, RunSummary, SyncConfig,
    SyncError, SyncSequence, TraktClient,
};

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2, // transient, worth retrying
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(context: &str, e: &SyncError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()).max(1));
}

async fn run<L: LibraryPort>(
    library: L,
    trakt: TraktClient,
    jobs: Vec<CollectionJob>,
    config: &SyncConfig,
    args: &CliArgs,
) -> collection_sync::Result<RunSummary> {
    let failure_policy = if args.continue_on_failure {
        FailurePolicy::Continue
    } else {
        config.failure_policy()
    };

    SyncSequence::new(library, trakt)
        .with_jobs(jobs)
        .with_failure_policy(failure_policy)
        .with_reindex_per_collection(config.reindex_per_collection())
        .with_dry_run(args.dry_run)
        .execute_all()
        .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("🚀 Starting collection-sync");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match SyncConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => fail(&format!("Failed to load config file '{}'", args.config), &e),
    };
    if let Err(e) = config.validate() {
        fail("Configuration validation failed", &e);
    }
    let jobs = match config.jobs(&args.collections) {
        Ok(jobs) => jobs,
        Err(e) => fail("Invalid collection filter", &e),
    };
    tracing::info!("✅ Configuration loaded, {} collections queued", jobs.len());

    let retry = config.retry_policy();
    let plex = match PlexLibrary::connect(&config.plex, retry).await {
        Ok(plex) => plex,
        Err(e) => fail("Could not open the Plex library", &e),
    };
    let trakt = TraktClient::new(&config.trakt, retry);

    let result = if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - collections will not be modified");
        run(DryRunLibrary::new(plex), trakt, jobs, &config, &args).await
    } else {
        run(plex, trakt, jobs, &config, &args).await
    };
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => fail("Indexing the library failed", &e),
    };

    print!("{}", render_summary(&summary));

    if let Some(path) = &args.summary_json {
        write_summary_json(&summary, path)
            .with_context(|| format!("failed to write run summary to {}", path))?;
        tracing::info!("📁 Summary saved to: {}", path);
    }

    if let Some(severity) = summary.worst_severity() {
        std::process::exit(exit_code(severity).max(1));
    }

    tracing::info!("✅ All collections synced");
    Ok(())
}
