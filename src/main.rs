mod cli;

use showkeeper::config::{self, Config};
use showkeeper::metadata::ProviderCatalog;
use showkeeper::scanner::{self, selection, ScanContext};
use showkeeper_common::{LibraryId, MediaKind, ShowId};
use showkeeper_db::pool::{init_pool, DbPool};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "showkeeper=trace,showkeeper_db=debug,showkeeper_common=debug".to_string()
        } else {
            "showkeeper=info,showkeeper_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Scan {
            library,
            kind,
            auto_add,
            no_add_unknown,
            concurrency,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let mut scan_config = config.scan.clone();
            if auto_add {
                scan_config.auto_add = true;
            }
            if no_add_unknown {
                scan_config.add_unknown = false;
            }
            if let Some(n) = concurrency {
                config::check_concurrency(n).context("Invalid --concurrency")?;
                scan_config.max_concurrent_scans = n;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_scan(&config, kind, library, &scan_config))
        }
        Commands::Candidates { show } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            list_candidates(&config, show)
        }
        Commands::Select { show, index } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            select(&config, show, index)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("showkeeper {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Open the catalog and store the configured providers.
fn open_catalog(config: &Config) -> Result<DbPool> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
    }

    let db_path = config.database_path.to_string_lossy();
    tracing::info!("Opening catalog at {}", db_path);
    let pool = init_pool(&db_path)?;

    let conn = pool.get()?;
    config::seed_providers(&conn, &config.providers)?;
    Ok(pool)
}

async fn run_scan(
    config: &Config,
    media_kind: MediaKind,
    library_id: LibraryId,
    scan_config: &scanner::ScanConfig,
) -> Result<()> {
    let pool = open_catalog(config)?;

    // The binary ships no provider factories; embedders register their own.
    let catalog = ProviderCatalog::new();
    tracing::warn!("No metadata providers are compiled in; shows will be stored without metadata");

    let ctx = ScanContext { pool, catalog };
    let report = scanner::start_scan(&ctx, media_kind, Some(library_id), scan_config).await?;

    for outcome in report.succeeded() {
        let episodes = outcome
            .episodes
            .as_ref()
            .map(|c| {
                format!(
                    "{} files, {} added, {} refreshed, {} unidentified",
                    c.files,
                    c.added + c.added_unknown,
                    c.refreshed,
                    c.unidentified
                )
            })
            .unwrap_or_else(|| "no episode discovery".to_string());
        println!("✓ {} ({:?}): {}", outcome.folder, outcome.action, episodes);
    }
    for (folder, error) in report.failed() {
        println!("✗ {}: {}", folder, error);
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "\n{} shows reconciled, {} failed in {:.1}s",
        report.succeeded().count(),
        report.failed().count(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    Ok(())
}

fn list_candidates(config: &Config, show: ShowId) -> Result<()> {
    let pool = open_catalog(config)?;
    let conn = pool.get()?;

    let candidates = selection::load_candidates(&conn, MediaKind::TvShow, &show.to_string())?;
    if candidates.is_empty() {
        println!("The last search for this show returned no results.");
        return Ok(());
    }

    for (i, candidate) in candidates.iter().enumerate() {
        print!(
            "[{}] {} ({} {})",
            i, candidate.title, candidate.provider_name, candidate.provider_id
        );
        if let Some(premiered) = candidate.premiered {
            print!(" premiered {}", premiered.format("%Y-%m-%d"));
        }
        println!();
    }
    Ok(())
}

fn select(config: &Config, show: ShowId, index: usize) -> Result<()> {
    let pool = open_catalog(config)?;
    let candidate = scanner::select_candidate(&pool, MediaKind::TvShow, &show.to_string(), index)?;
    println!(
        "Bound show to {} ({} {}); metadata is pulled on the next scan.",
        candidate.title, candidate.provider_name, candidate.provider_id
    );
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Database: {}", config.database_path.display());
            println!("  Auto add: {}", config.scan.auto_add);
            println!("  Add unknown: {}", config.scan.add_unknown);
            println!("  Concurrent scans: {}", config.scan.max_concurrent_scans);
            println!("  Providers: {}", config.providers.len());
            println!(
                "    Enabled: {}",
                config.providers.iter().filter(|p| p.enabled).count()
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Database: {}", config.database_path.display());
        }
    }

    Ok(())
}
