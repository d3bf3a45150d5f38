//! Catalog Crawler CLI
//!
//! Local execution entry point. For AWS Lambda, use `catalog-crawler-lambda`.

use std::path::{Path, PathBuf};

use catalog_crawler::{
    config,
    error::Result,
    models::{Config, StorageBackend},
    pipeline,
    services::{CourseExtractor, PageFetcher},
    storage::{BlobStore, ContentCache, DiskCache, LocalBlobStore},
};
use clap::{Parser, Subcommand};

/// Course catalog crawler
#[derive(Parser, Debug)]
#[command(
    name = "catalog-crawler",
    version,
    about = "Crawls course catalog pages and publishes structured course data"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Seed list to use instead of `paths.seeds_file`
    #[arg(long)]
    seeds: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl seed pages and their links, then publish pages and courses
    Crawl,

    /// Extract course records from a local HTML file and print them as JSON
    Extract {
        /// HTML file to extract from
        file: PathBuf,
    },

    /// Fetch and publish the section schedule
    Sections,

    /// Validate configuration and seed list
    Validate,

    /// Show cache and storage info
    Info,
}

/// Initialize logging from the verbosity flag, falling back to `logging.level`.
fn init_logging(verbose: bool, config_path: &Path) {
    let level = if verbose {
        "debug".to_string()
    } else {
        Config::load(config_path)
            .map(|config| config.logging.level)
            .unwrap_or_else(|_| "info".to_string())
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the configured blob store.
async fn open_store(config: &Config) -> Result<Box<dyn BlobStore>> {
    match config.storage.backend {
        StorageBackend::Local => Ok(Box::new(LocalBlobStore::new(&config.storage.local_dir))),
        #[cfg(feature = "s3")]
        StorageBackend::S3 => Ok(Box::new(
            catalog_crawler::storage::s3::S3BlobStore::from_env().await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(catalog_crawler::error::AppError::config(
            "storage.backend = \"s3\" requires building with the `s3` feature",
        )),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, &cli.config);

    log::info!("Catalog crawler starting...");

    match cli.command {
        Command::Crawl => {
            let (config, seeds) = config::load_all(&cli.config, cli.seeds.as_deref())?;
            log::info!(
                "Loaded {} seed(s) from {}",
                seeds.len(),
                config::seeds_path(&config, cli.seeds.as_deref()).display()
            );

            let store = open_store(&config).await?;
            let cache = pipeline::open_cache(&config);
            let summary = pipeline::run_crawler(&config, &seeds, cache, store.as_ref()).await?;

            log::info!(
                "Crawl complete! {} course(s), {} page(s) written",
                summary.report.records.len(),
                summary.publish.pages_written
            );
        }

        Command::Extract { file } => {
            let config = config::load_config(&cli.config)?;
            let html = std::fs::read_to_string(&file)?;
            let extractor = CourseExtractor::new(&config.extractor)?;
            let records = extractor.extract(&html);

            log::info!("Extracted {} course(s) from {}", records.len(), file.display());
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::Sections => {
            let config = config::load_config(&cli.config)?;
            config.validate()?;

            let store = open_store(&config).await?;
            let fetcher = PageFetcher::new(&config.crawler)?;
            pipeline::run_sections(&config.sections, &fetcher, store.as_ref()).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let (config, seeds) = match config::load_all(&cli.config, cli.seeds.as_deref()) {
                Ok(loaded) => loaded,
                Err(e) => {
                    log::error!("Validation failed: {}", e);
                    return Err(e);
                }
            };
            CourseExtractor::new(&config.extractor)?;

            log::info!("✓ Config OK");
            log::info!("✓ Selectors compile");
            log::info!("✓ {} seed URL(s)", seeds.len());
            log::info!("All validations passed!");
        }

        Command::Info => {
            let config = config::load_config(&cli.config)?;

            log::info!("Config: {}", cli.config.display());
            log::info!(
                "Seeds: {}",
                config::seeds_path(&config, cli.seeds.as_deref()).display()
            );
            log::info!("Storage backend: {:?}", config.storage.backend);
            if config.storage.backend == StorageBackend::Local {
                log::info!("Output directory: {}", config.storage.local_dir.display());
            }

            if config.cache.enabled {
                let cache = DiskCache::open(&config.cache.dir)?;
                log::info!(
                    "Cache: {} ({} entr(ies))",
                    cache.dir().display(),
                    cache.len()?
                );
            } else {
                log::info!("Cache: disabled");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
