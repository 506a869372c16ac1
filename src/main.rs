//! pdf-scraper main entry point
//!
//! This is the command-line interface: crawl one site and bind the pages
//! into a single PDF.

use anyhow::Context;
use clap::Parser;
use pdf_scraper::config::{resolve_config, Config, ConfigOverrides};
use pdf_scraper::crawler::crawl;
use pdf_scraper::output::{print_statistics, write_document, PdfSink};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const LONG_ABOUT: &str = "\
Crawl a website into a single PDF.

Long flags take two dashes (--url, --output) or the short form (-u, -o).
A single dash starts a bundle of short flags, so `-url X` is read as `-u rl`
and fails. Write `pdf-scraper --url https://example.com/docs --output report`
or `pdf-scraper -u https://example.com/docs -o report` instead.";

/// pdf-scraper: crawl a website into a single PDF
///
/// Starting from the given URL, pdf-scraper follows same-site links up to
/// the maximum depth, extracts the article content of every page, and
/// writes the pages (sorted by URL) as one PDF with a table of contents.
#[derive(Parser, Debug)]
#[command(name = "pdf-scraper")]
#[command(version)]
#[command(about = "Crawl a website into a single PDF")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    /// URL to start scraping from
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Maximum link depth to follow
    #[arg(short, long, value_name = "N")]
    depth: Option<u32>,

    /// Output PDF file name (.pdf is appended when missing)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Timeout in seconds for the whole crawl
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            start_url: self.url.clone(),
            max_depth: self.depth,
            timeout_secs: self.timeout,
            output_path: self.output.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = resolve_config(cli.config.as_deref(), cli.overrides())
        .context("Invalid configuration")?;
    if let (Some(path), Some(hash)) = (&cli.config, &config_hash) {
        tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pdf_scraper=info,warn"),
            1 => EnvFilter::new("pdf_scraper=debug,info"),
            2 => EnvFilter::new("pdf_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== pdf-scraper Dry Run ===\n");

    println!("Crawler:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Parallelism: {}", config.crawler.parallelism);
    println!(
        "  Delay: {}ms (+ up to {}ms jitter)",
        config.crawler.delay_ms, config.crawler.random_delay_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Crawl timeout: {}s", config.crawler.timeout_secs);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nExtraction:");
    println!("  Content selector: {}", config.extraction.content_selector);
    println!("  Title selectors: {}", config.extraction.title_selectors.join(" | "));

    println!("\nOutput:");
    println!(
        "  File: {}",
        pdf_scraper::output::resolve_output_path(&config.output.path).display()
    );
    println!("  Title: {}", config.output.document_title);
    println!("  Author: {}", config.output.author);
    match &config.output.code_font {
        Some(path) => println!("  Code font: {}", path.display()),
        None => println!("  Code font: bundled DejaVu Sans Mono"),
    }

    println!("\n\u{2713} Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight requests");
            interrupt.cancel();
        }
    });

    let output_config = config.output.clone();
    let sink = PdfSink::from_config(&output_config).context("Failed to load code font")?;
    let outcome = crawl(config, cancel).await.context("Crawl failed")?;

    println!("\nScraped {} pages successfully.", outcome.pages.len());
    print_statistics(&outcome.stats);

    let page_count = outcome.pages.len();
    let path = write_document(outcome.pages, &output_config, &sink)
        .context("Failed to generate PDF")?;

    tracing::info!("PDF written to {}", path.display());
    println!("PDF generated successfully with {} pages!", page_count);

    Ok(())
}
