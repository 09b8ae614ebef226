//! crawlscope main entry point
//!
//! This is the command-line interface for the crawlscope spider.

use anyhow::Context;
use clap::Parser;
use crawlscope::config::{load_config_with_hash, Config};
use crawlscope::output::print_statistics;
use crawlscope::Crawler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// crawlscope: a scoped spider for web-security testing
///
/// crawlscope discovers the URL space of a target site from one or more seed
/// URLs, staying inside the configured scope and fetching every canonical URL
/// at most once. Accepted URLs are printed as they are discovered.
#[derive(Parser, Debug)]
#[command(name = "crawlscope")]
#[command(version)]
#[command(about = "A scoped spider for web-security testing", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries the task stream.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawlscope=info,warn"),
            1 => EnvFilter::new("crawlscope=debug,info"),
            2 => EnvFilter::new("crawlscope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== crawlscope Dry Run ===\n");

    let spider = &config.spider;
    println!("Spider Configuration:");
    println!("  Max depth: {}", unlimited(spider.max_depth as u64));
    println!("  Workers: {}", spider.worker_count);
    println!(
        "  Parameter handling: {}",
        spider.parameter_handling.as_str()
    );
    println!("  OData parameters: {}", spider.handle_odata_parameters);
    println!("  Max parse size: {} bytes", spider.max_parse_size_bytes);
    println!("  Max duration: {}", unlimited(spider.max_duration_secs));
    println!("  Request timeout: {}s", spider.request_timeout_secs);
    println!("  Parse robots.txt: {}", spider.parse_robots_txt);
    println!("  Parse sitemap.xml: {}", spider.parse_sitemap_xml);

    println!("\nUser Agent:");
    println!("  {}", crawlscope::crawler::user_agent(&config.user_agent));

    println!("\nSeeds ({}):", config.scope.seeds.len());
    for seed in &config.scope.seeds {
        println!("  - {}", seed);
    }

    println!(
        "\nAlways In Scope ({}):",
        config.scope.always_in_scope.len()
    );
    for pattern in &config.scope.always_in_scope {
        println!("  - {}", pattern);
    }

    println!("\nSkip Patterns ({}):", config.scope.skip_urls.len());
    for pattern in &config.scope.skip_urls {
        println!("  - {}", pattern);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.scope.seeds.len()
    );
}

fn unlimited(value: u64) -> String {
    if value == 0 {
        "unlimited".to_string()
    } else {
        value.to_string()
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, quiet: bool) -> anyhow::Result<()> {
    let crawler = Crawler::from_config(config).context("Failed to set up crawler")?;
    let mut handle = crawler.start().await.context("Failed to start crawl")?;

    let controller = handle.controller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing in-flight requests");
            controller.stop();
        }
    });

    while let Some(task) = handle.next_task().await {
        println!("{}", task);
    }

    let status = handle.wait().await.context("Crawl failed")?;
    if !quiet {
        print_statistics(&status);
    }

    Ok(())
}
