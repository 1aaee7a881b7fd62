//! Command-line entry point
//!
//! - `scrape`: run the trending pipeline for one site, optionally enrich the
//!   top records, store them, then analyze and chart the run
//! - `analyze`: report on the latest stored run of a site
//! - `compare`: compare the latest stored runs of several sites
//! - `export`: write the latest stored run of a site as CSV
//! - `sites`: list the registered sites

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use trending_scraper_lib::application::{ChartRenderer, ProductAnalyzer, ScraperFactory};
use trending_scraper_lib::domain::{SiteId, TrendingProduct};
use trending_scraper_lib::infrastructure::config::AppConfig;
use trending_scraper_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use trending_scraper_lib::infrastructure::product_repository::ProductRepository;

#[derive(Parser)]
#[command(author, version, about = "Scrape and analyze trending products from e-commerce sites", long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape trending products from a site
    Scrape(ScrapeArgs),

    /// Analyze the latest stored results of a site
    Analyze(SiteArgs),

    /// Compare the latest stored results of several sites
    Compare(CompareArgs),

    /// Export the latest stored results of a site to CSV
    Export(ExportArgs),

    /// List supported sites
    Sites,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Site key, e.g. amazon_in or daraz_np
    #[arg(short, long)]
    site: String,

    /// Fetch detail pages for the top N products
    #[arg(short, long, default_value = "0")]
    details: usize,

    /// Store the results without analysis or charts
    #[arg(long)]
    skip_analysis: bool,
}

#[derive(Args, Debug)]
struct SiteArgs {
    #[arg(short, long)]
    site: String,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Comma-separated site keys
    #[arg(short, long, value_delimiter = ',', required = true)]
    sites: Vec<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(short, long)]
    site: String,

    /// Output CSV file (defaults to the data directory)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    let repository = ProductRepository::new(config.storage.resolve_data_dir());

    match cli.command {
        Commands::Scrape(args) => scrape(&config, &repository, args).await,
        Commands::Analyze(args) => analyze(&config, &repository, &site_key(&args.site)?),
        Commands::Compare(args) => compare(&config, &repository, &args.sites),
        Commands::Export(args) => export(&repository, &site_key(&args.site)?, args.out),
        Commands::Sites => {
            list_sites(&config);
            Ok(())
        }
    }
}

/// Canonical registry key for user input such as `Daraz.NP`.
fn site_key(input: &str) -> Result<String> {
    let site: SiteId = input.parse()?;
    Ok(site.key().to_string())
}

async fn scrape(config: &AppConfig, repository: &ProductRepository, args: ScrapeArgs) -> Result<()> {
    let adapter = ScraperFactory::create(&args.site, config)
        .ok_or_else(|| anyhow!("No scraper available for site '{}'", args.site))?;
    let key = adapter.site().key();

    let mut products = adapter.get_trending_products().await;
    if products.iter().all(TrendingProduct::is_not_found) {
        warn!("No trending products found for {}", key);
    } else {
        info!("Scraped {} trending products from {}", products.len(), key);
    }

    if args.details > 0 {
        info!("Fetching details for the top {} products", args.details);
        products = adapter.enrich_top(products, args.details).await;
    }

    let path = repository.save_products(&products, key)?;
    println!("Saved {} products to {}", products.len(), path.display());

    if args.skip_analysis {
        return Ok(());
    }

    let analyzer = ProductAnalyzer::new(repository.clone(), config.analysis.clone());
    match analyzer.analyze_products(&products, Some(key)) {
        Ok(report) => print_insights(&analyzer.generate_insights(&report)),
        Err(e) => warn!("Skipping analysis: {}", e),
    }

    let renderer = ChartRenderer::new(config.storage.resolve_charts_dir(), &config.analysis);
    for chart in renderer.generate_all_charts(&products, key) {
        println!("Chart: {}", chart.display());
    }
    Ok(())
}

fn analyze(config: &AppConfig, repository: &ProductRepository, site: &str) -> Result<()> {
    let analyzer = ProductAnalyzer::new(repository.clone(), config.analysis.clone());
    let report = analyzer
        .analyze_latest(site)
        .with_context(|| format!("Failed to analyze stored results for {site}"))?;
    print_insights(&analyzer.generate_insights(&report));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn compare(config: &AppConfig, repository: &ProductRepository, sites: &[String]) -> Result<()> {
    let keys = sites
        .iter()
        .map(|s| site_key(s))
        .collect::<Result<Vec<_>>>()?;
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

    let analyzer = ProductAnalyzer::new(repository.clone(), config.analysis.clone());
    let comparison = analyzer.compare_sites(&keys)?;

    println!("{:<12} {:>8} {:>12} {:>12} {:>8}", "site", "products", "mean price", "median", "rating");
    for row in &comparison.metrics {
        println!(
            "{:<12} {:>8} {:>12} {:>12} {:>8}",
            row.site,
            row.product_count,
            row.mean_price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".into()),
            row.median_price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".into()),
            row.mean_rating.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".into()),
        );
    }
    for site in &comparison.missing {
        println!("{site}: no stored data");
    }
    print_insights(&comparison.insights);
    Ok(())
}

fn export(repository: &ProductRepository, site: &str, out: Option<PathBuf>) -> Result<()> {
    let products = repository.load_latest_products(site)?;
    if products.is_empty() {
        return Err(anyhow!("No stored results for {site}; run `scrape --site {site}` first"));
    }
    let path = repository.export_to_csv(&products, out.as_deref())?;
    println!("Exported {} products to {}", products.len(), path.display());
    Ok(())
}

fn list_sites(config: &AppConfig) {
    for site in SiteId::ALL {
        let profile = config.site_profile(site);
        println!("{} ({}) {}", site.key(), site.display_name(), profile.base_url);
        for page in &profile.trending_pages {
            println!("    {page}");
        }
    }
}

fn print_insights(insights: &[String]) {
    println!("\nInsights:");
    for insight in insights {
        println!("  - {insight}");
    }
}
