//! Generate command implementation

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use colored::Colorize;
use llmsmap_core::crawl::UrlFilter;
use llmsmap_core::generate::{INDEX_FILE, MANIFEST_FILE};
use llmsmap_core::{
    ConfigOverrides, CrawlOptions, FirecrawlClient, FirecrawlSource, GenerateStats, Generator,
    JsonPageSource, PageSource, SiteConfig, process_pages,
};
use tracing::info;

use crate::cli::GenerateArgs;
use crate::utils::formatting::{format_bytes, format_count};

/// Crawl (or replay) pages and write the output directory.
pub async fn execute(config_path: Option<&Path>, args: &GenerateArgs, quiet: bool) -> Result<()> {
    let config = SiteConfig::load(config_path, &overrides(args))?;
    let show_progress = !quiet && !args.json;

    let source = page_source(&config, args, show_progress)?;
    let pages = source.fetch_pages().await?;
    if pages.is_empty() {
        bail!("no pages found for {}", config.url);
    }
    info!(pages = pages.len(), "Fetched pages");

    let records = process_pages(&pages, Utc::now().date_naive());
    let generator = Generator::from_config(&config);
    let stats = tokio::task::spawn_blocking(move || generator.run(&records))
        .await
        .context("generation task panicked")??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if !quiet {
        print_summary(&config, &stats);
    }
    Ok(())
}

fn overrides(args: &GenerateArgs) -> ConfigOverrides {
    ConfigOverrides {
        url: args.url.clone(),
        api_key: args.key.clone(),
        output_dir: args.output.clone(),
        include: (!args.include.is_empty()).then(|| args.include.clone()),
        exclude: (!args.exclude.is_empty()).then(|| args.exclude.clone()),
        max_pages: args.max_pages,
    }
}

fn page_source(
    config: &SiteConfig,
    args: &GenerateArgs,
    show_progress: bool,
) -> Result<Box<dyn PageSource>> {
    if let Some(path) = &args.pages {
        let filter = UrlFilter::new(&config.include, &config.exclude)?;
        return Ok(Box::new(JsonPageSource::new(path).with_filter(filter)));
    }

    let key = config.firecrawl_api_key.as_deref().ok_or_else(|| {
        anyhow!("Firecrawl API key required (use --key, FIRECRAWL_API_KEY or firecrawl_api_key in the config)")
    })?;
    let mut client = FirecrawlClient::new(key)?;
    if show_progress {
        eprintln!("Crawling {} (up to {} pages)...", config.url.bold(), config.max_pages);
        client = client.with_progress(|status, completed, total| {
            eprintln!("  {status}: {completed}/{total} pages");
        });
    }
    let options = CrawlOptions::from_config(config)?;
    Ok(Box::new(FirecrawlSource::new(client, options)))
}

fn print_summary(config: &SiteConfig, stats: &GenerateStats) {
    let out = &config.output_dir;
    println!(
        "{} {} pages into {}",
        "✓ Generated".green(),
        stats.total_pages,
        out.display()
    );
    println!(
        "  {:<16} {}",
        INDEX_FILE,
        format_bytes(stats.index_size).cyan()
    );
    println!(
        "  {:<16} {}",
        MANIFEST_FILE,
        format_bytes(stats.manifest_size).cyan()
    );
    println!("  {:<16} {}", "content files", stats.content_files);
    println!(
        "  {:<16} ~{}",
        "total tokens",
        format_count(stats.total_tokens).yellow()
    );
    println!(
        "  Fetch endpoint: {}",
        config.fetch_endpoint_url().dimmed()
    );
}
