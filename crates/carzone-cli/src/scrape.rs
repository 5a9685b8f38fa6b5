//! `scrape` and `discover` command handlers.
//!
//! A degraded run (failed pages, dropped records) still exits successfully;
//! the printed report is where the gaps show up.

use carzone_core::AppConfig;
use carzone_scraper::{Orchestrator, RunOptions};

use crate::export::write_csv_file;
use crate::ScrapeArgs;

/// Folds command-line overrides into the environment-derived config.
///
/// # Errors
///
/// Returns an error if an override falls outside its allowed range.
pub(crate) fn apply_overrides(config: &mut AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    if let Some(pages) = args.pages {
        config.page_count = pages;
    }
    if let Some(first_page) = args.first_page {
        config.first_page = first_page;
    }
    if let Some(chunk_size) = args.chunk_size {
        anyhow::ensure!(chunk_size >= 1, "--chunk-size must be at least 1");
        config.chunk_size = chunk_size;
    }
    if let Some(delay) = args.inter_chunk_delay_ms {
        config.inter_chunk_delay_ms = delay;
    }
    if let Some(max_retries) = args.max_retries {
        anyhow::ensure!(max_retries >= 1, "--max-retries must be at least 1");
        config.max_retries = max_retries;
    }
    if let Some(delay) = args.retry_delay_ms {
        config.retry_delay_ms = delay;
    }
    if args.enrich {
        config.enrichment_enabled = true;
    }
    if let Some(concurrency) = args.detail_concurrency {
        anyhow::ensure!(concurrency >= 1, "--detail-concurrency must be at least 1");
        config.detail_concurrency = concurrency;
    }
    if let Some(output) = &args.output {
        config.output_path.clone_from(output);
    }
    Ok(())
}

/// Runs a full harvest, prints the run report and writes the CSV.
///
/// When `dry_run` is `true` the resolved plan is printed and nothing is
/// fetched.
///
/// # Errors
///
/// Returns an error if the orchestrator cannot be built, discovery fails, or
/// the CSV cannot be written. Contained page failures are not errors.
pub(crate) async fn run_scrape(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        for line in plan_lines(config) {
            println!("{line}");
        }
        return Ok(());
    }

    let orchestrator = Orchestrator::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build catalog client: {e}"))?;
    let options = RunOptions::from_config(config);
    let output = orchestrator.run(&options).await?;

    for line in output.stats.report() {
        println!("{line}");
    }

    let records = output.records.into_vec();
    write_csv_file(&config.output_path, &records, config.enrichment_enabled)?;
    println!(
        "wrote {} records to {}",
        records.len(),
        config.output_path.display()
    );

    if output.stats.is_degraded() {
        tracing::warn!(
            errors = output.stats.errors.len(),
            "run completed in degraded state; see report above"
        );
    }
    Ok(())
}

/// Issues only the discovery call and prints the catalog size.
///
/// # Errors
///
/// Returns an error if the orchestrator cannot be built or discovery fails.
pub(crate) async fn run_discover(config: &AppConfig) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build catalog client: {e}"))?;
    let discovery = orchestrator.discover().await?;

    println!("total pages: {}", discovery.total_pages);
    match discovery.total_items {
        Some(items) => println!("total items: {items}"),
        None => println!("total items: unknown"),
    }
    Ok(())
}

fn plan_lines(config: &AppConfig) -> Vec<String> {
    let pages = if config.autodetect_pages() {
        "discover from API".to_owned()
    } else {
        format!("{} starting at {}", config.page_count, config.first_page)
    };
    let enrichment = if config.enrichment_enabled {
        format!("on ({} per page)", config.detail_concurrency)
    } else {
        "off".to_owned()
    };

    vec![
        "dry-run: no requests will be made".to_owned(),
        format!("  listing endpoint: {}", config.base_url),
        format!("  detail endpoint:  {}", config.detail_base_url),
        format!("  pages:            {pages}"),
        format!(
            "  chunking:         {} pages per chunk, {} ms between chunks",
            config.chunk_size, config.inter_chunk_delay_ms
        ),
        format!(
            "  retries:          {} attempts, {} ms apart",
            config.max_retries, config.retry_delay_ms
        ),
        format!("  enrichment:       {enrichment}"),
        format!("  output:           {}", config.output_path.display()),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            base_url: "https://catalog.test/stock".to_owned(),
            detail_base_url: "https://catalog.test/car".to_owned(),
            page_count: 0,
            first_page: 1,
            chunk_size: 4,
            inter_chunk_delay_ms: 0,
            max_retries: 5,
            retry_delay_ms: 500,
            enrichment_enabled: false,
            detail_concurrency: 1,
            request_timeout_secs: 30,
            user_agent: "carzone-test/0.1".to_owned(),
            log_level: "info".to_owned(),
            output_path: PathBuf::from("./carzone_results.csv"),
        }
    }

    #[test]
    fn no_overrides_leave_config_untouched() {
        let mut cfg = config();
        apply_overrides(&mut cfg, &ScrapeArgs::default()).unwrap();
        assert_eq!(cfg.page_count, 0);
        assert_eq!(cfg.chunk_size, 4);
        assert!(!cfg.enrichment_enabled);
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut cfg = config();
        let args = ScrapeArgs {
            pages: Some(12),
            first_page: Some(0),
            chunk_size: Some(8),
            max_retries: Some(2),
            enrich: true,
            detail_concurrency: Some(3),
            output: Some(PathBuf::from("/tmp/out.csv")),
            ..ScrapeArgs::default()
        };
        apply_overrides(&mut cfg, &args).unwrap();
        assert_eq!(cfg.page_count, 12);
        assert_eq!(cfg.first_page, 0);
        assert_eq!(cfg.chunk_size, 8);
        assert_eq!(cfg.max_retries, 2);
        assert!(cfg.enrichment_enabled);
        assert_eq!(cfg.detail_concurrency, 3);
        assert_eq!(cfg.output_path, PathBuf::from("/tmp/out.csv"));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut cfg = config();
        let args = ScrapeArgs {
            chunk_size: Some(0),
            ..ScrapeArgs::default()
        };
        assert!(apply_overrides(&mut cfg, &args).is_err());
    }

    #[test]
    fn zero_max_retries_is_rejected() {
        let mut cfg = config();
        let args = ScrapeArgs {
            max_retries: Some(0),
            ..ScrapeArgs::default()
        };
        assert!(apply_overrides(&mut cfg, &args).is_err());
    }

    #[test]
    fn plan_mentions_discovery_when_autodetecting() {
        let lines = plan_lines(&config());
        assert!(lines.iter().any(|l| l.contains("discover from API")));
        assert!(lines.iter().any(|l| l.contains("enrichment:") && l.ends_with("off")));
    }

    #[test]
    fn plan_shows_explicit_page_range() {
        let mut cfg = config();
        cfg.page_count = 40;
        cfg.enrichment_enabled = true;
        let lines = plan_lines(&cfg);
        assert!(lines.iter().any(|l| l.ends_with("40 starting at 1")));
        assert!(lines.iter().any(|l| l.ends_with("on (1 per page)")));
    }

    #[tokio::test]
    async fn dry_run_makes_no_requests() {
        let mut cfg = config();
        cfg.base_url = "http://127.0.0.1:1/stock".to_owned();
        assert!(run_scrape(&cfg, true).await.is_ok());
    }
}
