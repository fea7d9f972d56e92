// Brawl Chronicle - CLI
// `fetch` updates data/history.json, `render` writes docs/; no subcommand does both.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use brawl_chronicle::cache::format_age;
use brawl_chronicle::view::thousands;
use brawl_chronicle::{
    run_fetch, run_render, CatalogOrigin, ChronicleConfig, DiffOutcome, FetchOptions,
    FetchSummary, RenderInputs, RenderSummary, ScryfallSource,
};

/// One year
const MAX_CACHE_AGE_HOURS: u64 = 24 * 365;

#[derive(Parser)]
#[command(author, version, about = "Tracks cards newly legal in Brawl, day by day")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct GlobalOpts {
    /// Directory holding the catalog cache and history.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output directory for the rendered site
    #[arg(long, global = true)]
    docs_dir: Option<PathBuf>,

    /// Format whose legality is tracked
    #[arg(long, global = true)]
    format: Option<String>,

    /// Platform whose printings are preferred
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Re-download the catalog once the cache is this old (1 to 8760)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=MAX_CACHE_AGE_HOURS))]
    cache_max_age_hours: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Update the history from the current catalog
    Fetch {
        /// Never download; use the cached catalog regardless of age
        #[arg(long)]
        offline: bool,
    },

    /// Render index.html and feed.xml from the history
    Render,
}

impl GlobalOpts {
    fn into_config(self) -> ChronicleConfig {
        let mut config = ChronicleConfig::default();
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = self.docs_dir {
            config.docs_dir = dir;
        }
        if let Some(format) = self.format {
            config.tracked_format = format;
        }
        if let Some(platform) = self.platform {
            config.reference_platform = platform;
        }
        if let Some(hours) = self.cache_max_age_hours {
            config.cache_max_age = Duration::from_secs(hours * 60 * 60);
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.opts.into_config();

    match cli.command {
        Some(Command::Fetch { offline }) => fetch(&config, offline)?,
        Some(Command::Render) => render(&config)?,
        None => {
            fetch(&config, false)?;
            render(&config)?;
        }
    }

    Ok(())
}

fn fetch(config: &ChronicleConfig, offline: bool) -> Result<()> {
    println!("🃏 Brawl Chronicle - Fetch");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let source = ScryfallSource::from_config(config)?;
    let today = Utc::now().date_naive();

    let summary = run_fetch(config, &source, today, SystemTime::now(), FetchOptions { offline })
        .context("Fetch run failed")?;

    print_fetch_summary(config, &summary);
    Ok(())
}

fn print_fetch_summary(config: &ChronicleConfig, summary: &FetchSummary) {
    match summary.origin {
        CatalogOrigin::Downloaded => println!("✓ Downloaded fresh catalog"),
        CatalogOrigin::Cache { age } => println!("✓ Using cached catalog ({} old)", format_age(age)),
        CatalogOrigin::StaleCache { age } => {
            println!("⚠️  Offline: using stale catalog ({} old)", format_age(age))
        }
    }
    println!("✓ Loaded {} printings", thousands(summary.printings));
    println!(
        "✓ Found {} {}-legal printings",
        thousands(summary.legal_printings),
        config.tracked_format
    );
    println!("✓ Unique logical cards: {}", thousands(summary.logical_cards));

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    match &summary.outcome {
        DiffOutcome::Bootstrapped { discarded_days, .. } => {
            println!("🌱 First run: initial collection recorded");
            if *discarded_days > 0 {
                println!("⚠️  Replaced {} earlier day records", discarded_days);
            }
        }
        DiffOutcome::Recorded { new_ids, .. } => {
            println!("🎉 {} new cards", thousands(new_ids.len()));
        }
        DiffOutcome::Unchanged { .. } => println!("✓ No new cards"),
    }
    println!("✓ Tracking {} cards", thousands(summary.outcome.total()));
    println!("✓ History saved to {}", summary.history_path.display());
}

fn render(config: &ChronicleConfig) -> Result<()> {
    println!("\n📰 Brawl Chronicle - Render");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let summary = run_render(config, &RenderInputs::from_config(config), Utc::now())
        .context("Render run failed")?;

    print_render_summary(&summary);
    Ok(())
}

fn print_render_summary(summary: &RenderSummary) {
    println!(
        "✓ Rendered {} of {} days",
        summary.rendered_days, summary.days
    );
    for path in &summary.written {
        println!("✓ Wrote {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("brawl-chronicle").chain(args.iter().copied()))
    }

    #[test]
    fn test_cache_max_age_hours_sets_config() {
        let cli = parse(&["fetch", "--cache-max-age-hours", "6"]).unwrap();
        let config = cli.opts.into_config();
        assert_eq!(config.cache_max_age, Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_cache_max_age_hours_out_of_range_is_rejected() {
        assert!(parse(&["--cache-max-age-hours", "0"]).is_err());
        assert!(parse(&["--cache-max-age-hours", "8761"]).is_err());
        assert!(parse(&["--cache-max-age-hours", "18446744073709551615"]).is_err());
        assert!(parse(&["--cache-max-age-hours", "8760"]).is_ok());
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = parse(&["render"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Render)));
        let config = cli.opts.into_config();
        assert_eq!(config.cache_max_age, brawl_chronicle::config::DEFAULT_CACHE_MAX_AGE);
        assert_eq!(config.tracked_format, "brawl");
    }
}
