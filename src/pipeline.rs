// 🔄 Pipeline - One fetch run, one render run
//
// fetch:  catalog (cache or source) → parse → filter → resolve → diff → save
// render: history (strict) + cached catalog → view → index.html / feed.xml
//
// Any catalog failure aborts the fetch before history is loaded, so a bad
// download can never shrink or reseed the history.

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::cache::{CatalogCache, Freshness};
use crate::catalog::{parse_snapshot, CatalogEntry};
use crate::config::ChronicleConfig;
use crate::diff::{self, DiffOutcome, RunMode};
use crate::error::{ChronicleError, Result};
use crate::filter::filter_legal;
use crate::history::HistoryStore;
use crate::identity::resolve;
use crate::render::{write_site, SiteInfo};
use crate::source::CatalogSource;
use crate::view::build_view;

// ============================================================================
// CATALOG ACQUISITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    /// Fresh cache reused
    Cache { age: Duration },

    /// Downloaded and cached
    Downloaded,

    /// Offline run used a cache regardless of age
    StaleCache { age: Duration },
}

/// Policy knobs for one fetch run
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Never download; use whatever cache exists
    pub offline: bool,
}

/// Cache when fresh, otherwise the source. A download is parsed before it
/// replaces the cache.
pub fn acquire_catalog(
    cache: &CatalogCache,
    source: &dyn CatalogSource,
    now: SystemTime,
    options: FetchOptions,
) -> Result<(Vec<CatalogEntry>, CatalogOrigin)> {
    let freshness = cache.freshness(now);

    match freshness {
        Freshness::Fresh { age } => {
            log::info!("using cached catalog ({})", crate::cache::format_age(age));
            let entries = parse_snapshot(&cache.read()?)?;
            return Ok((entries, CatalogOrigin::Cache { age }));
        }
        Freshness::Stale { age } if options.offline => {
            log::warn!("offline: using stale catalog ({})", crate::cache::format_age(age));
            let entries = parse_snapshot(&cache.read()?)?;
            return Ok((entries, CatalogOrigin::StaleCache { age }));
        }
        Freshness::Stale { age } => {
            log::info!("cache is {} old, refreshing", crate::cache::format_age(age));
        }
        Freshness::Missing if options.offline => {
            return Err(ChronicleError::source_unavailable(format!(
                "offline and no cached catalog at {}",
                cache.path().display()
            )));
        }
        Freshness::Missing => {
            log::info!("no cached catalog at {}", cache.path().display());
        }
    }

    log::info!("downloading catalog from {}", source.describe());
    let bytes = source.fetch_catalog()?;
    let entries = parse_snapshot(&bytes)?;
    cache.write(&bytes)?;
    log::info!("cached {} printings to {}", entries.len(), cache.path().display());

    Ok((entries, CatalogOrigin::Downloaded))
}

// ============================================================================
// FETCH RUN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub origin: CatalogOrigin,
    pub mode: RunMode,
    pub printings: usize,
    pub legal_printings: usize,
    pub logical_cards: usize,
    pub outcome: DiffOutcome,
    pub history_path: PathBuf,
}

/// Run the daily update for `today` (UTC)
pub fn run_fetch(
    config: &ChronicleConfig,
    source: &dyn CatalogSource,
    today: NaiveDate,
    now: SystemTime,
    options: FetchOptions,
) -> Result<FetchSummary> {
    let cache = CatalogCache::new(config.cache_path(), config.cache_max_age);
    let (entries, origin) = acquire_catalog(&cache, source, now, options)?;

    let legal = filter_legal(&entries, &config.tracked_format);
    log::info!("found {} {}-legal printings", legal.len(), config.tracked_format);

    let logical = resolve(&legal, &config.preference());
    log::info!("unique logical cards: {}", logical.len());

    let store = HistoryStore::new(config.history_path());
    let history = store.load();
    let mode = RunMode::classify(&history);
    log::info!("{:?} run for {}", mode, today);

    let (history, outcome) = diff::apply(history, &logical, today);
    store.save(&history)?;

    Ok(FetchSummary {
        origin,
        mode,
        printings: entries.len(),
        legal_printings: legal.len(),
        logical_cards: logical.len(),
        outcome,
        history_path: store.path().to_path_buf(),
    })
}

// ============================================================================
// RENDER RUN
// ============================================================================

#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub days: usize,
    pub rendered_days: usize,
    pub written: Vec<PathBuf>,
}

/// Sources for one render run
#[derive(Debug, Clone)]
pub struct RenderInputs {
    pub history_path: PathBuf,
    pub catalog_path: PathBuf,
    pub out_dir: PathBuf,
}

impl RenderInputs {
    pub fn from_config(config: &ChronicleConfig) -> Self {
        RenderInputs {
            history_path: config.history_path(),
            catalog_path: config.cache_path(),
            out_dir: config.docs_dir.clone(),
        }
    }
}

/// Build the site from persisted history and the cached catalog
pub fn run_render(
    config: &ChronicleConfig,
    inputs: &RenderInputs,
    built_at: DateTime<Utc>,
) -> AnyResult<RenderSummary> {
    let history = HistoryStore::new(&inputs.history_path)
        .load_strict()
        .context("Failed to load history")?;

    let cache = CatalogCache::new(&inputs.catalog_path, config.cache_max_age);
    let entries = parse_snapshot(&cache.read()?).context("Failed to load cached catalog")?;
    log::info!("loaded {} printings from {}", entries.len(), inputs.catalog_path.display());

    // Whole catalog: a card that later lost legality still renders on its day
    let logical = resolve(&entries, &config.preference());
    let days = build_view(&history, &logical);
    let rendered_days = days.iter().filter(|d| d.is_renderable()).count();

    let written = write_site(&inputs.out_dir, &SiteInfo::from_config(config), &days, built_at)?;

    Ok(RenderSummary {
        days: days.len(),
        rendered_days,
        written,
    })
}

// ============================================================================
// TESTS
// ============================================================================
