// Brawl Chronicle - Core Library
// Exposes all modules for use in the CLI, the preview server, and tests

pub mod error;      // Error kinds for a run
pub mod config;     // Paths, tracked format, printing preference
pub mod catalog;    // Catalog entries + snapshot parsing
pub mod filter;     // Legality filter
pub mod identity;   // Printing preference + logical catalog
pub mod history;    // Day records, legacy normalization, durable store
pub mod diff;       // Bootstrap / incremental diff engine
pub mod cache;      // Local catalog cache with freshness policy
pub mod source;     // Remote catalog download
pub mod view;       // History → presentation days
pub mod render;     // index.html / feed.xml
pub mod pipeline;   // fetch and render runs

// Re-export commonly used types
pub use error::{ChronicleError, Result};
pub use config::ChronicleConfig;
pub use catalog::{parse_snapshot, CatalogEntry};
pub use filter::filter_legal;
pub use identity::{resolve, LogicalCatalog, PrintingPreference};
pub use history::{DayRecord, History, HistoryStore, LegacyDayRecord, StoredDayRecord};
pub use diff::{DiffOutcome, RunMode};
pub use cache::{CatalogCache, Freshness};
pub use source::{CatalogSource, ScryfallSource};
pub use view::{build_view, DisplayCard, DisplayDay};
pub use render::{render_html, render_rss, write_site, SiteInfo};
pub use pipeline::{
    run_fetch, run_render,
    CatalogOrigin, FetchOptions, FetchSummary, RenderInputs, RenderSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
