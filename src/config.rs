// ⚙️ Configuration - paths, tracked format, printing preference, endpoints

use std::path::PathBuf;
use std::time::Duration;

use crate::identity::PrintingPreference;

/// Cached catalog older than this is downloaded again
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(23 * 60 * 60);

pub const DEFAULT_TRACKED_FORMAT: &str = "brawl";
pub const DEFAULT_REFERENCE_PLATFORM: &str = "arena";
pub const DEFAULT_SPECIAL_MARKERS: [&str; 4] = ["showcase", "borderless", "etched", "extended"];

pub const CACHE_FILE_NAME: &str = "default-cards.json";
pub const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Clone)]
pub struct ChronicleConfig {
    // ========================================================================
    // FILESYSTEM
    // ========================================================================
    /// Directory holding the catalog cache and the history store
    pub data_dir: PathBuf,

    /// Output directory for index.html / feed.xml / style.css
    pub docs_dir: PathBuf,

    // ========================================================================
    // TRACKING POLICY
    // ========================================================================
    /// Format whose legality decides catalog inclusion
    pub tracked_format: String,

    /// Platform tag preferred when choosing a printing
    pub reference_platform: String,

    /// Printing id substrings that mark special treatments
    pub special_markers: Vec<String>,

    /// Max age of the cached catalog before a re-download
    pub cache_max_age: Duration,

    // ========================================================================
    // REMOTE CATALOG
    // ========================================================================
    pub bulk_data_url: String,
    pub bulk_data_type: String,
    pub user_agent: String,
    pub accept: String,

    // ========================================================================
    // SITE
    // ========================================================================
    pub site_url: String,
    pub site_title: String,
    pub repository_url: String,
}

impl Default for ChronicleConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            docs_dir: PathBuf::from("docs"),
            tracked_format: DEFAULT_TRACKED_FORMAT.to_string(),
            reference_platform: DEFAULT_REFERENCE_PLATFORM.to_string(),
            special_markers: DEFAULT_SPECIAL_MARKERS.iter().map(|m| m.to_string()).collect(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            bulk_data_url: "https://api.scryfall.com/bulk-data".to_string(),
            bulk_data_type: "default_cards".to_string(),
            user_agent: "BrawlChronicle/1.0".to_string(),
            accept: "application/json;q=0.9,*/*;q=0.8".to_string(),
            site_url: "https://mikulas.github.io/brawl-chronicle/".to_string(),
            site_title: "Brawl Chronicle".to_string(),
            repository_url: "https://github.com/Mikulas/brawl-chronicle".to_string(),
        }
    }
}

impl ChronicleConfig {
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE_NAME)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE_NAME)
    }

    /// Printing preference policy derived from this config
    pub fn preference(&self) -> PrintingPreference {
        PrintingPreference::new(&self.reference_platform, &self.special_markers)
    }

    /// One-line description of the tracked format, used by the site
    pub fn site_description(&self) -> String {
        format!(
            "Daily tracking of new Magic: The Gathering cards legal in {} format",
            capitalize(&self.tracked_format)
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = ChronicleConfig::default();
        assert_eq!(config.cache_path(), PathBuf::from("data").join("default-cards.json"));
        assert_eq!(config.history_path(), PathBuf::from("data").join("history.json"));
    }

    #[test]
    fn test_default_cache_max_age_is_23_hours() {
        assert_eq!(ChronicleConfig::default().cache_max_age.as_secs(), 23 * 3600);
    }

    #[test]
    fn test_site_description_capitalizes_format() {
        let config = ChronicleConfig::default();
        assert_eq!(
            config.site_description(),
            "Daily tracking of new Magic: The Gathering cards legal in Brawl format"
        );
    }
}
