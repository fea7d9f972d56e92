// 🃏 Catalog Model - One physical printing per entry
// Only the handful of fields the chronicle uses are parsed; the rest of the
// bulk catalog record is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ChronicleError, Result};

pub const LEGAL: &str = "legal";

/// Image sizes tried in order when picking a display image
const IMAGE_PREFERENCE: [&str; 3] = ["normal", "large", "small"];

const CARD_PAGE_BASE: &str = "https://scryfall.com/card/";

/// CatalogEntry - one printing of a card
///
/// `id` is the printing identity (unique per printing).
/// `oracle_id` is the logical identity shared by all printings of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    pub id: String,

    /// Absent for a few layouts (e.g. reversible cards) that carry identity
    /// per face only. Such entries cannot be tracked.
    #[serde(default)]
    pub oracle_id: Option<String>,

    pub name: String,

    // ========================================================================
    // TRACKING ATTRIBUTES
    // ========================================================================
    #[serde(default)]
    pub legalities: BTreeMap<String, String>,

    #[serde(default)]
    pub games: Vec<String>,

    // ========================================================================
    // DISPLAY ATTRIBUTES (view builder only)
    // ========================================================================
    #[serde(default)]
    pub mana_cost: Option<String>,

    #[serde(default)]
    pub cmc: f64,

    #[serde(default)]
    pub type_line: Option<String>,

    #[serde(default)]
    pub colors: Vec<String>,

    #[serde(default)]
    pub color_identity: Vec<String>,

    #[serde(default)]
    pub rarity: Option<String>,

    #[serde(default)]
    pub set_name: Option<String>,

    #[serde(default)]
    pub image_uris: Option<BTreeMap<String, String>>,
}

impl CatalogEntry {
    /// Create an entry with identity fields only
    pub fn new(id: &str, oracle_id: &str, name: &str) -> Self {
        CatalogEntry {
            id: id.to_string(),
            oracle_id: Some(oracle_id.to_string()),
            name: name.to_string(),
            legalities: BTreeMap::new(),
            games: Vec::new(),
            mana_cost: None,
            cmc: 0.0,
            type_line: None,
            colors: Vec::new(),
            color_identity: Vec::new(),
            rarity: None,
            set_name: None,
            image_uris: None,
        }
    }

    /// Builder pattern: set legality for a format
    pub fn with_legality(mut self, format: &str, status: &str) -> Self {
        self.legalities.insert(format.to_string(), status.to_string());
        self
    }

    /// Builder pattern: add a platform tag
    pub fn with_game(mut self, game: &str) -> Self {
        self.games.push(game.to_string());
        self
    }

    /// Builder pattern: colors and mana value
    pub fn with_cost(mut self, colors: &[&str], cmc: f64) -> Self {
        self.colors = colors.iter().map(|c| c.to_string()).collect();
        self.cmc = cmc;
        self
    }

    /// Builder pattern: normal-size image
    pub fn with_image(mut self, url: &str) -> Self {
        self.image_uris
            .get_or_insert_with(BTreeMap::new)
            .insert("normal".to_string(), url.to_string());
        self
    }

    /// Logical identity, if the printing carries one
    pub fn logical_id(&self) -> Option<&str> {
        self.oracle_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_legal_in(&self, format: &str) -> bool {
        self.legalities.get(format).map(String::as_str) == Some(LEGAL)
    }

    pub fn is_on_platform(&self, platform: &str) -> bool {
        self.games.iter().any(|g| g == platform)
    }

    /// Best available image: normal, then large, then small
    pub fn image_url(&self) -> Option<&str> {
        let uris = self.image_uris.as_ref()?;
        IMAGE_PREFERENCE
            .iter()
            .find_map(|size| uris.get(*size))
            .map(String::as_str)
    }

    pub fn card_url(&self) -> String {
        format!("{}{}", CARD_PAGE_BASE, self.id)
    }
}

/// Parse raw catalog bytes (a JSON array of printings)
pub fn parse_snapshot(bytes: &[u8]) -> Result<Vec<CatalogEntry>> {
    serde_json::from_slice(bytes).map_err(ChronicleError::MalformedSnapshot)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let raw = br#"[{
            "object": "card",
            "id": "p-1",
            "oracle_id": "o-1",
            "name": "Llanowar Elves",
            "lang": "en",
            "legalities": {"brawl": "legal", "standard": "not_legal"},
            "games": ["paper", "arena"],
            "cmc": 1.0,
            "colors": ["G"],
            "image_uris": {"small": "s.jpg", "normal": "n.jpg"}
        }]"#;

        let entries = parse_snapshot(raw).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.logical_id(), Some("o-1"));
        assert!(entry.is_legal_in("brawl"));
        assert!(!entry.is_legal_in("standard"));
        assert!(entry.is_on_platform("arena"));
        assert_eq!(entry.image_url(), Some("n.jpg"));
        assert_eq!(entry.card_url(), "https://scryfall.com/card/p-1");
    }

    #[test]
    fn test_parse_minimal_entry_defaults() {
        let raw = br#"[{"id": "p-2", "name": "Reversible"}]"#;
        let entries = parse_snapshot(raw).unwrap();
        assert_eq!(entries[0].logical_id(), None);
        assert!(entries[0].legalities.is_empty());
        assert_eq!(entries[0].image_url(), None);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_snapshot(br#"{"data": []}"#).unwrap_err();
        assert!(matches!(err, ChronicleError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_image_url_falls_back_to_large_then_small() {
        let raw = br#"[
            {"id": "a", "name": "A", "image_uris": {"large": "l.jpg", "small": "s.jpg"}},
            {"id": "b", "name": "B", "image_uris": {"small": "s.jpg"}}
        ]"#;
        let entries = parse_snapshot(raw).unwrap();
        assert_eq!(entries[0].image_url(), Some("l.jpg"));
        assert_eq!(entries[1].image_url(), Some("s.jpg"));
    }

    #[test]
    fn test_empty_oracle_id_is_not_a_logical_id() {
        let raw = br#"[{"id": "p", "oracle_id": "", "name": "X"}]"#;
        let entries = parse_snapshot(raw).unwrap();
        assert_eq!(entries[0].logical_id(), None);
    }
}
