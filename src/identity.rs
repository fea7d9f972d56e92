// 🧬 Identity Resolver - Many printings → one logical card
//
// Identity is the oracle id (shared by every printing of a card).
// The printing id is only a VALUE choice: which rendition represents the card.
//
// Preference, highest first:
// 1. Printing available on the reference platform
// 2. Printing id without a special-treatment marker
// 3. Otherwise keep the rule-1 candidates
// 4. Ties broken by ascending printing id

use std::collections::BTreeMap;

use crate::catalog::CatalogEntry;

// ============================================================================
// PRINTING PREFERENCE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PrintingPreference {
    /// Platform tag that wins rule 1 (e.g. "arena")
    pub platform: String,

    /// Lowercase substrings of a printing id marking special treatments.
    /// This is a heuristic: an ordinary id containing one of these by
    /// coincidence is treated as special too.
    pub special_markers: Vec<String>,
}

impl PrintingPreference {
    pub fn new(platform: &str, special_markers: &[String]) -> Self {
        PrintingPreference {
            platform: platform.to_string(),
            special_markers: special_markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn is_special(&self, printing_id: &str) -> bool {
        let id = printing_id.to_lowercase();
        self.special_markers.iter().any(|m| id.contains(m.as_str()))
    }

    /// Pick the representative printing among candidates of one logical id.
    ///
    /// Candidates are ordered by printing id first, so the result does not
    /// depend on the order they were supplied in.
    pub fn select_best<'a>(&self, candidates: &[&'a CatalogEntry]) -> Option<&'a CatalogEntry> {
        let mut ordered: Vec<&'a CatalogEntry> = candidates.to_vec();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        // Rule 1: reference platform, when any candidate has it
        let on_platform: Vec<&'a CatalogEntry> = ordered
            .iter()
            .copied()
            .filter(|e| e.is_on_platform(&self.platform))
            .collect();
        let pool = if on_platform.is_empty() { ordered } else { on_platform };

        // Rules 2 + 3: regular treatment, falling back to the whole pool
        pool.iter()
            .copied()
            .find(|e| !self.is_special(&e.id))
            .or_else(|| pool.first().copied())
    }
}

impl Default for PrintingPreference {
    fn default() -> Self {
        let markers: Vec<String> = crate::config::DEFAULT_SPECIAL_MARKERS
            .iter()
            .map(|m| m.to_string())
            .collect();
        PrintingPreference::new(crate::config::DEFAULT_REFERENCE_PLATFORM, &markers)
    }
}

// ============================================================================
// LOGICAL CATALOG
// ============================================================================

/// Logical id → chosen printing. Rebuilt from whichever snapshot is current;
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicalCatalog {
    cards: BTreeMap<String, CatalogEntry>,
}

impl LogicalCatalog {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, logical_id: &str) -> Option<&CatalogEntry> {
        self.cards.get(logical_id)
    }

    /// Logical ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }
}

/// Group printings by logical id and choose one per group.
/// Printings without a logical id are skipped.
pub fn resolve(entries: &[CatalogEntry], preference: &PrintingPreference) -> LogicalCatalog {
    let mut groups: BTreeMap<&str, Vec<&CatalogEntry>> = BTreeMap::new();
    let mut untracked = 0usize;

    for entry in entries {
        match entry.logical_id() {
            Some(id) => groups.entry(id).or_default().push(entry),
            None => untracked += 1,
        }
    }

    if untracked > 0 {
        log::debug!("skipped {} printings without a logical id", untracked);
    }

    let cards = groups
        .into_iter()
        .filter_map(|(id, candidates)| {
            preference
                .select_best(&candidates)
                .map(|best| (id.to_string(), best.clone()))
        })
        .collect();

    LogicalCatalog { cards }
}

// ============================================================================
// TESTS
// ============================================================================
