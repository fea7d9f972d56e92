// 🔎 Entry Filter - Keep printings legal in the tracked format

use crate::catalog::CatalogEntry;

/// Entries whose legality for `format` is exactly "legal", in input order.
/// Entries without the format key are dropped.
pub fn filter_legal(entries: &[CatalogEntry], format: &str) -> Vec<CatalogEntry> {
    entries
        .iter()
        .filter(|e| e.is_legal_in(format))
        .cloned()
        .collect()
}
