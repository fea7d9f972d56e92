// 🖼️ View Builder - History + cached catalog → presentation days
//
// Only logical ids are persisted, so each day is re-resolved against the
// catalog that is cached NOW. A card may therefore show a different printing
// than the one current on the day it was new. Ids that no longer resolve are
// dropped from their day.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

use crate::catalog::CatalogEntry;
use crate::history::{DayRecord, History};
use crate::identity::LogicalCatalog;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCard {
    pub logical_id: String,
    pub printing_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub card_url: String,
    pub colors: Vec<String>,
    pub cmc: f64,
}

impl DisplayCard {
    pub fn from_entry(logical_id: &str, entry: &CatalogEntry) -> Self {
        DisplayCard {
            logical_id: logical_id.to_string(),
            printing_id: entry.id.clone(),
            name: entry.name.clone(),
            image_url: entry.image_url().map(str::to_string),
            card_url: entry.card_url(),
            colors: entry.colors.clone(),
            cmc: entry.cmc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayDay {
    pub date: NaiveDate,
    /// Empty for the initial day (summary only)
    pub cards: Vec<DisplayCard>,
    pub total_cards: usize,
    pub first_run: bool,
}

impl DisplayDay {
    /// Initial days always render; other days only with at least one card
    pub fn is_renderable(&self) -> bool {
        self.first_run || !self.cards.is_empty()
    }
}

/// Build one day. Cards sorted Wizards style.
pub fn build_day(record: &DayRecord, catalog: &LogicalCatalog) -> DisplayDay {
    let mut cards: Vec<DisplayCard> = if record.is_initial {
        Vec::new()
    } else {
        record
            .new_logical_ids
            .iter()
            .filter_map(|id| catalog.get(id).map(|entry| DisplayCard::from_entry(id, entry)))
            .collect()
    };
    cards.sort_by(compare_wizards_style);

    DisplayDay {
        date: record.date,
        cards,
        total_cards: record.total_logical_count,
        first_run: record.is_initial,
    }
}

/// All days, newest first
pub fn build_view(history: &History, catalog: &LogicalCatalog) -> Vec<DisplayDay> {
    let mut days: Vec<DisplayDay> = history
        .days()
        .iter()
        .map(|record| build_day(record, catalog))
        .collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days
}

// ============================================================================
// ORDERING
// ============================================================================

/// W, U, B, R, G, then multicolor, then colorless / unknown
pub fn color_order(colors: &[String]) -> u8 {
    match colors {
        [] => 6,
        [single] => match single.as_str() {
            "W" => 0,
            "U" => 1,
            "B" => 2,
            "R" => 3,
            "G" => 4,
            _ => 6,
        },
        _ => 5,
    }
}

/// Color order, then mana value, then name
pub fn compare_wizards_style(a: &DisplayCard, b: &DisplayCard) -> Ordering {
    color_order(&a.colors)
        .cmp(&color_order(&b.colors))
        .then_with(|| a.cmc.total_cmp(&b.cmc))
        .then_with(|| a.name.cmp(&b.name))
}

/// 1234567 → "1,234,567"
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
