// ➕ Diff Engine - What is new today?
//
// Two run modes, classified once at run start:
// - Bootstrap: history is empty or knows no logical ids (fresh store, or only
//   legacy records). Seeds a single initial record, discarding prior days.
// - Incremental: records ids never seen before. Writes a record when there is
//   something new or when today has no record yet (tracks total drift).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::history::{DayRecord, History};
use crate::identity::LogicalCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    Bootstrap,
    Incremental,
}

impl RunMode {
    pub fn classify(history: &History) -> Self {
        if history.is_empty() || history.known_logical_ids().is_empty() {
            RunMode::Bootstrap
        } else {
            RunMode::Incremental
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DiffOutcome {
    /// History replaced by a single initial record
    Bootstrapped { total: usize, discarded_days: usize },

    /// Today's record written (new or replaced)
    Recorded { new_ids: Vec<String>, total: usize },

    /// Today already recorded and nothing new
    Unchanged { total: usize },
}

impl DiffOutcome {
    pub fn total(&self) -> usize {
        match self {
            DiffOutcome::Bootstrapped { total, .. }
            | DiffOutcome::Recorded { total, .. }
            | DiffOutcome::Unchanged { total } => *total,
        }
    }
}

/// Logical ids present now but absent from every recorded day, ascending
pub fn find_new_ids(known: &BTreeSet<String>, current: &LogicalCatalog) -> Vec<String> {
    current
        .ids()
        .filter(|id| !known.contains(*id))
        .map(str::to_string)
        .collect()
}

/// Apply today's catalog to the history
pub fn apply(history: History, current: &LogicalCatalog, today: NaiveDate) -> (History, DiffOutcome) {
    match RunMode::classify(&history) {
        RunMode::Bootstrap => bootstrap(history, current, today),
        RunMode::Incremental => incremental(history, current, today),
    }
}

fn bootstrap(history: History, current: &LogicalCatalog, today: NaiveDate) -> (History, DiffOutcome) {
    let discarded_days = history.len();
    if discarded_days > 0 {
        log::warn!(
            "history has {} days but no logical ids; reseeding from current catalog",
            discarded_days
        );
    }

    let record = DayRecord::initial(today, current.ids().map(str::to_string));
    let outcome = DiffOutcome::Bootstrapped {
        total: record.total_logical_count,
        discarded_days,
    };
    (History::from_days(vec![record]), outcome)
}

fn incremental(history: History, current: &LogicalCatalog, today: NaiveDate) -> (History, DiffOutcome) {
    let known = history.known_logical_ids();
    let new_ids = find_new_ids(&known, current);
    let total = current.len();

    let last_is_today = history.last().map(|d| d.date) == Some(today);
    if new_ids.is_empty() && last_is_today {
        return (history, DiffOutcome::Unchanged { total });
    }

    // A later run on the same day keeps what today already credited
    let record = match history.get(today) {
        Some(existing) => DayRecord {
            date: today,
            new_logical_ids: existing
                .new_logical_ids
                .iter()
                .cloned()
                .chain(new_ids.iter().cloned())
                .collect(),
            total_logical_count: total,
            is_initial: existing.is_initial,
        },
        None => DayRecord::incremental(today, new_ids.iter().cloned(), total),
    };
    (history.upsert(record), DiffOutcome::Recorded { new_ids, total })
}

// ============================================================================
// TESTS
// ============================================================================
