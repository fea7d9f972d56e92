// 📜 History Store - Append-only, date-keyed ledger of new logical ids
//
// Identity persists, values accumulate: every logical id lands in exactly one
// DayRecord for the lifetime of the store. Same-day re-runs merge into the day.
//
// On-disk shape (kept compatible with existing stores):
//   {"days": [{"date": "YYYY-MM-DD", "added_oracles": [...],
//              "total_cards": N, "first_run": bool}]}
// Pre-migration records carry printing ids under "added_cards" instead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ChronicleError, Result};

// ============================================================================
// DAY RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    /// Calendar day (UTC); unique within a History
    pub date: NaiveDate,

    /// Logical ids first observed on this day
    #[serde(rename = "added_oracles")]
    pub new_logical_ids: BTreeSet<String>,

    /// Tracked logical cards as of this day (display only)
    #[serde(rename = "total_cards")]
    pub total_logical_count: usize,

    /// Only the record seeded by a bootstrap run
    #[serde(rename = "first_run")]
    pub is_initial: bool,
}

impl DayRecord {
    pub fn initial<I>(date: NaiveDate, ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let new_logical_ids: BTreeSet<String> = ids.into_iter().collect();
        DayRecord {
            date,
            total_logical_count: new_logical_ids.len(),
            new_logical_ids,
            is_initial: true,
        }
    }

    pub fn incremental<I>(date: NaiveDate, ids: I, total_logical_count: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        DayRecord {
            date,
            new_logical_ids: ids.into_iter().collect(),
            total_logical_count,
            is_initial: false,
        }
    }
}

// ============================================================================
// LOAD-TIME VARIANTS
// ============================================================================

/// A record written before tracking switched to logical ids.
/// It lists printing ids, which cannot be merged into the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDayRecord {
    pub date: NaiveDate,
    pub printing_ids: Vec<String>,
    pub total_cards: usize,
    pub first_run: bool,
}

impl From<LegacyDayRecord> for DayRecord {
    /// Legacy records keep their date and counts but contribute no identities
    fn from(legacy: LegacyDayRecord) -> Self {
        log::debug!(
            "legacy record {} lists {} printing ids; not tracked",
            legacy.date,
            legacy.printing_ids.len()
        );
        DayRecord {
            date: legacy.date,
            new_logical_ids: BTreeSet::new(),
            total_logical_count: legacy.total_cards,
            is_initial: legacy.first_run,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredDayRecord {
    Current(DayRecord),
    Legacy(LegacyDayRecord),
}

impl StoredDayRecord {
    pub fn normalize(self) -> DayRecord {
        match self {
            StoredDayRecord::Current(record) => record,
            StoredDayRecord::Legacy(legacy) => legacy.into(),
        }
    }
}

/// Raw wire shape; both fields are optional and may be null
#[derive(Deserialize)]
struct RawDayRecord {
    date: NaiveDate,
    #[serde(default)]
    added_oracles: Option<Vec<String>>,
    #[serde(default)]
    added_cards: Option<Vec<String>>,
    #[serde(default)]
    total_cards: usize,
    #[serde(default)]
    first_run: bool,
}

impl From<RawDayRecord> for StoredDayRecord {
    fn from(raw: RawDayRecord) -> Self {
        match (raw.added_oracles, raw.added_cards) {
            (None, Some(printing_ids)) => StoredDayRecord::Legacy(LegacyDayRecord {
                date: raw.date,
                printing_ids,
                total_cards: raw.total_cards,
                first_run: raw.first_run,
            }),
            (oracles, _) => StoredDayRecord::Current(DayRecord {
                date: raw.date,
                new_logical_ids: oracles.unwrap_or_default().into_iter().collect(),
                total_logical_count: raw.total_cards,
                is_initial: raw.first_run,
            }),
        }
    }
}

#[derive(Deserialize)]
struct RawHistory {
    #[serde(default)]
    days: Option<Vec<RawDayRecord>>,
}

// ============================================================================
// HISTORY
// ============================================================================

/// Date-ordered sequence of DayRecords
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct History {
    days: Vec<DayRecord>,
}

impl History {
    pub fn new() -> Self {
        History { days: Vec::new() }
    }

    /// Build from records in any order; sorted by date on the way in.
    /// Records sharing a date are collapsed into one: ids are unioned, the
    /// later record's total wins.
    pub fn from_days(mut days: Vec<DayRecord>) -> Self {
        days.sort_by_key(|d| d.date);

        let mut collapsed: Vec<DayRecord> = Vec::with_capacity(days.len());
        for record in days {
            match collapsed.last_mut() {
                Some(prev) if prev.date == record.date => {
                    log::warn!("collapsing duplicate day record for {}", record.date);
                    prev.new_logical_ids.extend(record.new_logical_ids);
                    prev.total_logical_count = record.total_logical_count;
                    prev.is_initial |= record.is_initial;
                }
                _ => collapsed.push(record),
            }
        }
        History { days: collapsed }
    }

    /// Parse persisted bytes, normalizing legacy records
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let raw: RawHistory = serde_json::from_slice(bytes)?;
        let days = raw
            .days
            .unwrap_or_default()
            .into_iter()
            .map(|d| StoredDayRecord::from(d).normalize())
            .collect();
        Ok(History::from_days(days))
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn last(&self) -> Option<&DayRecord> {
        self.days.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Union of new_logical_ids across all days: the "already seen" set
    pub fn known_logical_ids(&self) -> BTreeSet<String> {
        self.days
            .iter()
            .flat_map(|d| d.new_logical_ids.iter().cloned())
            .collect()
    }

    /// Replace the record with the same date, or insert it in date order
    pub fn upsert(mut self, record: DayRecord) -> Self {
        match self.days.binary_search_by_key(&record.date, |d| d.date) {
            Ok(pos) => self.days[pos] = record,
            Err(pos) => self.days.insert(pos, record),
        }
        self
    }

    /// Logical ids recorded on more than one day (empty for a valid history)
    pub fn duplicate_ids(&self) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for id in self.days.iter().flat_map(|d| d.new_logical_ids.iter()) {
            if !seen.insert(id) {
                duplicates.insert(id.clone());
            }
        }
        duplicates
    }
}

// ============================================================================
// HISTORY STORE
// ============================================================================

/// Durable JSON file holding the History
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, treating a missing or unreadable store as empty.
    /// Corruption is logged, never raised.
    pub fn load(&self) -> History {
        if !self.path.exists() {
            log::info!("no history at {}, starting empty", self.path.display());
            return History::new();
        }

        match self.load_strict() {
            Ok(history) => history,
            Err(err) => {
                log::warn!("{}; treating history as empty", err);
                History::new()
            }
        }
    }

    /// Load, surfacing any read or parse failure as CorruptHistory
    pub fn load_strict(&self) -> Result<History> {
        let bytes = fs::read(&self.path).map_err(|e| self.corrupt(Box::new(e)))?;
        History::from_json(&bytes).map_err(|e| self.corrupt(Box::new(e)))
    }

    /// Replace the stored history atomically (write temp, fsync, rename)
    pub fn save(&self, history: &History) -> Result<()> {
        let bytes = history.to_json().map_err(|e| self.persist_failure(e.into()))?;
        write_atomic(&self.path, &bytes).map_err(|e| self.persist_failure(e))?;
        log::debug!("saved {} day records to {}", history.len(), self.path.display());
        Ok(())
    }

    fn corrupt(&self, source: Box<dyn std::error::Error + Send + Sync>) -> ChronicleError {
        ChronicleError::CorruptHistory {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn persist_failure(&self, source: std::io::Error) -> ChronicleError {
        ChronicleError::PersistFailure {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Write `bytes` to `path` via a sibling temp file and rename.
/// Readers see either the old or the new content, never a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::identity::{resolve, PrintingPreference};
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn create_test_history() -> History {
        History::from_days(vec![
            DayRecord::initial(date("2025-01-01"), ids(&["A", "B"])),
            DayRecord::incremental(date("2025-01-03"), ids(&["C"]), 3),
        ])
    }

    #[test]
    fn test_known_logical_ids_is_union() {
        let known = create_test_history().known_logical_ids();
        assert_eq!(known, ids(&["A", "B", "C"]).into_iter().collect());
    }

    #[test]
    fn test_upsert_replaces_same_date() {
        let history = create_test_history()
            .upsert(DayRecord::incremental(date("2025-01-03"), ids(&["D"]), 4));

        assert_eq!(history.len(), 2);
        let day = history.get(date("2025-01-03")).unwrap();
        assert_eq!(day.new_logical_ids, ids(&["D"]).into_iter().collect());
        assert_eq!(day.total_logical_count, 4);
    }

    #[test]
    fn test_upsert_inserts_in_date_order() {
        let history = create_test_history()
            .upsert(DayRecord::incremental(date("2025-01-05"), ids(&["E"]), 4))
            .upsert(DayRecord::incremental(date("2025-01-02"), ids(&[]), 2));

        let dates: Vec<NaiveDate> = history.days().iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![date("2025-01-01"), date("2025-01-02"), date("2025-01-03"), date("2025-01-05")]
        );
    }

    #[test]
    fn test_json_shape_matches_store_format() {
        let history = History::from_days(vec![DayRecord::incremental(
            date("2025-02-10"),
            ids(&["z", "a"]),
            12,
        )]);
        let value: serde_json::Value = serde_json::from_slice(&history.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "days": [{
                    "date": "2025-02-10",
                    "added_oracles": ["a", "z"],
                    "total_cards": 12,
                    "first_run": false
                }]
            })
        );
    }

    #[test]
    fn test_empty_new_ids_serialize_as_empty_list() {
        let history = History::from_days(vec![DayRecord::incremental(date("2025-02-10"), ids(&[]), 5)]);
        let text = String::from_utf8(history.to_json().unwrap()).unwrap();
        assert!(text.contains("\"added_oracles\": []"));
    }

    #[test]
    fn test_legacy_record_contributes_no_identities() {
        let raw = br#"{"days": [
            {"date": "2024-11-01", "added_cards": ["print-1", "print-2"], "total_cards": 2, "first_run": true}
        ]}"#;

        let history = History::from_json(raw).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.known_logical_ids().is_empty());
        assert_eq!(history.days()[0].total_logical_count, 2);
        assert!(history.days()[0].is_initial);
    }

    #[test]
    fn test_null_lists_are_current_records() {
        let raw = br#"{"days": [
            {"date": "2025-01-01", "added_oracles": ["A"], "added_cards": null, "total_cards": 1, "first_run": true},
            {"date": "2025-01-02", "added_oracles": null, "added_cards": null, "total_cards": 1, "first_run": false}
        ]}"#;

        let history = History::from_json(raw).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.days()[1].new_logical_ids.is_empty());
        assert_eq!(history.known_logical_ids().len(), 1);
    }

    #[test]
    fn test_stored_variant_classification() {
        let legacy: RawDayRecord =
            serde_json::from_str(r#"{"date": "2024-11-01", "added_cards": ["p"]}"#).unwrap();
        assert!(matches!(StoredDayRecord::from(legacy), StoredDayRecord::Legacy(_)));

        let current: RawDayRecord =
            serde_json::from_str(r#"{"date": "2024-11-01", "added_oracles": ["o"]}"#).unwrap();
        assert!(matches!(StoredDayRecord::from(current), StoredDayRecord::Current(_)));
    }

    #[test]
    fn test_null_days_loads_empty() {
        let history = History::from_json(br#"{"days": null}"#).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_round_trip_through_store() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path().join("history.json"));
        let history = create_test_history();

        store.save(&history).unwrap();
        assert_eq!(store.load(), history);
        assert_eq!(store.load_strict().unwrap(), history);
    }

    #[test]
    fn test_missing_store_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path().join("absent.json"));
        assert!(store.load().is_empty());
        assert!(matches!(
            store.load_strict(),
            Err(ChronicleError::CorruptHistory { .. })
        ));
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("history.json");
        fs::write(&path, b"{\"days\": [ {\"date\": \"not-a-date\"").unwrap();

        let store = HistoryStore::new(&path);
        assert!(store.load().is_empty());
        assert!(store.load_strict().is_err());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("history.json");
        let store = HistoryStore::new(&path);

        store.save(&create_test_history()).unwrap();

        let names: Vec<String> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["history.json"]);
    }

    #[test]
    fn test_save_failure_is_persist_failure() {
        let tmp = TempDir::new().unwrap();
        // Target path is an existing directory: rename over it must fail
        let path = tmp.path().join("occupied");
        fs::create_dir_all(path.join("child")).unwrap();

        let err = HistoryStore::new(&path).save(&History::new()).unwrap_err();
        assert!(matches!(err, ChronicleError::PersistFailure { .. }));
    }

    #[test]
    fn test_duplicate_ids_detects_violation() {
        let history = History::from_days(vec![
            DayRecord::initial(date("2025-01-01"), ids(&["A"])),
            DayRecord::incremental(date("2025-01-02"), ids(&["A", "B"]), 2),
        ]);
        assert_eq!(history.duplicate_ids(), ids(&["A"]).into_iter().collect());
        assert!(create_test_history().duplicate_ids().is_empty());
    }

    #[test]
    fn test_same_date_records_collapse_on_load() {
        let raw = br#"{"days": [
            {"date": "2025-03-01", "added_oracles": ["A"], "total_cards": 1, "first_run": true},
            {"date": "2025-03-02", "added_oracles": ["B"], "total_cards": 2, "first_run": false},
            {"date": "2025-03-02", "added_oracles": ["C"], "total_cards": 3, "first_run": false}
        ]}"#;
        let history = History::from_json(raw).unwrap();

        assert_eq!(history.len(), 2);
        let day = history.get(date("2025-03-02")).unwrap();
        assert_eq!(day.new_logical_ids, ids(&["B", "C"]).into_iter().collect());
        assert_eq!(day.total_logical_count, 3);

        let entries: Vec<CatalogEntry> = ["A", "B", "C", "D"]
            .iter()
            .map(|id| CatalogEntry::new(&format!("p-{}", id), id, id))
            .collect();
        let catalog = resolve(&entries, &PrintingPreference::default());
        let (history, _) = crate::diff::apply(history, &catalog, date("2025-03-02"));

        assert_eq!(history.len(), 2);
        assert!(history.duplicate_ids().is_empty());
        assert_eq!(
            history.get(date("2025-03-02")).unwrap().new_logical_ids,
            ids(&["B", "C", "D"]).into_iter().collect()
        );
    }
}
