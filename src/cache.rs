// 💾 Catalog Cache - Local copy of the bulk catalog with a freshness policy

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{ChronicleError, Result};
use crate::history::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No cached snapshot on disk
    Missing,

    /// Younger than the max age; reuse it
    Fresh { age: Duration },

    /// Too old; download again
    Stale { age: Duration },
}

#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
    max_age: Duration,
}

impl CatalogCache {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        CatalogCache {
            path: path.into(),
            max_age,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Classify the cached snapshot by its modification time.
    /// A timestamp in the future counts as age zero.
    pub fn freshness(&self, now: SystemTime) -> Freshness {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => return Freshness::Missing,
        };

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < self.max_age {
            Freshness::Fresh { age }
        } else {
            Freshness::Stale { age }
        }
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| self.cache_error(e))
    }

    /// Replace the cached snapshot atomically
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.path, bytes).map_err(|e| self.cache_error(e))
    }

    fn cache_error(&self, source: std::io::Error) -> ChronicleError {
        ChronicleError::Cache {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Hours with one decimal, for run summaries
pub fn format_age(age: Duration) -> String {
    format!("{:.1} hours", age.as_secs_f64() / 3600.0)
}
