// ⚠️ Error kinds for a chronicle run
// Source and snapshot failures abort before history is touched.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ChronicleError {
    /// Catalog could not be obtained (network, HTTP status, missing bulk entry)
    #[error("catalog source unavailable: {context}")]
    SourceUnavailable {
        context: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Catalog bytes are not a sequence of catalog entries
    #[error("malformed catalog snapshot: {0}")]
    MalformedSnapshot(#[source] serde_json::Error),

    /// History bytes are unreadable. `HistoryStore::load` recovers from this;
    /// only strict loading surfaces it.
    #[error("corrupt history at {path}: {source}")]
    CorruptHistory {
        path: String,
        #[source]
        source: BoxedSource,
    },

    /// Updated history could not be written; nothing was committed
    #[error("failed to persist history to {path}: {source}")]
    PersistFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Local catalog cache could not be read or replaced
    #[error("catalog cache error at {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ChronicleError {
    pub fn source_unavailable(context: impl Into<String>) -> Self {
        ChronicleError::SourceUnavailable {
            context: context.into(),
            source: None,
        }
    }

    pub fn source_failed<E>(context: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ChronicleError::SourceUnavailable {
            context: context.into(),
            source: Some(Box::new(err)),
        }
    }

    /// True for failures that abort a run before any history mutation
    pub fn is_pre_history(&self) -> bool {
        matches!(
            self,
            ChronicleError::SourceUnavailable { .. }
                | ChronicleError::MalformedSnapshot(_)
                | ChronicleError::Cache { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
