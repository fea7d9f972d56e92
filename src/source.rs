// 🌐 Catalog Source - Where raw catalog bytes come from
//
// ScryfallSource resolves the bulk-data index to a download URI, then fetches
// the snapshot. Gzip bodies are decoded when the response says so.

use flate2::read::GzDecoder;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_ENCODING, USER_AGENT};
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

use crate::config::ChronicleConfig;
use crate::error::{ChronicleError, Result};

/// Anything able to produce raw catalog bytes
pub trait CatalogSource {
    fn fetch_catalog(&self) -> Result<Vec<u8>>;

    /// Short label for logs and summaries
    fn describe(&self) -> String;
}

// ============================================================================
// BULK DATA INDEX
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDataIndex {
    pub data: Vec<BulkDataItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDataItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub download_uri: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl BulkDataIndex {
    pub fn find(&self, kind: &str) -> Option<&BulkDataItem> {
        self.data.iter().find(|item| item.kind == kind)
    }
}

// ============================================================================
// SCRYFALL SOURCE
// ============================================================================

pub struct ScryfallSource {
    client: Client,
    bulk_data_url: String,
    bulk_data_type: String,
    user_agent: String,
    accept: String,
}

impl ScryfallSource {
    pub fn from_config(config: &ChronicleConfig) -> Result<Self> {
        // Bulk files are large; no overall request timeout
        let client = Client::builder()
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(|e| ChronicleError::source_failed("failed to build HTTP client", e))?;

        Ok(ScryfallSource {
            client,
            bulk_data_url: config.bulk_data_url.clone(),
            bulk_data_type: config.bulk_data_type.clone(),
            user_agent: config.user_agent.clone(),
            accept: config.accept.clone(),
        })
    }

    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, &self.accept)
            .send()
            .map_err(|e| ChronicleError::source_failed(format!("GET {} failed", url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChronicleError::source_unavailable(format!(
                "GET {} returned HTTP {}",
                url, status
            )));
        }
        Ok(response)
    }

    /// Step 1: look up the download URI for the configured bulk type
    pub fn download_uri(&self) -> Result<String> {
        let index: BulkDataIndex = self
            .get(&self.bulk_data_url)?
            .json()
            .map_err(|e| ChronicleError::source_failed("unreadable bulk data index", e))?;

        let item = index.find(&self.bulk_data_type).ok_or_else(|| {
            ChronicleError::source_unavailable(format!(
                "{} not found in bulk data",
                self.bulk_data_type
            ))
        })?;

        if let Some(updated_at) = &item.updated_at {
            log::info!("{} updated at {}", item.kind, updated_at);
        }
        Ok(item.download_uri.clone())
    }

    /// Step 2: download the snapshot body
    pub fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self.get(uri)?;
        let gzipped = is_gzip(
            response
                .headers()
                .get(CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok()),
        );

        let body = response
            .bytes()
            .map_err(|e| ChronicleError::source_failed(format!("reading body of {} failed", uri), e))?;

        if gzipped {
            log::debug!("decompressing gzip body ({} bytes)", body.len());
            decode_gzip(&body)
        } else {
            Ok(body.to_vec())
        }
    }
}

impl CatalogSource for ScryfallSource {
    fn fetch_catalog(&self) -> Result<Vec<u8>> {
        log::info!("fetching bulk data index from {}", self.bulk_data_url);
        let uri = self.download_uri()?;
        log::info!("downloading from {}", uri);
        self.download(&uri)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.bulk_data_url, self.bulk_data_type)
    }
}

fn is_gzip(content_encoding: Option<&str>) -> bool {
    content_encoding
        .map(|v| v.trim().eq_ignore_ascii_case("gzip"))
        .unwrap_or(false)
}

pub fn decode_gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ChronicleError::source_failed("gzip decoding failed", e))?;
    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_bulk_index_find() {
        let raw = r#"{"object": "list", "data": [
            {"type": "oracle_cards", "download_uri": "https://x/oracle.json"},
            {"type": "default_cards", "download_uri": "https://x/default.json", "updated_at": "2025-01-01T10:00:00.000+00:00"}
        ]}"#;
        let index: BulkDataIndex = serde_json::from_str(raw).unwrap();

        let item = index.find("default_cards").unwrap();
        assert_eq!(item.download_uri, "https://x/default.json");
        assert!(index.find("all_cards").is_none());
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(Some("gzip")));
        assert!(is_gzip(Some(" GZIP ")));
        assert!(!is_gzip(Some("br")));
        assert!(!is_gzip(None));
    }

    #[test]
    fn test_decode_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"[{\"id\": \"p\"}]").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode_gzip(&compressed).unwrap(), b"[{\"id\": \"p\"}]");
    }

    #[test]
    fn test_decode_gzip_rejects_plain_bytes() {
        let err = decode_gzip(b"[]").unwrap_err();
        assert!(matches!(err, ChronicleError::SourceUnavailable { .. }));
    }
}
