//! Provider configuration.

use serde::{Deserialize, Serialize};

/// Source type tag used when none is configured.
pub const DEFAULT_SOURCE_TYPE: &str = "dynamicTokenList";

/// Tuning knobs for a dynamic token list source.
///
/// Values are intentionally explicit about their units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    /// Source type tag matched against seeds and echoed on fetch events.
    #[serde(rename = "type")]
    pub source_type: String,
    /// How close (in items) the viewport may get to an open frontier before
    /// a fetch is scheduled.
    pub cache_chunk_size: usize,
    /// Retries allowed per frontier page after the initial attempt.
    pub fetch_retries: u32,
    /// Deadline for each outstanding fetch, in logical milliseconds.
    pub fetch_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_type: DEFAULT_SOURCE_TYPE.to_string(),
            cache_chunk_size: 10,
            fetch_retries: 2,
            fetch_timeout_ms: 5_000,
        }
    }
}

impl SourceConfig {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            ..Self::default()
        }
    }

    pub fn with_cache_chunk_size(mut self, cache_chunk_size: usize) -> Self {
        self.cache_chunk_size = cache_chunk_size.max(1);
        self
    }

    pub fn with_fetch_retries(mut self, fetch_retries: u32) -> Self {
        self.fetch_retries = fetch_retries;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = fetch_timeout_ms.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol() {
        let config = SourceConfig::default();
        assert_eq!(config.source_type, "dynamicTokenList");
        assert_eq!(config.cache_chunk_size, 10);
        assert_eq!(config.fetch_retries, 2);
        assert_eq!(config.fetch_timeout_ms, 5_000);
    }

    #[test]
    fn builder_clamps_degenerate_values() {
        let config = SourceConfig::new("magic")
            .with_cache_chunk_size(0)
            .with_fetch_timeout(0);
        assert_eq!(config.source_type, "magic");
        assert_eq!(config.cache_chunk_size, 1);
        assert_eq!(config.fetch_timeout_ms, 1);
    }

    #[test]
    fn serde_uses_wire_names() {
        let config = SourceConfig::new("magic")
            .with_cache_chunk_size(42)
            .with_fetch_retries(3)
            .with_fetch_timeout(2_000);
        let encoded = serde_json::to_value(&config).unwrap();
        assert_eq!(encoded["type"], "magic");
        assert_eq!(encoded["cacheChunkSize"], 42);
        assert_eq!(encoded["fetchRetries"], 3);
        assert_eq!(encoded["fetchTimeoutMs"], 2_000);

        let decoded: SourceConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(decoded, SourceConfig::default());
    }
}
