// In: src/config.rs

//! The single source of truth for all snapbridge configuration.
//!
//! A `BridgeConfig` is created once at the adapter boundary (e.g. from a JSON
//! string handed over by the host) and then borrowed, read-only, by every entry
//! point. It holds no per-call state.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Which block codec backs the compress/uncompress family of operations.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// **Default:** the Snappy raw block format.
    #[default]
    Snappy,

    /// A single Zstandard frame that records its content size.
    Zstd,
}

/// What a shuffle does when `length` is not a multiple of the element size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// **Default:** fail the call with `InvalidInput`.
    #[default]
    Reject,

    /// Integer-divide and ignore the trailing partial element. The trailing
    /// bytes are neither read nor written.
    Truncate,
}

//==================================================================================
// II. The Unified BridgeConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct BridgeConfig {
    pub codec: CodecKind,

    /// Compression level used when `codec` is `Zstd`. Ignored otherwise.
    pub zstd_level: i32,

    pub shuffle_remainder: RemainderPolicy,

    /// If false, `array_copy` rejects overlapping source/destination ranges
    /// instead of copying with memmove semantics.
    pub allow_overlapping_copy: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            codec: CodecKind::default(),
            zstd_level: default_zstd_level(),
            shuffle_remainder: RemainderPolicy::default(),
            allow_overlapping_copy: true,
        }
    }
}

impl BridgeConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::InvalidInput(format!("invalid bridge config: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self)
            .map_err(|e| BridgeError::InvalidInput(format!("bridge config not serializable: {}", e)))
    }
}

fn default_zstd_level() -> i32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.codec, CodecKind::Snappy);
        assert_eq!(config.shuffle_remainder, RemainderPolicy::Reject);
        assert_eq!(config.zstd_level, 3);
        assert!(config.allow_overlapping_copy);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            BridgeConfig::from_json(r#"{"codec": "zstd", "shuffle_remainder": "truncate"}"#)
                .unwrap();
        assert_eq!(config.codec, CodecKind::Zstd);
        assert_eq!(config.shuffle_remainder, RemainderPolicy::Truncate);
        assert_eq!(config.zstd_level, 3);
    }

    #[test]
    fn test_invalid_json_is_invalid_input() {
        let result = BridgeConfig::from_json(r#"{"codec": "lz4"}"#);
        assert!(matches!(result, Err(BridgeError::InvalidInput(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = BridgeConfig {
            codec: CodecKind::Zstd,
            zstd_level: 9,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(BridgeConfig::from_json(&json).unwrap(), config);
    }
}
