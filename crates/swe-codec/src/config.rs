//! Configuration for stream parsers and writers.

use serde::{Deserialize, Serialize};

/// Configuration shared by all codecs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Allocate a fresh block for every parsed record.
    ///
    /// When false, each record is decoded into the previous record's
    /// storage, so blocks returned earlier see later values.
    pub renew_data_block: bool,

    /// Skip to the next block separator after a text parse error instead
    /// of failing every later call.
    pub resync_on_error: bool,

    /// Largest array size accepted from a stream.
    pub max_array_size: usize,

    /// Longest string accepted from a stream, in bytes.
    pub max_string_length: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            renew_data_block: true,
            resync_on_error: true,
            max_array_size: 1_000_000,
            max_string_length: 65_535,
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SWE_RENEW_DATA_BLOCK") {
            config.renew_data_block = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("SWE_RESYNC_ON_ERROR") {
            config.resync_on_error = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("SWE_MAX_ARRAY_SIZE") {
            if let Ok(size) = val.parse() {
                config.max_array_size = size;
            }
        }

        if let Ok(val) = std::env::var("SWE_MAX_STRING_LENGTH") {
            if let Ok(size) = val.parse() {
                config.max_string_length = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_array_size == 0 {
            return Err("max_array_size must be > 0".to_string());
        }

        if self.max_string_length == 0 {
            return Err("max_string_length must be > 0".to_string());
        }

        if self.max_string_length > u16::MAX as usize {
            return Err(format!(
                "max_string_length must be <= {} (binary length prefix)",
                u16::MAX
            ));
        }

        Ok(())
    }

    pub fn with_renew_data_block(mut self, renew: bool) -> Self {
        self.renew_data_block = renew;
        self
    }

    pub fn with_resync_on_error(mut self, resync: bool) -> Self {
        self.resync_on_error = resync;
        self
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.renew_data_block);
        assert!(config.resync_on_error);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = CodecConfig {
            max_array_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CodecConfig {
            max_string_length: 70_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: CodecConfig = serde_json::from_str(r#"{ "renew_data_block": false }"#).unwrap();
        assert!(!config.renew_data_block);
        assert_eq!(config.max_array_size, 1_000_000);
    }
}
