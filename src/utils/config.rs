//! Driver configuration

use crate::core::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_FRAME_ID, DEFAULT_READ_TIMEOUT_MS, SENTENCE_TAG,
};
use crate::hardware::channel::ChannelConfig;
use crate::processing::assembler::RecordAssembler;
use crate::processing::parser::SentenceParser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Everything the driver needs to run, with defaults matching the reference
/// device deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Serial device path.
    pub port: String,
    /// Serial line rate.
    pub baud_rate: u32,
    /// Bound on a single blocking line read (milliseconds).
    pub read_timeout_ms: u64,
    /// Sentence tag required in every accepted line.
    pub sentence_tag: String,
    /// Reference-frame label stamped on every record.
    pub frame_id: String,
    /// Verify the trailing sentence checksum instead of just stripping it.
    pub verify_checksum: bool,
    /// Register write asserting the device output rate, sent once per cycle.
    pub output_rate_command: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            sentence_tag: SENTENCE_TAG.to_string(),
            frame_id: DEFAULT_FRAME_ID.to_string(),
            verify_checksum: false,
            output_rate_command: "$VNWRG,07,40*XX".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    Io {
        message: String,
    },
    Serialization {
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
            ConfigError::Io { message } => write!(f, "I/O error: {}", message),
            ConfigError::Serialization { message } => {
                write!(f, "serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl DriverConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("failed to read config file '{}': {}", path_str, e),
        })?;

        let config: DriverConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
                message: format!("failed to parse config file '{}': {}", path_str, e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization {
                message: format!("failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("failed to write config file '{}': {}", path_str, e),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.is_empty() {
            return Err(ConfigError::InvalidParameter {
                parameter: "port".to_string(),
                value: "<empty>".to_string(),
                reason: "a serial device path is required".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "baud_rate".to_string(),
                value: self.baud_rate.to_string(),
                reason: "baud rate must be positive".to_string(),
            });
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "read_timeout_ms".to_string(),
                value: self.read_timeout_ms.to_string(),
                reason: "an unbounded read would hang the loop on a silent device".to_string(),
            });
        }
        if !self.sentence_tag.starts_with('$') {
            return Err(ConfigError::InvalidParameter {
                parameter: "sentence_tag".to_string(),
                value: self.sentence_tag.clone(),
                reason: "sentence tags start with '$'".to_string(),
            });
        }
        if self.frame_id.is_empty() {
            return Err(ConfigError::InvalidParameter {
                parameter: "frame_id".to_string(),
                value: "<empty>".to_string(),
                reason: "records carry a non-empty frame identifier".to_string(),
            });
        }
        if self.output_rate_command.is_empty() {
            return Err(ConfigError::InvalidParameter {
                parameter: "output_rate_command".to_string(),
                value: "<empty>".to_string(),
                reason: "the per-cycle device command must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Channel parameters for `SerialChannel::open`.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::new(&self.port)
            .with_baud_rate(self.baud_rate)
            .with_read_timeout_ms(self.read_timeout_ms)
    }

    /// Parser configured with this tag and checksum policy.
    pub fn parser(&self) -> SentenceParser {
        let mut parser = SentenceParser::with_tag(&self.sentence_tag);
        parser.set_verify_checksum(self.verify_checksum);
        parser
    }

    /// Assembler stamping this frame identifier.
    pub fn assembler(&self) -> RecordAssembler {
        RecordAssembler::new(&self.frame_id)
    }
}
