//! Tag configuration
//!
//! The configuration surface of the emulated tag: AID, initial NDEF records,
//! writability and maximum file size. Stored as JSON, with byte strings
//! encoded as hex (AID) or base64 (record payloads).

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ndef::{rtd, NdefError, NdefMessage, NdefRecord, Tnf};
use crate::type4::{DEFAULT_MAX_FILE_SIZE, NDEF_FILE_ID, NDEF_TAG_APPLICATION_AID};

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "HCE_TYPE4_CONFIG";

/// Custom serde module for base64 encoding of byte vectors
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Vec::new());
        }
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Custom serde module for hex encoding of byte vectors
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(compact).map_err(serde::de::Error::custom)
    }
}

/// Errors raised while loading or interpreting a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration has no NDEF records")]
    NoRecords,

    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: NdefError,
    },
}

/// One record of the initial NDEF message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Record type, e.g. `"T"`, `"U"` or `"text/plain"`
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(with = "base64_bytes", default)]
    pub payload: Vec<u8>,
    /// Defaults to well-known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tnf: Option<Tnf>,
}

impl RecordSpec {
    /// Well-known record with a raw payload
    pub fn new(record_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            record_type: record_type.into(),
            payload,
            tnf: None,
        }
    }

    /// Record with an explicit TNF
    pub fn with_tnf(tnf: Tnf, record_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            record_type: record_type.into(),
            payload,
            tnf: Some(tnf),
        }
    }

    pub fn tnf(&self) -> Tnf {
        self.tnf.unwrap_or(Tnf::WellKnown)
    }

    pub fn to_record(&self) -> Result<NdefRecord, NdefError> {
        let tnf = self.tnf();
        let needs_type = !matches!(tnf, Tnf::Empty | Tnf::Unknown);
        if needs_type && self.record_type.is_empty() {
            return Err(NdefError::InvalidRecord("record type must not be empty"));
        }
        NdefRecord::new(
            tnf,
            self.record_type.as_bytes().to_vec(),
            None,
            self.payload.clone(),
        )
    }
}

impl From<&NdefRecord> for RecordSpec {
    fn from(record: &NdefRecord) -> Self {
        Self {
            record_type: String::from_utf8_lossy(record.record_type()).into_owned(),
            payload: record.payload().to_vec(),
            tnf: match record.tnf() {
                Tnf::WellKnown => None,
                other => Some(other),
            },
        }
    }
}

fn default_max_file_size() -> u16 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_file_id() -> u16 {
    NDEF_FILE_ID
}

/// Emulated tag configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HceConfig {
    #[serde(with = "hex_bytes")]
    pub aid: Vec<u8>,
    pub records: Vec<RecordSpec>,
    #[serde(default)]
    pub writable: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u16,
    #[serde(default = "default_file_id")]
    pub file_id: u16,
}

impl Default for HceConfig {
    fn default() -> Self {
        let greeting = rtd::text("en", "Hello from hce-type4")
            .map(|record| RecordSpec::from(&record))
            .unwrap_or_else(|_| RecordSpec::new("T", Vec::new()));
        Self {
            aid: NDEF_TAG_APPLICATION_AID.to_vec(),
            records: vec![greeting],
            writable: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            file_id: NDEF_FILE_ID,
        }
    }
}

impl HceConfig {
    const DEFAULT_CONFIG_FILE: &'static str = "config.json";

    pub fn new(aid: Vec<u8>, records: Vec<RecordSpec>) -> Self {
        Self {
            aid,
            records,
            ..Self::default()
        }
    }

    /// Get the default configuration path
    pub fn default_path() -> PathBuf {
        // Check environment variable first
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".hce-type4").join(Self::DEFAULT_CONFIG_FILE);
        }
        PathBuf::from("/etc/hce-type4").join(Self::DEFAULT_CONFIG_FILE)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        info!("Loaded tag configuration from {:?}", path);
        Ok(config)
    }

    /// Load a configuration file, falling back to the defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No tag configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save the configuration, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.to_json()?).map_err(io_error)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o644));
        }
        debug!("Saved tag configuration to {:?}", path);
        Ok(())
    }

    /// The initial NDEF message described by `records`
    pub fn message(&self) -> Result<NdefMessage, ConfigError> {
        if self.records.is_empty() {
            return Err(ConfigError::NoRecords);
        }
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.to_record()
                    .map_err(|source| ConfigError::Record { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        NdefMessage::new(records).map_err(|source| ConfigError::Record { index: 0, source })
    }
}
