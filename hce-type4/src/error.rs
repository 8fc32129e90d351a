//! Crate-level error type
//!
//! Codec errors from every layer fold into [`HceError`]. On the protocol
//! path an error becomes a status word; on the configuration path it is
//! returned to the caller with a machine readable code.

use thiserror::Error;

use crate::apdu::{ApduError, StatusWord};
use crate::card::config::ConfigError;
use crate::ndef::NdefError;
use crate::tlv::TlvError;

/// Broad classification of an [`HceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedApdu,
    InvalidNdefFormat,
    InvalidAid,
    InvalidFileId,
    FileNotFound,
    BufferOverflow,
    InvalidState,
    InvalidConfig,
    Unknown,
}

impl ErrorKind {
    /// Machine readable code
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MalformedApdu => "MALFORMED_APDU",
            ErrorKind::InvalidNdefFormat => "INVALID_NDEF_FORMAT",
            ErrorKind::InvalidAid => "INVALID_AID",
            ErrorKind::InvalidFileId => "INVALID_FILE_ID",
            ErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ErrorKind::BufferOverflow => "BUFFER_OVERFLOW",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::InvalidConfig => "INVALID_CONFIG",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Status word reported to the reader for this kind of failure
    pub fn status_word(self) -> StatusWord {
        match self {
            ErrorKind::MalformedApdu | ErrorKind::BufferOverflow => StatusWord::WRONG_LENGTH,
            ErrorKind::FileNotFound | ErrorKind::InvalidFileId => StatusWord::FILE_NOT_FOUND,
            ErrorKind::InvalidState => StatusWord::CONDITIONS_NOT_SATISFIED,
            ErrorKind::InvalidAid
            | ErrorKind::InvalidNdefFormat
            | ErrorKind::InvalidConfig
            | ErrorKind::Unknown => StatusWord::UNKNOWN_ERROR,
        }
    }
}

/// Errors surfaced by the tag
#[derive(Debug, Error)]
pub enum HceError {
    #[error("Malformed APDU: {0}")]
    MalformedApdu(#[from] ApduError),

    #[error("Invalid NDEF data: {0}")]
    Ndef(#[from] NdefError),

    #[error("Invalid Capability Container: {0}")]
    CapabilityContainer(#[from] TlvError),

    #[error("Invalid AID: {0}")]
    InvalidAid(String),

    #[error("Invalid file id {file_id:#06X}: {reason}")]
    InvalidFileId { file_id: u16, reason: &'static str },

    #[error("File {0:#06X} not found")]
    FileNotFound(u16),

    #[error("Buffer overflow: {0}")]
    BufferOverflow(String),

    #[error("Conditions not satisfied: {0}")]
    ConditionsNotSatisfied(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Unknown(String),
}

impl HceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HceError::MalformedApdu(_) => ErrorKind::MalformedApdu,
            HceError::Ndef(e) if e.is_overflow() => ErrorKind::BufferOverflow,
            HceError::Ndef(_) => ErrorKind::InvalidNdefFormat,
            HceError::CapabilityContainer(TlvError::TooLarge(_)) => ErrorKind::BufferOverflow,
            HceError::CapabilityContainer(_) => ErrorKind::Unknown,
            HceError::InvalidAid(_) => ErrorKind::InvalidAid,
            HceError::InvalidFileId { .. } => ErrorKind::InvalidFileId,
            HceError::FileNotFound(_) => ErrorKind::FileNotFound,
            HceError::BufferOverflow(_) => ErrorKind::BufferOverflow,
            HceError::ConditionsNotSatisfied(_) => ErrorKind::InvalidState,
            HceError::Config(_) => ErrorKind::InvalidConfig,
            HceError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Machine readable code, e.g. `"FILE_NOT_FOUND"`
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn status_word(&self) -> StatusWord {
        self.kind().status_word()
    }
}
