//! NDEF (NFC Data Exchange Format) codec
//!
//! Records and messages as stored in a Type 4 Tag NDEF file. Parsing
//! reassembles chunked records; serialization never emits chunks.

mod message;
mod record;
pub mod rtd;

pub use message::NdefMessage;
pub use record::{flags, NdefFlags, NdefRecord, Tnf};

use thiserror::Error;

use crate::field::FieldError;

/// Errors raised while building or parsing NDEF data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NdefError {
    #[error("Unexpected end of data while reading {0}")]
    UnexpectedEnd(&'static str),

    #[error("Reserved TNF value {0}")]
    ReservedTnf(u8),

    #[error("Invalid record: {0}")]
    InvalidRecord(&'static str),

    #[error("Invalid chunk: {0}")]
    InvalidChunk(&'static str),

    #[error("Message ends inside an unterminated chunk sequence")]
    UnterminatedChunk,

    #[error("NDEF message contains no records")]
    EmptyMessage,

    #[error("Invalid text record: {0}")]
    InvalidText(String),

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl NdefError {
    /// True when the failure is a size limit rather than a format violation
    pub fn is_overflow(&self) -> bool {
        matches!(self, NdefError::Field(_))
    }
}
