//! APDU (Application Protocol Data Unit) handling
//!
//! Codec for the ISO 7816-4 command subset spoken by an NFC Forum Type 4
//! Tag: SELECT, READ BINARY and UPDATE BINARY. Anything else is captured as
//! an opaque [`Command::Unknown`].
//!
//! # Example
//! ```ignore
//! use hce_type4::apdu::{Command, Response};
//!
//! // Parse an incoming APDU
//! let raw = &[0x00, 0xA4, 0x04, 0x00, 0x07, 0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01];
//! let command = Command::parse(raw).unwrap();
//! assert_eq!(command.ins(), 0xA4);
//!
//! // Create a success response
//! let response = Response::success(vec![0x01, 0x02, 0x03]);
//! assert!(response.is_okay());
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::StatusWord;

use thiserror::Error;

use crate::field::{ByteField, CompositeField, FieldError};

/// CLA byte used by every Type 4 Tag command
pub const CLA_STANDARD: u8 = 0x00;

/// Longest data field a short APDU can carry
pub const MAX_SHORT_DATA: usize = 255;

/// Errors that can occur during APDU parsing and building
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApduError {
    #[error("APDU too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("{command}: Lc of {lc} does not match APDU length {actual}")]
    LcMismatch {
        command: &'static str,
        lc: usize,
        actual: usize,
    },

    #[error("READ BINARY must be exactly 5 bytes, got {0}")]
    ReadBinaryLength(usize),

    #[error("Response too short: expected at least 2 bytes, got {0}")]
    ResponseTooShort(usize),

    #[error("Command data of {0} bytes does not fit a short APDU")]
    DataTooLong(usize),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Type 4 Tag instruction bytes
pub mod ins {
    pub const SELECT: u8 = 0xA4;
    pub const READ_BINARY: u8 = 0xB0;
    pub const UPDATE_BINARY: u8 = 0xD6;
}

/// How a SELECT addresses its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// P1=04: select an application by AID
    ByName,
    /// P1=00: select an elementary file by its 2 byte identifier
    ByFileId,
}

/// P1-P2 parameter bytes
///
/// For READ BINARY and UPDATE BINARY this is the 15-bit file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Params {
    pub p1: u8,
    pub p2: u8,
}

impl Params {
    /// SELECT by DF name, first or only occurrence
    pub const SELECT_BY_NAME: Params = Params::new(0x04, 0x00);
    /// SELECT by file identifier, no response data
    pub const SELECT_BY_FILE_ID: Params = Params::new(0x00, 0x0C);
    /// SELECT by file identifier, FCI requested (accepted from older readers)
    pub const SELECT_BY_FILE_ID_FCI: Params = Params::new(0x00, 0x00);

    pub const fn new(p1: u8, p2: u8) -> Self {
        Self { p1, p2 }
    }

    /// Parameters encoding a big-endian offset
    pub fn from_offset(offset: u16) -> Self {
        let [p1, p2] = offset.to_be_bytes();
        Self { p1, p2 }
    }

    /// P1-P2 combined as a u16
    pub fn value(self) -> u16 {
        u16::from_be_bytes([self.p1, self.p2])
    }

    /// P1-P2 read as a file offset
    pub fn offset(self) -> u16 {
        self.value()
    }

    /// Classify SELECT parameters, `None` for combinations we do not support
    pub fn select_mode(self) -> Option<SelectMode> {
        match self {
            Self::SELECT_BY_NAME => Some(SelectMode::ByName),
            Self::SELECT_BY_FILE_ID | Self::SELECT_BY_FILE_ID_FCI => Some(SelectMode::ByFileId),
            _ => None,
        }
    }

    fn to_field(self) -> ByteField {
        ByteField::new("P1-P2", vec![self.p1, self.p2])
    }
}

/// A parsed Type 4 Tag command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select {
        params: Params,
        data: Vec<u8>,
    },
    ReadBinary {
        params: Params,
        /// Expected length, 0 means 256
        le: u8,
    },
    UpdateBinary {
        params: Params,
        data: Vec<u8>,
    },
    /// Any other instruction; trailing bytes are kept verbatim
    Unknown {
        ins: u8,
        params: Params,
        data: Option<Vec<u8>>,
    },
}

impl Command {
    /// Parse raw bytes into a command
    ///
    /// Only short APDUs are understood. SELECT and UPDATE BINARY must be
    /// exactly `CLA INS P1 P2 Lc Data`. READ BINARY must be exactly
    /// `CLA INS P1 P2 Le`. The CLA byte is not interpreted here.
    pub fn parse(raw: &[u8]) -> Result<Self, ApduError> {
        if raw.len() < 4 {
            return Err(ApduError::TooShort {
                expected: 4,
                actual: raw.len(),
            });
        }

        let params = Params::new(raw[2], raw[3]);
        match raw[1] {
            ins::SELECT => {
                let data = parse_lc_data("SELECT", raw)?;
                Ok(Command::Select { params, data })
            }
            ins::READ_BINARY => {
                if raw.len() != 5 {
                    return Err(ApduError::ReadBinaryLength(raw.len()));
                }
                Ok(Command::ReadBinary { params, le: raw[4] })
            }
            ins::UPDATE_BINARY => {
                let data = parse_lc_data("UPDATE BINARY", raw)?;
                Ok(Command::UpdateBinary { params, data })
            }
            ins => Ok(Command::Unknown {
                ins,
                params,
                data: if raw.len() > 4 {
                    Some(raw[4..].to_vec())
                } else {
                    None
                },
            }),
        }
    }

    /// SELECT an application by AID
    pub fn select_by_name(aid: &[u8]) -> Result<Self, ApduError> {
        check_data_len(aid)?;
        Ok(Command::Select {
            params: Params::SELECT_BY_NAME,
            data: aid.to_vec(),
        })
    }

    /// SELECT an elementary file by identifier
    pub fn select_by_file_id(file_id: u16) -> Self {
        Command::Select {
            params: Params::SELECT_BY_FILE_ID,
            data: file_id.to_be_bytes().to_vec(),
        }
    }

    /// READ BINARY `le` bytes (0 means 256) from `offset`
    pub fn read_binary(offset: u16, le: u8) -> Self {
        Command::ReadBinary {
            params: Params::from_offset(offset),
            le,
        }
    }

    /// UPDATE BINARY with `data` at `offset`
    pub fn update_binary(offset: u16, data: &[u8]) -> Result<Self, ApduError> {
        check_data_len(data)?;
        Ok(Command::UpdateBinary {
            params: Params::from_offset(offset),
            data: data.to_vec(),
        })
    }

    /// Instruction byte
    pub fn ins(&self) -> u8 {
        match self {
            Command::Select { .. } => ins::SELECT,
            Command::ReadBinary { .. } => ins::READ_BINARY,
            Command::UpdateBinary { .. } => ins::UPDATE_BINARY,
            Command::Unknown { ins, .. } => *ins,
        }
    }

    pub fn params(&self) -> Params {
        match self {
            Command::Select { params, .. }
            | Command::ReadBinary { params, .. }
            | Command::UpdateBinary { params, .. }
            | Command::Unknown { params, .. } => *params,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Select { .. } => "SELECT",
            Command::ReadBinary { .. } => "READ BINARY",
            Command::UpdateBinary { .. } => "UPDATE BINARY",
            Command::Unknown { .. } => "UNKNOWN",
        }
    }

    fn to_field(&self) -> Result<CompositeField, ApduError> {
        let mut field = CompositeField::new(self.name());
        field.push(ByteField::u8("CLA", CLA_STANDARD));
        field.push(ByteField::u8("INS", self.ins()));
        field.push(self.params().to_field());
        match self {
            Command::Select { data, .. } | Command::UpdateBinary { data, .. } => {
                field.push(ByteField::be("Lc", data.len() as u64, 1)?);
                field.push(ByteField::from_slice("Data", data));
            }
            Command::ReadBinary { le, .. } => {
                field.push(ByteField::u8("Le", *le));
            }
            Command::Unknown { data, .. } => {
                field.push_optional(data.as_ref().map(|d| ByteField::from_slice("Data", d)));
            }
        }
        Ok(field)
    }

    /// Serialize to `CLA INS P1 P2 [Lc Data] [Le]`
    ///
    /// Fails if a data field is longer than a short APDU allows.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ApduError> {
        Ok(self.to_field()?.bytes())
    }
}

fn check_data_len(data: &[u8]) -> Result<(), ApduError> {
    if data.len() > MAX_SHORT_DATA {
        return Err(ApduError::DataTooLong(data.len()));
    }
    Ok(())
}

/// Extract the data field of a `CLA INS P1 P2 Lc Data` command
fn parse_lc_data(command: &'static str, raw: &[u8]) -> Result<Vec<u8>, ApduError> {
    if raw.len() < 5 {
        return Err(ApduError::TooShort {
            expected: 5,
            actual: raw.len(),
        });
    }
    let lc = raw[4] as usize;
    if raw.len() != 5 + lc {
        return Err(ApduError::LcMismatch {
            command,
            lc,
            actual: raw.len(),
        });
    }
    Ok(raw[5..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_name() {
        let raw = hex::decode("00A4040007D2760000850101").unwrap();
        let command = Command::parse(&raw).unwrap();
        assert_eq!(
            command,
            Command::Select {
                params: Params::SELECT_BY_NAME,
                data: vec![0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01],
            }
        );
        assert_eq!(command.params().select_mode(), Some(SelectMode::ByName));
        assert_eq!(command.to_bytes().unwrap(), raw);
    }

    #[test]
    fn test_select_by_file_id() {
        let raw = hex::decode("00A4000C02E103").unwrap();
        let command = Command::parse(&raw).unwrap();
        assert_eq!(command, Command::select_by_file_id(0xE103));
        assert_eq!(command.params().select_mode(), Some(SelectMode::ByFileId));
        assert_eq!(Params::new(0x00, 0x00).select_mode(), Some(SelectMode::ByFileId));
        assert_eq!(Params::new(0x02, 0x0C).select_mode(), None);
    }

    #[test]
    fn test_select_lc_mismatch() {
        // trailing Le byte is not accepted
        let raw = hex::decode("00A4040007D276000085010100").unwrap();
        assert!(matches!(
            Command::parse(&raw),
            Err(ApduError::LcMismatch { lc: 7, actual: 13, .. })
        ));
        assert!(matches!(
            Command::parse(&[0x00, 0xA4, 0x04, 0x00]),
            Err(ApduError::TooShort { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn test_read_binary() {
        let command = Command::parse(&[0x00, 0xB0, 0x00, 0x02, 0x0F]).unwrap();
        assert_eq!(command, Command::read_binary(2, 15));
        assert_eq!(command.params().offset(), 2);
        assert_eq!(command.to_bytes().unwrap(), vec![0x00, 0xB0, 0x00, 0x02, 0x0F]);

        assert_eq!(
            Command::parse(&[0x00, 0xB0, 0x00, 0x00]),
            Err(ApduError::ReadBinaryLength(4))
        );
        assert_eq!(
            Command::parse(&[0x00, 0xB0, 0x00, 0x00, 0x0F, 0x00]),
            Err(ApduError::ReadBinaryLength(6))
        );
    }

    #[test]
    fn test_update_binary() {
        let raw = hex::decode("00D6000203D10101").unwrap();
        let command = Command::parse(&raw).unwrap();
        assert_eq!(command, Command::update_binary(2, &[0xD1, 0x01, 0x01]).unwrap());
        assert_eq!(command.to_bytes().unwrap(), raw);
    }

    #[test]
    fn test_unknown_instruction() {
        let raw = [0x00, 0xCA, 0x00, 0x6E, 0x00];
        let command = Command::parse(&raw).unwrap();
        assert_eq!(
            command,
            Command::Unknown {
                ins: 0xCA,
                params: Params::new(0x00, 0x6E),
                data: Some(vec![0x00]),
            }
        );
        assert_eq!(command.to_bytes().unwrap(), raw.to_vec());

        let bare = Command::parse(&[0x00, 0x84, 0x00, 0x00]).unwrap();
        assert_eq!(bare.to_bytes().unwrap(), vec![0x00, 0x84, 0x00, 0x00]);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            Command::parse(&[0x00, 0xA4, 0x04]),
            Err(ApduError::TooShort { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_builder_rejects_long_data() {
        assert_eq!(
            Command::update_binary(0, &[0u8; 256]),
            Err(ApduError::DataTooLong(256))
        );
        assert!(Command::update_binary(0, &[0u8; 255]).is_ok());

        let oversized = Command::Select {
            params: Params::SELECT_BY_NAME,
            data: vec![0u8; 300],
        };
        assert!(matches!(oversized.to_bytes(), Err(ApduError::Field(_))));
    }

    #[test]
    fn test_offset_params() {
        let params = Params::from_offset(0x7FFF);
        assert_eq!((params.p1, params.p2), (0x7F, 0xFF));
        assert_eq!(params.value(), 0x7FFF);
    }
}
