//! NDEF record and header flags

use serde::{Deserialize, Serialize};

use super::NdefError;
use crate::field::{ByteField, CompositeField};

/// Header flag bits
pub mod flags {
    /// Message Begin
    pub const MB: u8 = 0x80;
    /// Message End
    pub const ME: u8 = 0x40;
    /// Chunk Flag
    pub const CF: u8 = 0x20;
    /// Short Record
    pub const SR: u8 = 0x10;
    /// ID Length present
    pub const IL: u8 = 0x08;
    /// Type Name Format mask
    pub const TNF_MASK: u8 = 0x07;
}

/// Type Name Format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tnf {
    Empty = 0x00,
    WellKnown = 0x01,
    MediaType = 0x02,
    AbsoluteUri = 0x03,
    ExternalType = 0x04,
    Unknown = 0x05,
    Unchanged = 0x06,
}

impl Tnf {
    /// Decode the low 3 bits of a header byte
    pub fn from_bits(value: u8) -> Result<Self, NdefError> {
        match value & flags::TNF_MASK {
            0x00 => Ok(Tnf::Empty),
            0x01 => Ok(Tnf::WellKnown),
            0x02 => Ok(Tnf::MediaType),
            0x03 => Ok(Tnf::AbsoluteUri),
            0x04 => Ok(Tnf::ExternalType),
            0x05 => Ok(Tnf::Unknown),
            0x06 => Ok(Tnf::Unchanged),
            other => Err(NdefError::ReservedTnf(other)),
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Record header byte: MB ME CF SR IL TNF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NdefFlags(u8);

impl NdefFlags {
    pub fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn message_begin(self) -> bool {
        self.0 & flags::MB != 0
    }

    pub fn message_end(self) -> bool {
        self.0 & flags::ME != 0
    }

    pub fn chunked(self) -> bool {
        self.0 & flags::CF != 0
    }

    pub fn short_record(self) -> bool {
        self.0 & flags::SR != 0
    }

    pub fn has_id_length(self) -> bool {
        self.0 & flags::IL != 0
    }

    pub fn tnf(self) -> Result<Tnf, NdefError> {
        Tnf::from_bits(self.0)
    }
}

/// A complete (unchunked) NDEF record
///
/// Construction validates the TNF rules, so every value of this type can
/// be serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NdefRecord {
    tnf: Tnf,
    record_type: Vec<u8>,
    id: Option<Vec<u8>>,
    payload: Vec<u8>,
}

impl NdefRecord {
    pub fn new(
        tnf: Tnf,
        record_type: Vec<u8>,
        id: Option<Vec<u8>>,
        payload: Vec<u8>,
    ) -> Result<Self, NdefError> {
        match tnf {
            Tnf::Empty => {
                if !record_type.is_empty() || !payload.is_empty() || id.is_some() {
                    return Err(NdefError::InvalidRecord(
                        "empty record must not carry type, id or payload",
                    ));
                }
            }
            Tnf::Unchanged => {
                return Err(NdefError::InvalidRecord(
                    "TNF Unchanged is only valid inside a chunk sequence",
                ));
            }
            Tnf::Unknown => {
                if !record_type.is_empty() {
                    return Err(NdefError::InvalidRecord(
                        "record of unknown type must not carry a type",
                    ));
                }
            }
            Tnf::WellKnown | Tnf::MediaType | Tnf::AbsoluteUri | Tnf::ExternalType => {}
        }

        Ok(Self {
            tnf,
            record_type,
            id,
            payload,
        })
    }

    /// The record with TNF Empty and nothing else
    pub fn empty() -> Self {
        Self {
            tnf: Tnf::Empty,
            record_type: Vec::new(),
            id: None,
            payload: Vec::new(),
        }
    }

    /// NFC Forum well-known record, e.g. type `"T"` or `"U"`
    pub fn well_known(record_type: &str, payload: Vec<u8>) -> Result<Self, NdefError> {
        Self::new(Tnf::WellKnown, record_type.as_bytes().to_vec(), None, payload)
    }

    /// MIME media record, e.g. `"application/json"`
    pub fn media(mime_type: &str, payload: Vec<u8>) -> Result<Self, NdefError> {
        Self::new(Tnf::MediaType, mime_type.as_bytes().to_vec(), None, payload)
    }

    /// NFC Forum external type record, e.g. `"example.com:pkg"`
    pub fn external(external_type: &str, payload: Vec<u8>) -> Result<Self, NdefError> {
        Self::new(
            Tnf::ExternalType,
            external_type.as_bytes().to_vec(),
            None,
            payload,
        )
    }

    /// Same record with an id attached
    pub fn with_id(self, id: Vec<u8>) -> Result<Self, NdefError> {
        Self::new(self.tnf, self.record_type, Some(id), self.payload)
    }

    pub fn tnf(&self) -> Tnf {
        self.tnf
    }

    pub fn record_type(&self) -> &[u8] {
        &self.record_type
    }

    pub fn id(&self) -> Option<&[u8]> {
        self.id.as_deref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Short record form is used for payloads under 256 bytes
    pub fn is_short(&self) -> bool {
        self.payload.len() < 256
    }

    /// Header byte for this record at the given position in a message
    pub fn flags(&self, first: bool, last: bool) -> NdefFlags {
        let mut raw = self.tnf.value();
        if first {
            raw |= flags::MB;
        }
        if last {
            raw |= flags::ME;
        }
        if self.is_short() {
            raw |= flags::SR;
        }
        if self.id.is_some() {
            raw |= flags::IL;
        }
        NdefFlags(raw)
    }

    pub(crate) fn to_field(&self, first: bool, last: bool) -> Result<CompositeField, NdefError> {
        let payload_length = if self.is_short() {
            ByteField::be("Payload Length", self.payload.len() as u64, 1)?
        } else {
            ByteField::be("Payload Length", self.payload.len() as u64, 4)?
        };

        let mut field = CompositeField::new("NDEF Record");
        field.push(ByteField::u8("Flags", self.flags(first, last).raw()));
        field.push(ByteField::be("Type Length", self.record_type.len() as u64, 1)?);
        field.push(payload_length);
        field.push_optional(match &self.id {
            Some(id) => Some(ByteField::be("ID Length", id.len() as u64, 1)?),
            None => None,
        });
        field.push(ByteField::from_slice("Type", &self.record_type));
        field.push_optional(self.id.as_ref().map(|id| ByteField::from_slice("ID", id)));
        field.push(ByteField::from_slice("Payload", &self.payload));
        Ok(field)
    }

    /// Serialize as a standalone record (MB and ME both set)
    pub fn to_bytes(&self) -> Result<Vec<u8>, NdefError> {
        Ok(self.to_field(true, true)?.bytes())
    }
}
