//! File Control TLV
//!
//! `T(04|05) L(06) FileId(2) MaxFileSize(2) ReadAccess(1) WriteAccess(1)`

use super::tags;
use crate::field::{ByteField, CompositeField};

/// Length of the value part of a File Control TLV
pub const VALUE_LEN: u8 = 0x06;

/// Access condition byte granting access without security
pub const ACCESS_GRANTED: u8 = 0x00;
/// Access condition byte denying access
pub const ACCESS_DENIED: u8 = 0xFF;

/// Which File Control TLV tag describes a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Ndef,
    Proprietary,
}

impl FileKind {
    pub fn tag(self) -> u8 {
        match self {
            FileKind::Ndef => tags::NDEF_FILE_CONTROL,
            FileKind::Proprietary => tags::PROPRIETARY_FILE_CONTROL,
        }
    }
}

/// Descriptor for one elementary file, as listed in the CC
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileControlTlv {
    kind: FileKind,
    file_id: u16,
    max_file_size: u16,
    writable: bool,
}

impl FileControlTlv {
    pub fn new(kind: FileKind, file_id: u16, max_file_size: u16, writable: bool) -> Self {
        Self {
            kind,
            file_id,
            max_file_size,
            writable,
        }
    }

    /// NDEF File Control TLV (tag 0x04)
    pub fn ndef(file_id: u16, max_file_size: u16, writable: bool) -> Self {
        Self::new(FileKind::Ndef, file_id, max_file_size, writable)
    }

    /// Proprietary File Control TLV (tag 0x05)
    pub fn proprietary(file_id: u16, max_file_size: u16, writable: bool) -> Self {
        Self::new(FileKind::Proprietary, file_id, max_file_size, writable)
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn file_id(&self) -> u16 {
        self.file_id
    }

    pub fn max_file_size(&self) -> u16 {
        self.max_file_size
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Encoded length including tag and length bytes
    pub fn len(&self) -> usize {
        2 + VALUE_LEN as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn to_field(&self) -> CompositeField {
        let write_access = if self.writable {
            ACCESS_GRANTED
        } else {
            ACCESS_DENIED
        };

        let mut field = CompositeField::new("File Control TLV");
        field.push(ByteField::u8("T", self.kind.tag()));
        field.push(ByteField::u8("L", VALUE_LEN));
        field.push(ByteField::u16("File Identifier", self.file_id));
        field.push(ByteField::u16("Maximum File Size", self.max_file_size));
        field.push(ByteField::u8("Read Access", ACCESS_GRANTED));
        field.push(ByteField::u8("Write Access", write_access));
        field
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_field().bytes()
    }
}
