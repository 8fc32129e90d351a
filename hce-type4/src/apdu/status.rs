//! Status Word (SW) constants for APDU responses
//!
//! ISO 7816-4 status words used by the Type 4 Tag command set.

use std::fmt;

use crate::field::ByteField;

/// A two byte status word (SW1 || SW2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(u16);

impl StatusWord {
    // Success
    pub const OK: StatusWord = StatusWord(0x9000);

    // Checking errors
    pub const WRONG_LENGTH: StatusWord = StatusWord(0x6700);
    pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord(0x6985);
    pub const FILE_NOT_FOUND: StatusWord = StatusWord(0x6A82);
    pub const WRONG_P1_P2: StatusWord = StatusWord(0x6A86);
    pub const WRONG_OFFSET: StatusWord = StatusWord(0x6B00);
    pub const INS_NOT_SUPPORTED: StatusWord = StatusWord(0x6D00);
    pub const CLA_NOT_SUPPORTED: StatusWord = StatusWord(0x6E00);
    pub const UNKNOWN_ERROR: StatusWord = StatusWord(0x6F00);

    const CATALOG: [(StatusWord, &'static str); 9] = [
        (Self::OK, "OK"),
        (Self::WRONG_LENGTH, "Wrong length"),
        (Self::CONDITIONS_NOT_SATISFIED, "Conditions not satisfied"),
        (Self::FILE_NOT_FOUND, "File not found"),
        (Self::WRONG_P1_P2, "Wrong P1-P2"),
        (Self::WRONG_OFFSET, "Wrong offset"),
        (Self::INS_NOT_SUPPORTED, "INS not supported"),
        (Self::CLA_NOT_SUPPORTED, "CLA not supported"),
        (Self::UNKNOWN_ERROR, "Unknown error"),
    ];

    /// Wrap an arbitrary status word value
    pub const fn new(sw: u16) -> Self {
        StatusWord(sw)
    }

    /// Status word from its two wire bytes
    ///
    /// Yields the catalogued constant when the value is a known one,
    /// otherwise a fresh uncatalogued status word.
    pub fn from_bytes(sw1: u8, sw2: u8) -> Self {
        let value = u16::from_be_bytes([sw1, sw2]);
        Self::CATALOG
            .iter()
            .map(|(sw, _)| *sw)
            .find(|sw| sw.0 == value)
            .unwrap_or(StatusWord(value))
    }

    #[inline]
    pub fn value(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn sw1(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn sw2(self) -> u8 {
        self.0 as u8
    }

    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Check if this status word indicates success (9000)
    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::OK
    }

    /// Human readable name for catalogued status words
    pub fn description(self) -> Option<&'static str> {
        Self::CATALOG
            .iter()
            .find(|(sw, _)| *sw == self)
            .map(|(_, name)| *name)
    }

    pub(crate) fn to_field(self) -> ByteField {
        ByteField::u16("SW", self.0)
    }
}

impl From<u16> for StatusWord {
    fn from(sw: u16) -> Self {
        let [sw1, sw2] = sw.to_be_bytes();
        Self::from_bytes(sw1, sw2)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(name) => write!(f, "{:04X} ({})", self.0, name),
            None => write!(f, "{:04X}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_catalogued() {
        assert_eq!(StatusWord::from_bytes(0x90, 0x00), StatusWord::OK);
        assert_eq!(StatusWord::from_bytes(0x6A, 0x82), StatusWord::FILE_NOT_FOUND);
        assert_eq!(StatusWord::from_bytes(0x6B, 0x00), StatusWord::WRONG_OFFSET);
        assert_eq!(StatusWord::from(0x6E00), StatusWord::CLA_NOT_SUPPORTED);
    }

    #[test]
    fn test_from_bytes_uncatalogued() {
        let sw = StatusWord::from_bytes(0x63, 0xC2);
        assert_eq!(sw.value(), 0x63C2);
        assert_eq!(sw.description(), None);
        assert_eq!(sw.to_string(), "63C2");
    }

    #[test]
    fn test_bytes() {
        let sw = StatusWord::CONDITIONS_NOT_SATISFIED;
        assert_eq!(sw.sw1(), 0x69);
        assert_eq!(sw.sw2(), 0x85);
        assert_eq!(sw.to_bytes(), [0x69, 0x85]);
        assert_eq!(sw.to_field().bytes(), vec![0x69, 0x85]);
    }

    #[test]
    fn test_is_success() {
        assert!(StatusWord::OK.is_success());
        assert!(!StatusWord::WRONG_LENGTH.is_success());
        assert!(!StatusWord::new(0x6100).is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusWord::OK.to_string(), "9000 (OK)");
        assert_eq!(StatusWord::WRONG_P1_P2.to_string(), "6A86 (Wrong P1-P2)");
    }
}
