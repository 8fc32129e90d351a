//! NFC Forum Type 4 Tag application
//!
//! The tag answers SELECT, READ BINARY and UPDATE BINARY against a small file
//! system: the Capability Container (E103) plus one or more NDEF files.

mod applet;
mod files;
mod session;

pub use applet::HceStateMachine;
pub use files::{MAX_FILE_SIZE_LIMIT, MIN_FILE_SIZE, RESERVED_FILE_IDS};
pub use session::SessionState;

/// NDEF Tag Application AID (mapping version 2.0)
pub const NDEF_TAG_APPLICATION_AID: &[u8] = &[0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01];

/// Conventional identifier of the first NDEF file
pub const NDEF_FILE_ID: u16 = 0xE104;

/// Default maximum size of an NDEF file, NLEN included
pub const DEFAULT_MAX_FILE_SIZE: u16 = 2048;

/// Bytes taken by the NLEN prefix of an NDEF file
pub const NLEN_SIZE: usize = 2;
