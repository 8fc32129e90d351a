//! NFC Forum Type 4 Tag emulation for Host Card Emulation
//!
//! Turns a device into an NDEF tag: a reader selects the NDEF Tag
//! Application, reads the Capability Container and then reads or updates
//! NDEF files, all through ISO 7816-4 command APDUs.
//!
//! The platform glue passes every command APDU to
//! [`HceService::process_command_apdu`] and reports field loss through
//! [`HceService::on_deactivated`]. The host application installs an
//! [`HceStateMachine`] and may change its files at any time from another
//! thread.
//!
//! ```
//! use std::sync::Arc;
//! use hce_type4::{HceService, HceStateMachine, NdefMessage, rtd, NDEF_TAG_APPLICATION_AID};
//!
//! let message = NdefMessage::single(rtd::uri("https://example.com").unwrap());
//! let tag = HceStateMachine::with_ndef_message(NDEF_TAG_APPLICATION_AID, &message, false).unwrap();
//!
//! let service = HceService::new();
//! service.install(Arc::new(tag));
//! let response = service.process_command_apdu(&[0x00, 0xA4, 0x04, 0x00, 0x07,
//!     0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01]);
//! assert_eq!(response, [0x90, 0x00]);
//! ```

// Core modules
pub mod apdu;
pub mod card;
pub mod error;
pub mod field;
pub mod ndef;
pub mod service;
pub mod tlv;
pub mod type4;

pub use apdu::{ApduError, Command, Response, StatusWord};
pub use card::{ConfigError, HceConfig, RecordSpec};
pub use error::{ErrorKind, HceError};
pub use ndef::{rtd, NdefError, NdefMessage, NdefRecord, Tnf};
pub use service::HceService;
pub use tlv::{CapabilityContainer, FileControlTlv, CC_FILE_ID};
pub use type4::{
    HceStateMachine, SessionState, DEFAULT_MAX_FILE_SIZE, NDEF_FILE_ID, NDEF_TAG_APPLICATION_AID,
};
