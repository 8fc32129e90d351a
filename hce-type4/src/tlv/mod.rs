//! TLV (Tag-Length-Value) encoding for the Capability Container
//!
//! The CC file of a Type 4 Tag is host generated and only ever read by the
//! reader, so this module only has an encoding path.
//!
//! # Example
//! ```ignore
//! use hce_type4::tlv::{CapabilityContainer, FileControlTlv};
//!
//! let ndef = FileControlTlv::ndef(0xE104, 2048, false);
//! let cc = CapabilityContainer::new(vec![ndef]).unwrap();
//! assert_eq!(cc.cclen(), 15);
//! ```

mod capability;
mod file_control;

pub use capability::{CapabilityContainer, CC_FILE_ID, CC_HEADER_LEN, MAPPING_VERSION_2_0};
pub use file_control::{FileControlTlv, FileKind};

use thiserror::Error;

/// Errors raised while assembling the Capability Container
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TlvError {
    #[error("Capability Container needs at least one file control TLV")]
    NoDescriptors,

    #[error("Capability Container of {0} bytes does not fit CCLEN")]
    TooLarge(usize),

    #[error("{name} must be at least {min:#06X}, got {value:#06X}")]
    LimitTooSmall {
        name: &'static str,
        min: u16,
        value: u16,
    },
}

/// Type 4 Tag TLV tag values
pub mod tags {
    /// NDEF File Control TLV
    pub const NDEF_FILE_CONTROL: u8 = 0x04;
    /// Proprietary File Control TLV
    pub const PROPRIETARY_FILE_CONTROL: u8 = 0x05;
}
