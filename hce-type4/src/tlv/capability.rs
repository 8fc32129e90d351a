//! Capability Container file (E103)
//!
//! `CCLEN(2) MappingVersion(1) MLe(2) MLc(2) FileControlTLV*`

use super::{FileControlTlv, TlvError};
use crate::field::{ByteField, CompositeField};

/// File identifier of the Capability Container
pub const CC_FILE_ID: u16 = 0xE103;

/// Mapping version 2.0
pub const MAPPING_VERSION_2_0: u8 = 0x20;

/// CCLEN + version + MLe + MLc
pub const CC_HEADER_LEN: usize = 7;

/// Default maximum R-APDU data size
pub const DEFAULT_MLE: u16 = 0x00FF;
/// Default maximum C-APDU data size
pub const DEFAULT_MLC: u16 = 0x00FF;

// Smallest values a Type 4 Tag may announce
const MIN_MLE: u16 = 0x000F;
const MIN_MLC: u16 = 0x0001;

/// The Capability Container, derived from the file table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityContainer {
    mle: u16,
    mlc: u16,
    descriptors: Vec<FileControlTlv>,
}

impl CapabilityContainer {
    /// CC with the default MLe/MLc of 0x00FF
    pub fn new(descriptors: Vec<FileControlTlv>) -> Result<Self, TlvError> {
        Self::with_limits(descriptors, DEFAULT_MLE, DEFAULT_MLC)
    }

    pub fn with_limits(
        descriptors: Vec<FileControlTlv>,
        mle: u16,
        mlc: u16,
    ) -> Result<Self, TlvError> {
        if descriptors.is_empty() {
            return Err(TlvError::NoDescriptors);
        }
        if mle < MIN_MLE {
            return Err(TlvError::LimitTooSmall {
                name: "MLe",
                min: MIN_MLE,
                value: mle,
            });
        }
        if mlc < MIN_MLC {
            return Err(TlvError::LimitTooSmall {
                name: "MLc",
                min: MIN_MLC,
                value: mlc,
            });
        }
        let total = CC_HEADER_LEN + descriptors.iter().map(FileControlTlv::len).sum::<usize>();
        if total > u16::MAX as usize {
            return Err(TlvError::TooLarge(total));
        }

        Ok(Self {
            mle,
            mlc,
            descriptors,
        })
    }

    pub fn descriptors(&self) -> &[FileControlTlv] {
        &self.descriptors
    }

    pub fn mle(&self) -> u16 {
        self.mle
    }

    pub fn mlc(&self) -> u16 {
        self.mlc
    }

    /// CCLEN as computed from the current descriptors
    pub fn cclen(&self) -> u16 {
        let total = CC_HEADER_LEN + self.descriptors.iter().map(FileControlTlv::len).sum::<usize>();
        // bounded at construction
        total as u16
    }

    fn to_field(&self) -> CompositeField {
        let mut field = CompositeField::new("Capability Container");
        field.push(ByteField::u16("CCLEN", self.cclen()));
        field.push(ByteField::u8("Mapping Version", MAPPING_VERSION_2_0));
        field.push(ByteField::u16("MLe", self.mle));
        field.push(ByteField::u16("MLc", self.mlc));
        for descriptor in &self.descriptors {
            field.push(descriptor.to_field().into_field());
        }
        field
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_field().bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ndef_file_cc() {
        let cc = CapabilityContainer::new(vec![FileControlTlv::ndef(0xE104, 2048, false)]).unwrap();
        assert_eq!(
            cc.to_bytes(),
            hex::decode("000F2000FF00FF0406E104080000FF").unwrap()
        );
        assert_eq!(cc.cclen(), 15);
    }

    #[test]
    fn test_cclen_counts_every_descriptor() {
        let cc = CapabilityContainer::new(vec![
            FileControlTlv::ndef(0xE104, 2048, true),
            FileControlTlv::proprietary(0xE105, 512, false),
        ])
        .unwrap();
        let bytes = cc.to_bytes();
        assert_eq!(cc.cclen(), 23);
        assert_eq!(bytes.len(), 23);
        assert_eq!(&bytes[0..2], &[0x00, 0x17]);
        assert_eq!(&bytes[15..17], &[0x05, 0x06]);
    }

    #[test]
    fn test_rejects_empty_descriptor_list() {
        assert_eq!(CapabilityContainer::new(Vec::new()), Err(TlvError::NoDescriptors));
    }

    #[test]
    fn test_rejects_small_limits() {
        let descriptors = vec![FileControlTlv::ndef(0xE104, 2048, false)];
        assert!(matches!(
            CapabilityContainer::with_limits(descriptors, 0x0001, 0x00FF),
            Err(TlvError::LimitTooSmall { name: "MLe", .. })
        ));
    }
}
