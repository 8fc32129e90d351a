//! Type 4 Tag file system
//!
//! An ordered table of elementary files plus the Capability Container
//! derived from it. The CC is rebuilt on every table mutation and is absent
//! while the table is empty.

use log::{debug, info};

use super::{NDEF_FILE_ID, NLEN_SIZE};
use crate::apdu::StatusWord;
use crate::error::HceError;
use crate::ndef::{NdefError, NdefMessage};
use crate::tlv::{CapabilityContainer, FileControlTlv, FileKind, CC_FILE_ID};

/// File identifiers that can never hold an NDEF file
pub const RESERVED_FILE_IDS: [(u16, &str); 7] = [
    (0x0000, "reserved by ISO 7816-4"),
    (0x3F00, "reserved for the master file"),
    (0x3FFF, "reserved by ISO 7816-4"),
    (0xE101, "reserved by the Type 4 Tag mapping"),
    (0xE102, "reserved by the Type 4 Tag mapping"),
    (CC_FILE_ID, "reserved for the Capability Container"),
    (0xFFFF, "reserved for future use"),
];

/// Smallest usable maximum file size (NLEN plus a three byte record)
pub const MIN_FILE_SIZE: u16 = 5;

/// Largest maximum file size a File Control TLV may announce
pub const MAX_FILE_SIZE_LIMIT: u16 = 0xFFFE;

/// Why an UPDATE BINARY was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteError {
    CapabilityContainer,
    NotFound,
    ReadOnly,
    WrongOffset,
    WrongLength,
}

impl WriteError {
    pub fn status_word(self) -> StatusWord {
        match self {
            WriteError::CapabilityContainer | WriteError::ReadOnly => {
                StatusWord::CONDITIONS_NOT_SATISFIED
            }
            WriteError::NotFound => StatusWord::FILE_NOT_FOUND,
            WriteError::WrongOffset => StatusWord::WRONG_OFFSET,
            WriteError::WrongLength => StatusWord::WRONG_LENGTH,
        }
    }
}

struct ElementaryFile {
    descriptor: FileControlTlv,
    data: Vec<u8>,
}

/// File table of the tag
#[derive(Default)]
pub(crate) struct FileSystem {
    files: Vec<ElementaryFile>,
    capability_container: Option<CapabilityContainer>,
}

/// Check that `file_id` may be used for a data file
pub(crate) fn validate_file_id(file_id: u16) -> Result<(), HceError> {
    match RESERVED_FILE_IDS.iter().find(|(id, _)| *id == file_id) {
        Some((_, reason)) => Err(HceError::InvalidFileId {
            file_id,
            reason: *reason,
        }),
        None => Ok(()),
    }
}

/// Encode `NLEN || message`, checking it fits in `max_file_size`
pub(crate) fn encode_ndef_file(
    message: &NdefMessage,
    max_file_size: u16,
) -> Result<Vec<u8>, HceError> {
    if !(MIN_FILE_SIZE..=MAX_FILE_SIZE_LIMIT).contains(&max_file_size) {
        return Err(HceError::BufferOverflow(format!(
            "max file size {} outside {}..={}",
            max_file_size, MIN_FILE_SIZE, MAX_FILE_SIZE_LIMIT
        )));
    }

    let body = message.to_bytes()?;
    if NLEN_SIZE + body.len() > max_file_size as usize {
        return Err(HceError::BufferOverflow(format!(
            "NDEF message of {} bytes does not fit in a file of {} bytes",
            body.len(),
            max_file_size
        )));
    }

    let mut data = Vec::with_capacity(NLEN_SIZE + body.len());
    data.extend_from_slice(&(body.len() as u16).to_be_bytes());
    data.extend_from_slice(&body);
    Ok(data)
}

/// Decode `NLEN || message`; `None` when NLEN is zero
pub(crate) fn decode_ndef_file(data: &[u8]) -> Result<Option<NdefMessage>, HceError> {
    if data.len() < NLEN_SIZE {
        return Err(NdefError::UnexpectedEnd("NLEN").into());
    }
    let nlen = u16::from_be_bytes([data[0], data[1]]) as usize;
    if nlen == 0 {
        return Ok(None);
    }
    let body = data
        .get(NLEN_SIZE..NLEN_SIZE + nlen)
        .ok_or(NdefError::UnexpectedEnd("NDEF message"))?;
    Ok(Some(NdefMessage::parse(body)?))
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace a data file holding `message`
    ///
    /// A replaced file keeps its position in the table.
    pub fn add_or_replace(
        &mut self,
        file_id: u16,
        message: &NdefMessage,
        max_file_size: u16,
        writable: bool,
    ) -> Result<(), HceError> {
        validate_file_id(file_id)?;
        let data = encode_ndef_file(message, max_file_size)?;

        let kind = if file_id == NDEF_FILE_ID {
            FileKind::Ndef
        } else {
            FileKind::Proprietary
        };
        let descriptor = FileControlTlv::new(kind, file_id, max_file_size, writable);

        let position = self.position(file_id);
        let mut descriptors = self.descriptors();
        match position {
            Some(index) => descriptors[index] = descriptor.clone(),
            None => descriptors.push(descriptor.clone()),
        }
        let capability_container = CapabilityContainer::new(descriptors)?;

        let file = ElementaryFile { descriptor, data };
        match position {
            Some(index) => {
                self.files[index] = file;
                info!("Replaced file {:04X} ({} bytes)", file_id, self.files[index].data.len());
            }
            None => {
                self.files.push(file);
                info!("Added file {:04X}", file_id);
            }
        }
        self.capability_container = Some(capability_container);
        Ok(())
    }

    pub fn delete(&mut self, file_id: u16) -> Result<(), HceError> {
        validate_file_id(file_id)?;
        let index = self
            .position(file_id)
            .ok_or(HceError::FileNotFound(file_id))?;
        self.files.remove(index);
        self.rebuild_capability_container()?;
        info!("Deleted file {:04X}", file_id);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.capability_container = None;
        info!("Cleared all files");
    }

    /// Whether a data file with this id exists
    pub fn contains(&self, file_id: u16) -> bool {
        self.position(file_id).is_some()
    }

    /// Whether a SELECT of this id succeeds (data file or existing CC)
    pub fn is_selectable(&self, file_id: u16) -> bool {
        if file_id == CC_FILE_ID {
            return self.capability_container.is_some();
        }
        self.contains(file_id)
    }

    pub fn file_ids(&self) -> Vec<u16> {
        self.files.iter().map(|f| f.descriptor.file_id()).collect()
    }

    pub fn capability_container(&self) -> Option<&CapabilityContainer> {
        self.capability_container.as_ref()
    }

    /// Current content of a file, CC included
    pub fn read(&self, file_id: u16) -> Option<Vec<u8>> {
        if file_id == CC_FILE_ID {
            return self.capability_container.as_ref().map(CapabilityContainer::to_bytes);
        }
        self.position(file_id).map(|index| self.files[index].data.clone())
    }

    /// Write `data` at `offset`, growing the file with zeros as needed
    pub fn write(&mut self, file_id: u16, offset: u16, data: &[u8]) -> Result<(), WriteError> {
        if file_id == CC_FILE_ID {
            return Err(WriteError::CapabilityContainer);
        }
        let index = self.position(file_id).ok_or(WriteError::NotFound)?;
        let file = &mut self.files[index];
        if !file.descriptor.is_writable() {
            return Err(WriteError::ReadOnly);
        }

        let offset = offset as usize;
        let max_file_size = file.descriptor.max_file_size() as usize;
        if offset > max_file_size {
            return Err(WriteError::WrongOffset);
        }
        let end = offset + data.len();
        if end > max_file_size {
            return Err(WriteError::WrongLength);
        }

        if file.data.len() < end {
            file.data.resize(end, 0x00);
        }
        file.data[offset..end].copy_from_slice(data);
        debug!("Wrote {} bytes at offset {} of file {:04X}", data.len(), offset, file_id);
        Ok(())
    }

    fn position(&self, file_id: u16) -> Option<usize> {
        self.files
            .iter()
            .position(|f| f.descriptor.file_id() == file_id)
    }

    fn descriptors(&self) -> Vec<FileControlTlv> {
        self.files.iter().map(|f| f.descriptor.clone()).collect()
    }

    fn rebuild_capability_container(&mut self) -> Result<(), HceError> {
        self.capability_container = if self.files.is_empty() {
            None
        } else {
            Some(CapabilityContainer::new(self.descriptors())?)
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ndef::rtd;

    fn hello() -> NdefMessage {
        NdefMessage::single(rtd::text("en", "Hi").unwrap())
    }

    #[test]
    fn test_add_builds_cc() {
        let mut fs = FileSystem::new();
        assert!(fs.capability_container().is_none());
        assert!(!fs.is_selectable(CC_FILE_ID));

        fs.add_or_replace(0xE104, &hello(), 2048, false).unwrap();
        assert!(fs.is_selectable(CC_FILE_ID));
        assert_eq!(
            fs.read(CC_FILE_ID).unwrap(),
            hex::decode("000F2000FF00FF0406E104080000FF").unwrap()
        );
        assert_eq!(
            fs.read(0xE104).unwrap(),
            hex::decode("0009D101055402656E4869").unwrap()
        );
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut fs = FileSystem::new();
        fs.add_or_replace(0xE104, &hello(), 2048, false).unwrap();
        fs.add_or_replace(0xE105, &hello(), 512, true).unwrap();
        fs.add_or_replace(0xE104, &hello(), 1024, true).unwrap();
        assert_eq!(fs.file_ids(), vec![0xE104, 0xE105]);

        let descriptors = fs.capability_container().unwrap().descriptors();
        assert_eq!(descriptors[0].max_file_size(), 1024);
        assert_eq!(descriptors[0].kind(), FileKind::Ndef);
        assert_eq!(descriptors[1].kind(), FileKind::Proprietary);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut fs = FileSystem::new();
        fs.add_or_replace(0xE104, &hello(), 2048, false).unwrap();
        fs.add_or_replace(0xE105, &hello(), 2048, false).unwrap();

        fs.delete(0xE104).unwrap();
        assert_eq!(fs.file_ids(), vec![0xE105]);
        assert_eq!(fs.capability_container().unwrap().cclen(), 15);
        assert_eq!(fs.delete(0xE104).unwrap_err().kind(), ErrorKind::FileNotFound);

        fs.delete(0xE105).unwrap();
        assert!(fs.capability_container().is_none());

        fs.add_or_replace(0xE104, &hello(), 2048, false).unwrap();
        fs.clear();
        assert!(fs.file_ids().is_empty());
        assert!(fs.read(CC_FILE_ID).is_none());
    }

    #[test]
    fn test_reserved_ids() {
        let mut fs = FileSystem::new();
        for (file_id, _) in RESERVED_FILE_IDS {
            let err = fs.add_or_replace(file_id, &hello(), 2048, false).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFileId);
        }
        assert!(fs.file_ids().is_empty());

        for file_id in [0xE101, 0xE102] {
            assert!(matches!(
                fs.add_or_replace(file_id, &hello(), 64, false),
                Err(HceError::InvalidFileId { .. })
            ));
            assert!(!fs.is_selectable(file_id));
        }
        assert!(fs.capability_container().is_none());
    }

    #[test]
    fn test_delete_reserved_id() {
        let mut fs = FileSystem::new();
        fs.add_or_replace(0xE104, &hello(), 2048, false).unwrap();

        let err = fs.delete(0x3F00).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFileId);
        let err = fs.delete(CC_FILE_ID).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFileId);

        let err = fs.delete(0xE105).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(fs.file_ids(), vec![0xE104]);
    }

    #[test]
    fn test_size_bounds() {
        let mut fs = FileSystem::new();
        let err = fs.add_or_replace(0xE104, &hello(), 4, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferOverflow);
        let err = fs.add_or_replace(0xE104, &hello(), 0xFFFF, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferOverflow);

        // 9 byte message + NLEN needs 11 bytes
        let err = fs.add_or_replace(0xE104, &hello(), 10, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferOverflow);
        fs.add_or_replace(0xE104, &hello(), 11, false).unwrap();
    }

    #[test]
    fn test_write_rules() {
        let mut fs = FileSystem::new();
        fs.add_or_replace(0xE104, &hello(), 16, true).unwrap();
        fs.add_or_replace(0xE105, &hello(), 16, false).unwrap();

        assert_eq!(fs.write(CC_FILE_ID, 0, &[0x00]), Err(WriteError::CapabilityContainer));
        assert_eq!(fs.write(0xE106, 0, &[0x00]), Err(WriteError::NotFound));
        assert_eq!(fs.write(0xE105, 0, &[0x00]), Err(WriteError::ReadOnly));
        assert_eq!(fs.write(0xE104, 17, &[]), Err(WriteError::WrongOffset));
        assert_eq!(fs.write(0xE104, 15, &[0x01, 0x02]), Err(WriteError::WrongLength));

        // grows with zero padding up to max size
        fs.write(0xE104, 14, &[0xAA, 0xBB]).unwrap();
        let data = fs.read(0xE104).unwrap();
        assert_eq!(data.len(), 16);
        assert_eq!(&data[11..], &[0x00, 0x00, 0x00, 0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_ndef_file() {
        let data = encode_ndef_file(&hello(), 2048).unwrap();
        assert_eq!(decode_ndef_file(&data).unwrap(), Some(hello()));
        assert_eq!(decode_ndef_file(&[0x00, 0x00, 0xD1]).unwrap(), None);
        assert!(decode_ndef_file(&[0x00]).is_err());
        assert!(decode_ndef_file(&[0x00, 0x10, 0xD1]).is_err());
    }
}
