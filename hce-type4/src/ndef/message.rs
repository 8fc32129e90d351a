//! NDEF message parsing and serialization
//!
//! Parsing walks the records one at a time through a small reassembly state
//! machine. A chunk run starts with a CF=1 record carrying the type and id,
//! continues with TNF=Unchanged records, and ends at the first CF=0 record.

use std::mem;

use super::record::{NdefFlags, NdefRecord, Tnf};
use super::NdefError;
use crate::field::CompositeField;

/// An ordered, non-empty list of complete NDEF records
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NdefMessage {
    records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> Result<Self, NdefError> {
        if records.is_empty() {
            return Err(NdefError::EmptyMessage);
        }
        Ok(Self { records })
    }

    /// Message holding exactly one record
    pub fn single(record: NdefRecord) -> Self {
        Self {
            records: vec![record],
        }
    }

    /// Parse a message, reassembling chunked records
    ///
    /// Parsing stops after the first complete record with ME set; any bytes
    /// after it are ignored.
    pub fn parse(raw: &[u8]) -> Result<Self, NdefError> {
        let mut reader = RecordReader::new(raw);
        let mut records = Vec::new();
        let mut state = ChunkState::NotInChunk;

        while !reader.is_empty() {
            let raw_record = reader.next_record()?;
            let flags = raw_record.flags;

            let complete = match mem::replace(&mut state, ChunkState::NotInChunk) {
                ChunkState::NotInChunk if flags.chunked() => {
                    state = ChunkState::AwaitingContinuation(ChunkRun::start(raw_record)?);
                    None
                }
                ChunkState::NotInChunk => Some(raw_record.into_record()?),
                ChunkState::AwaitingContinuation(mut run) => {
                    run.append(raw_record)?;
                    if flags.chunked() {
                        state = ChunkState::AwaitingContinuation(run);
                        None
                    } else {
                        Some(run.finish()?)
                    }
                }
            };

            if let Some(record) = complete {
                records.push(record);
                if flags.message_end() {
                    break;
                }
            }
        }

        if let ChunkState::AwaitingContinuation(_) = state {
            return Err(NdefError::UnterminatedChunk);
        }
        Self::new(records)
    }

    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NdefRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn to_field(&self) -> Result<CompositeField, NdefError> {
        let last = self.records.len() - 1;
        let mut field = CompositeField::new("NDEF Message");
        for (index, record) in self.records.iter().enumerate() {
            field.push(record.to_field(index == 0, index == last)?.into_field());
        }
        Ok(field)
    }

    /// Serialize all records; the first gets MB and the last gets ME
    pub fn to_bytes(&self) -> Result<Vec<u8>, NdefError> {
        Ok(self.to_field()?.bytes())
    }
}

impl From<NdefRecord> for NdefMessage {
    fn from(record: NdefRecord) -> Self {
        Self::single(record)
    }
}

enum ChunkState {
    NotInChunk,
    AwaitingContinuation(ChunkRun),
}

/// Record as it appears on the wire, before chunk reassembly
struct RawRecord {
    flags: NdefFlags,
    tnf: Tnf,
    record_type: Vec<u8>,
    id: Option<Vec<u8>>,
    payload: Vec<u8>,
}

impl RawRecord {
    fn into_record(self) -> Result<NdefRecord, NdefError> {
        NdefRecord::new(self.tnf, self.record_type, self.id, self.payload)
    }
}

/// Accumulated state of an open chunk run
struct ChunkRun {
    tnf: Tnf,
    record_type: Vec<u8>,
    id: Option<Vec<u8>>,
    payload: Vec<u8>,
}

impl ChunkRun {
    fn start(first: RawRecord) -> Result<Self, NdefError> {
        if matches!(first.tnf, Tnf::Empty | Tnf::Unchanged) {
            return Err(NdefError::InvalidChunk(
                "first chunk must carry a concrete TNF",
            ));
        }
        Ok(Self {
            tnf: first.tnf,
            record_type: first.record_type,
            id: first.id,
            payload: first.payload,
        })
    }

    fn append(&mut self, chunk: RawRecord) -> Result<(), NdefError> {
        if chunk.tnf != Tnf::Unchanged {
            return Err(NdefError::InvalidChunk(
                "continuation chunk must use TNF Unchanged",
            ));
        }
        if chunk.id.is_some() {
            return Err(NdefError::InvalidChunk(
                "continuation chunk must not carry an id",
            ));
        }
        if !chunk.record_type.is_empty() {
            return Err(NdefError::InvalidChunk(
                "continuation chunk must not carry a type",
            ));
        }
        self.payload.extend_from_slice(&chunk.payload);
        Ok(())
    }

    fn finish(self) -> Result<NdefRecord, NdefError> {
        NdefRecord::new(self.tnf, self.record_type, self.id, self.payload)
    }
}

struct RecordReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], NdefError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(NdefError::UnexpectedEnd(what))?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn byte(&mut self, what: &'static str) -> Result<u8, NdefError> {
        Ok(self.take(1, what)?[0])
    }

    fn next_record(&mut self) -> Result<RawRecord, NdefError> {
        let flags = NdefFlags::new(self.byte("flags")?);
        let tnf = flags.tnf()?;
        let type_length = self.byte("type length")? as usize;
        let payload_length = if flags.short_record() {
            self.byte("payload length")? as usize
        } else {
            let bytes = self.take(4, "payload length")?;
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
        };
        let id_length = if flags.has_id_length() {
            Some(self.byte("id length")? as usize)
        } else {
            None
        };

        let record_type = self.take(type_length, "type")?.to_vec();
        let id = match id_length {
            Some(len) => Some(self.take(len, "id")?.to_vec()),
            None => None,
        };
        let payload = self.take(payload_length, "payload")?.to_vec();

        Ok(RawRecord {
            flags,
            tnf,
            record_type,
            id,
            payload,
        })
    }
}
