//! Byte fields and composite serializers
//!
//! Every wire structure in this crate (command and response APDUs, NDEF
//! records, the Capability Container) is assembled from named byte fields.
//! A [`CompositeField`] holds an ordered list of optional children and
//! serializes to the concatenation of the ones that are present.
//!
//! # Example
//! ```ignore
//! use hce_type4::field::{ByteField, CompositeField};
//!
//! let mut header = CompositeField::new("Header");
//! header.push(ByteField::u8("CLA", 0x00));
//! header.push_optional(None);
//! header.push(ByteField::u16("P1-P2", 0xE104));
//! assert_eq!(header.bytes(), vec![0x00, 0xE1, 0x04]);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Errors raised by fixed-size field construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{name}: value {value} does not fit in {width} byte(s)")]
    ValueOutOfRange {
        name: Cow<'static, str>,
        value: u64,
        width: usize,
    },
}

/// Format bytes as space separated upper-case hex, e.g. `"90 00"`
pub fn hexify(value: &[u8]) -> String {
    value.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

/// A named, fixed-content byte container
///
/// The name is diagnostic only. Equality and hashing look at the bytes.
#[derive(Clone)]
pub struct ByteField {
    name: Cow<'static, str>,
    data: Vec<u8>,
}

impl ByteField {
    /// Create a field that owns `data`
    pub fn new(name: impl Into<Cow<'static, str>>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Create a field from a borrowed slice (the bytes are copied)
    pub fn from_slice(name: impl Into<Cow<'static, str>>, data: &[u8]) -> Self {
        Self::new(name, data.to_vec())
    }

    /// Single byte field
    pub fn u8(name: impl Into<Cow<'static, str>>, value: u8) -> Self {
        Self::new(name, vec![value])
    }

    /// Two byte big-endian field
    pub fn u16(name: impl Into<Cow<'static, str>>, value: u16) -> Self {
        Self::new(name, value.to_be_bytes().to_vec())
    }

    /// Big-endian integer field of `width` bytes (1..=8)
    ///
    /// Fails if `value` does not fit in `width` bytes.
    pub fn be(
        name: impl Into<Cow<'static, str>>,
        value: u64,
        width: usize,
    ) -> Result<Self, FieldError> {
        let name = name.into();
        let fits = match width {
            0 => false,
            1..=7 => value >> (8 * width) == 0,
            _ => width == 8,
        };
        if !fits {
            return Err(FieldError::ValueOutOfRange { name, value, width });
        }
        let bytes = value.to_be_bytes();
        Ok(Self {
            name,
            data: bytes[8 - width..].to_vec(),
        })
    }

    /// Diagnostic name of this field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owned copy of the field content
    pub fn bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Borrow the field content
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Replace the field content
    pub fn set_bytes(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl PartialEq for ByteField {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for ByteField {}

impl Hash for ByteField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Display for ByteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hexify(&self.data))
    }
}

impl fmt::Debug for ByteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.name, hexify(&self.data))
    }
}

/// An ordered list of optional byte fields
///
/// `bytes()` is recomputed from the current children on every call, so a
/// mutated child is reflected immediately. Absent children reserve no space.
#[derive(Clone)]
pub struct CompositeField {
    name: Cow<'static, str>,
    children: Vec<Option<ByteField>>,
}

impl CompositeField {
    /// Create an empty composite
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Create a composite from a prepared list of children
    pub fn with_children(
        name: impl Into<Cow<'static, str>>,
        children: Vec<Option<ByteField>>,
    ) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a present child
    pub fn push(&mut self, field: ByteField) -> &mut Self {
        self.children.push(Some(field));
        self
    }

    /// Append a child slot that may be absent
    pub fn push_optional(&mut self, field: Option<ByteField>) -> &mut Self {
        self.children.push(field);
        self
    }

    /// Replace the child slot at `index`
    ///
    /// Returns the previous occupant, or `None` if the slot was empty or
    /// `index` is out of bounds.
    pub fn set(&mut self, index: usize, field: Option<ByteField>) -> Option<ByteField> {
        let slot = self.children.get_mut(index)?;
        std::mem::replace(slot, field)
    }

    /// Mutable access to a present child
    pub fn child_mut(&mut self, index: usize) -> Option<&mut ByteField> {
        self.children.get_mut(index).and_then(Option::as_mut)
    }

    /// Iterate over the present children in order
    pub fn children(&self) -> impl Iterator<Item = &ByteField> {
        self.children.iter().flatten()
    }

    /// Concatenation of all present children
    pub fn bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.len());
        for child in self.children() {
            result.extend_from_slice(child.as_slice());
        }
        result
    }

    pub fn len(&self) -> usize {
        self.children().map(ByteField::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a single named field (for nesting composites)
    pub fn into_field(self) -> ByteField {
        let data = self.bytes();
        ByteField::new(self.name, data)
    }
}

impl PartialEq for CompositeField {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for CompositeField {}

impl Hash for CompositeField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes().hash(state);
    }
}

impl fmt::Display for CompositeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for child in self.children() {
            write!(f, " | {}: {}", child.name(), child)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CompositeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_name() {
        let a = ByteField::from_slice("Le", &[0x0F]);
        let b = ByteField::from_slice("Lc", &[0x0F]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_be_guard() {
        assert_eq!(ByteField::be("Lc", 255, 1).unwrap().bytes(), vec![0xFF]);
        assert!(matches!(
            ByteField::be("Lc", 256, 1),
            Err(FieldError::ValueOutOfRange { width: 1, value: 256, .. })
        ));
        assert_eq!(
            ByteField::be("Payload Length", 0x0102_0304, 4).unwrap().bytes(),
            vec![0x01, 0x02, 0x03, 0x04]
        );
        assert!(ByteField::be("Empty", 0, 0).is_err());
    }

    #[test]
    fn test_composite_skips_absent_children() {
        let composite = CompositeField::with_children(
            "APDU",
            vec![
                Some(ByteField::u8("CLA", 0x00)),
                None,
                Some(ByteField::u16("P1-P2", 0x040C)),
                None,
            ],
        );
        assert_eq!(composite.bytes(), vec![0x00, 0x04, 0x0C]);
        assert_eq!(composite.len(), 3);
    }

    #[test]
    fn test_composite_reflects_child_mutation() {
        let mut composite = CompositeField::new("CC");
        composite.push(ByteField::u16("CCLEN", 0x000F));
        composite.push(ByteField::u8("Version", 0x20));
        assert_eq!(composite.bytes(), vec![0x00, 0x0F, 0x20]);

        composite.child_mut(0).unwrap().set_bytes(vec![0x00, 0x17]);
        assert_eq!(composite.bytes(), vec![0x00, 0x17, 0x20]);

        composite.set(1, None);
        assert_eq!(composite.bytes(), vec![0x00, 0x17]);
    }

    #[test]
    fn test_into_field_and_display() {
        let mut composite = CompositeField::new("SW");
        composite.push(ByteField::u8("SW1", 0x90));
        composite.push(ByteField::u8("SW2", 0x00));
        assert_eq!(composite.to_string(), " | SW1: 90 | SW2: 00");

        let field = composite.into_field();
        assert_eq!(field.name(), "SW");
        assert_eq!(field.to_string(), "90 00");
    }

    #[test]
    fn test_hexify() {
        assert_eq!(hexify(&[0xD2, 0x76, 0x00]), "D2 76 00");
        assert_eq!(hexify(&[]), "");
    }
}
