//! Attribute store.
//!
//! An [`Attribute`] is a `(type, length, value-bytes)` tuple; a per-object
//! [`AttributeStore`] is an ordered list owned by the object: small typed
//! records with linear lookup rather than a hash map, since objects carry
//! at most a few dozen attributes.

use crate::constants::CK_UNAVAILABLE_INFORMATION;
use crate::error::BridgeError;

pub type AttributeType = u64;

/// The value half of an attribute. Numeric attributes are stored as their
/// little-endian byte representation so that length and byte-equality
/// checks (used by the search engine) are uniform across attribute kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: AttributeType,
    pub value: Vec<u8>,
}

impl Attribute {
    #[must_use]
    pub fn new(kind: AttributeType, value: Vec<u8>) -> Self {
        Self { kind, value }
    }

    #[must_use]
    pub fn bool_attr(kind: AttributeType, value: bool) -> Self {
        Self::new(kind, vec![u8::from(value)])
    }

    #[must_use]
    pub fn u64_attr(kind: AttributeType, value: u64) -> Self {
        Self::new(kind, value.to_le_bytes().to_vec())
    }

    #[must_use]
    pub fn bytes_attr(kind: AttributeType, value: impl Into<Vec<u8>>) -> Self {
        Self::new(kind, value.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A single requested/matched attribute in a `C_GetAttributeValue` template
/// or a `C_FindObjectsInit` search template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAttribute {
    pub kind: AttributeType,
    /// `None` represents a null value pointer, meaning "type present,
    /// value not checked" for a search template; `Some` carries the
    /// requested/comparison bytes.
    pub value: Option<Vec<u8>>,
}

/// Outcome of a single attribute lookup within `C_GetAttributeValue`.
/// `length` is `CK_UNAVAILABLE_INFORMATION` when the attribute type is
/// absent on the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLookup {
    pub kind: AttributeType,
    pub length: u64,
    pub value: Option<Vec<u8>>,
}

/// Ordered, owned list of attributes for one object.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    entries: Vec<Attribute>,
}

impl AttributeStore {
    #[must_use]
    pub fn new(entries: Vec<Attribute>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, kind: AttributeType) -> Option<&Attribute> {
        self.entries.iter().find(|a| a.kind == kind)
    }

    pub fn push(&mut self, attr: Attribute) {
        self.entries.push(attr);
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// `C_GetAttributeValue` per-attribute resolution.
    ///
    /// `want_value` is `false` when the caller passed a null value buffer
    /// for this attribute (length-only probe); the overall call result is
    /// the accumulation of every per-attribute outcome via
    /// [`GetAttributeOutcome::merge`].
    #[must_use]
    pub fn lookup(
        &self,
        kind: AttributeType,
        buffer_capacity: Option<usize>,
    ) -> (AttributeLookup, GetAttributeOutcome) {
        match self.get(kind) {
            None => (
                AttributeLookup {
                    kind,
                    length: CK_UNAVAILABLE_INFORMATION,
                    value: None,
                },
                GetAttributeOutcome::AttributeTypeInvalid,
            ),
            Some(attr) => {
                let length = attr.len() as u64;
                match buffer_capacity {
                    None => (
                        AttributeLookup {
                            kind,
                            length,
                            value: None,
                        },
                        GetAttributeOutcome::Ok,
                    ),
                    Some(cap) if cap < attr.len() => (
                        AttributeLookup {
                            kind,
                            length,
                            value: None,
                        },
                        GetAttributeOutcome::BufferTooSmall,
                    ),
                    Some(_) => (
                        AttributeLookup {
                            kind,
                            length,
                            value: Some(attr.value.clone()),
                        },
                        GetAttributeOutcome::Ok,
                    ),
                }
            }
        }
    }
}

/// Per-attribute outcome, folded into a single summary `CK_RV` across the
/// whole `C_GetAttributeValue` template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetAttributeOutcome {
    Ok,
    AttributeTypeInvalid,
    BufferTooSmall,
}

impl GetAttributeOutcome {
    /// Fold per-attribute outcomes into one summary result.
    /// `AttributeTypeInvalid` and `BufferTooSmall` can both occur across a
    /// template; `AttributeTypeInvalid` is reported preferentially since a
    /// missing attribute is unrecoverable while a short buffer is
    /// retryable, matching most Cryptoki implementations' precedence.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::AttributeTypeInvalid, _) | (_, Self::AttributeTypeInvalid) => {
                Self::AttributeTypeInvalid
            }
            (Self::BufferTooSmall, _) | (_, Self::BufferTooSmall) => Self::BufferTooSmall,
            (Self::Ok, Self::Ok) => Self::Ok,
        }
    }

    #[must_use]
    pub fn into_result(self) -> Result<(), BridgeError> {
        match self {
            Self::Ok => Ok(()),
            Self::AttributeTypeInvalid => Err(BridgeError::AttributeTypeInvalid),
            Self::BufferTooSmall => Err(BridgeError::BufferTooSmall),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CKA_LABEL, CKA_TOKEN};

    #[test]
    fn missing_attribute_reports_unavailable() {
        let store = AttributeStore::new(vec![Attribute::bool_attr(CKA_TOKEN, true)]);
        let (lookup, outcome) = store.lookup(CKA_LABEL, Some(16));
        assert_eq!(lookup.length, CK_UNAVAILABLE_INFORMATION);
        assert_eq!(outcome, GetAttributeOutcome::AttributeTypeInvalid);
    }

    #[test]
    fn null_buffer_returns_length_only() {
        let store = AttributeStore::new(vec![Attribute::bytes_attr(CKA_LABEL, "hw token")]);
        let (lookup, outcome) = store.lookup(CKA_LABEL, None);
        assert_eq!(lookup.length, 8);
        assert!(lookup.value.is_none());
        assert_eq!(outcome, GetAttributeOutcome::Ok);
    }

    #[test]
    fn short_buffer_reports_buffer_too_small_with_length() {
        let store = AttributeStore::new(vec![Attribute::bytes_attr(CKA_LABEL, "hw token")]);
        let (lookup, outcome) = store.lookup(CKA_LABEL, Some(3));
        assert_eq!(lookup.length, 8);
        assert!(lookup.value.is_none());
        assert_eq!(outcome, GetAttributeOutcome::BufferTooSmall);
    }

    #[test]
    fn exact_buffer_copies_value() {
        let store = AttributeStore::new(vec![Attribute::bytes_attr(CKA_LABEL, "hw token")]);
        let (lookup, outcome) = store.lookup(CKA_LABEL, Some(8));
        assert_eq!(lookup.value.unwrap(), b"hw token");
        assert_eq!(outcome, GetAttributeOutcome::Ok);
    }

    #[test]
    fn merge_prefers_attribute_type_invalid() {
        assert_eq!(
            GetAttributeOutcome::BufferTooSmall.merge(GetAttributeOutcome::AttributeTypeInvalid),
            GetAttributeOutcome::AttributeTypeInvalid
        );
        assert_eq!(
            GetAttributeOutcome::Ok.merge(GetAttributeOutcome::BufferTooSmall),
            GetAttributeOutcome::BufferTooSmall
        );
    }
}
