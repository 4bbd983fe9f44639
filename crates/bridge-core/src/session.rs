//! Session data model.
//!
//! A session is a serialized handle into a token's object list plus the
//! scope of at most one in-progress crypto operation. Sessions are
//! created by `SessionRegistry::open` and own everything the operation
//! state machine mutates: the current protocol state, the held key
//! handle, the resolved algorithm, and (for multi-part sign/verify) a
//! running digest buffer.

use std::sync::Arc;

use crate::attribute::TemplateAttribute;
use crate::host::HashAlg;
use crate::mechanism::{OperationKind, ResolvedAlgorithm};
use crate::object::Object;
use crate::token::Token;

/// Per-session protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    None,
    EncryptInit,
    DecryptInit,
    SignInit,
    SignUpdate,
    VerifyInit,
    VerifyUpdate,
}

/// Accumulates bytes fed by `*-update` calls for the mechanism's hash
/// identifier; finalized (hashed) once by the corresponding `*-final`.
#[derive(Debug, Clone)]
pub struct DigestContext {
    pub hash: HashAlg,
    pub buffer: Vec<u8>,
}

impl DigestContext {
    #[must_use]
    pub fn new(hash: HashAlg) -> Self {
        Self {
            hash,
            buffer: Vec::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }
}

pub struct Session {
    pub slot_id: u64,
    /// Absent when bound to the certificate slot.
    pub token: Option<Arc<Token>>,
    pub objects: Arc<Vec<Object>>,
    pub object_count: usize,
    pub search_cursor: usize,
    pub search_template: Option<Vec<TemplateAttribute>>,
    pub state: OperationState,
    pub operation_kind: Option<OperationKind>,
    pub held_key: Option<u64>,
    pub resolved: Option<ResolvedAlgorithm>,
    pub expected_output_size: usize,
    pub digest: Option<DigestContext>,
}

impl Session {
    #[must_use]
    pub fn new(slot_id: u64, token: Option<Arc<Token>>, objects: Arc<Vec<Object>>) -> Self {
        let object_count = objects.len();
        Self {
            slot_id,
            token,
            objects,
            object_count,
            search_cursor: 0,
            search_template: None,
            state: OperationState::None,
            operation_kind: None,
            held_key: None,
            resolved: None,
            expected_output_size: 0,
            digest: None,
        }
    }

    /// Clear every field the operation state machine owns, releasing the
    /// held key and discarding any in-flight digest. Used after a
    /// successful single-shot transfer, after `*-final`, and on a host
    /// primitive failure, so a failed operation can never be resumed.
    pub fn reset_operation(&mut self) {
        self.state = OperationState::None;
        self.operation_kind = None;
        self.held_key = None;
        self.resolved = None;
        self.expected_output_size = 0;
        self.digest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_has_no_operation_in_progress() {
        let session = Session::new(0, None, Arc::new(vec![]));
        assert_eq!(session.state, OperationState::None);
        assert!(session.held_key.is_none());
    }

    #[test]
    fn reset_operation_clears_every_in_flight_field() {
        let mut session = Session::new(0, None, Arc::new(vec![]));
        session.state = OperationState::SignUpdate;
        session.operation_kind = Some(OperationKind::Sign);
        session.held_key = Some(7);
        session.digest = Some(DigestContext::new(HashAlg::Sha256));
        session.reset_operation();
        assert_eq!(session.state, OperationState::None);
        assert!(session.operation_kind.is_none());
        assert!(session.held_key.is_none());
        assert!(session.digest.is_none());
    }
}
