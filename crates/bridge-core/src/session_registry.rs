//! Session Registry.
//!
//! A dense array of session slots behind one registry lock for shape
//! changes (open/close/grow), with each entry individually lockable so a
//! crypto call on session A never blocks a concurrent call on session B.
//! The registry lock is taken only long enough to clone the `Arc` for a
//! given index; the per-session lock is what actually serializes crypto
//! operations on that session.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::BridgeError;
use crate::object::Object;
use crate::session::Session;
use crate::token::Token;

/// Sessions grow in batches of five once no empty slot is available.
const GROWTH_INCREMENT: usize = 5;

pub enum SessionEntry {
    Empty,
    Occupied(Session),
}

pub struct SessionRegistry {
    sessions: RwLock<Vec<Arc<Mutex<SessionEntry>>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
        }
    }

    /// Open a session bound to `slot_id`. Requires the serial-session flag
    /// (`flags` without the "parallel" bit this bridge doesn't support);
    /// rejects otherwise. Handles are 1-based; a free index is preferred,
    /// else the array grows by five.
    pub fn open(
        &self,
        slot_id: u64,
        serial: bool,
        token: Option<Arc<Token>>,
        objects: Arc<Vec<Object>>,
    ) -> Result<u64, BridgeError> {
        if !serial {
            return Err(BridgeError::ParallelNotSupported);
        }
        let session = Session::new(slot_id, token, objects);
        let mut sessions = self.sessions.write();
        if let Some(index) = sessions.iter().position(|entry| matches!(&*entry.lock(), SessionEntry::Empty))
        {
            *sessions[index].lock() = SessionEntry::Occupied(session);
            log::info!("session registry: opened session {} on slot {slot_id}", index + 1);
            return Ok((index + 1) as u64);
        }
        let base = sessions.len();
        for _ in 0..GROWTH_INCREMENT {
            sessions.push(Arc::new(Mutex::new(SessionEntry::Empty)));
        }
        *sessions[base].lock() = SessionEntry::Occupied(session);
        log::info!("session registry: grew registry to open session {} on slot {slot_id}", base + 1);
        Ok((base + 1) as u64)
    }

    fn entry_at(&self, handle: u64) -> Result<Arc<Mutex<SessionEntry>>, BridgeError> {
        if handle == 0 {
            return Err(BridgeError::SessionHandleInvalid);
        }
        let sessions = self.sessions.read();
        sessions
            .get((handle - 1) as usize)
            .cloned()
            .ok_or(BridgeError::SessionHandleInvalid)
    }

    /// Run `f` against the live session bound to `handle`, holding only
    /// that session's lock.
    pub fn with_session<T>(
        &self,
        handle: u64,
        f: impl FnOnce(&mut Session) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        let entry = self.entry_at(handle)?;
        let mut guard = entry.lock();
        match &mut *guard {
            SessionEntry::Occupied(session) => f(session),
            SessionEntry::Empty => Err(BridgeError::SessionHandleInvalid),
        }
    }

    /// Close one session, releasing its token reference (if any) and
    /// discarding any in-flight digest/held key.
    pub fn close(&self, handle: u64) -> Result<(), BridgeError> {
        let entry = self.entry_at(handle)?;
        let mut guard = entry.lock();
        match &*guard {
            SessionEntry::Occupied(_) => {
                *guard = SessionEntry::Empty;
                log::info!("session registry: closed session {handle}");
                Ok(())
            }
            SessionEntry::Empty => Err(BridgeError::SessionHandleInvalid),
        }
    }

    /// Close every session bound to `slot_id`. Takes the array lock once
    /// and locks each matching session in ascending order, never the
    /// reverse (matches the registry's stated lock order).
    pub fn close_all(&self, slot_id: u64) -> usize {
        let sessions = self.sessions.read();
        let mut closed = 0;
        for entry in sessions.iter() {
            let mut guard = entry.lock();
            let matches = matches!(&*guard, SessionEntry::Occupied(session) if session.slot_id == slot_id);
            if matches {
                *guard = SessionEntry::Empty;
                closed += 1;
            }
        }
        if closed > 0 {
            log::info!("session registry: closed {closed} session(s) bound to slot {slot_id}");
        }
        closed
    }

    /// Close every open session regardless of slot, used by
    /// `Runtime::finalize`. Same lock discipline as `close_all`.
    pub fn close_all_present(&self) -> usize {
        let sessions = self.sessions.read();
        let mut closed = 0;
        for entry in sessions.iter() {
            let mut guard = entry.lock();
            if matches!(&*guard, SessionEntry::Occupied(_)) {
                *guard = SessionEntry::Empty;
                closed += 1;
            }
        }
        closed
    }

    /// The slot a session is bound to, for callers that need it without a
    /// full `with_session` closure (e.g. `C_GetSessionInfo`).
    pub fn session_slot(&self, handle: u64) -> Result<u64, BridgeError> {
        self.with_session(handle, |session| Ok(session.slot_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_non_serial_sessions() {
        let registry = SessionRegistry::new();
        let err = registry.open(0, false, None, Arc::new(vec![])).unwrap_err();
        assert_eq!(err, BridgeError::ParallelNotSupported);
    }

    #[test]
    fn handles_are_one_based_and_reuse_freed_indices() {
        let registry = SessionRegistry::new();
        let h1 = registry.open(0, true, None, Arc::new(vec![])).unwrap();
        let h2 = registry.open(0, true, None, Arc::new(vec![])).unwrap();
        assert_eq!((h1, h2), (1, 2));
        registry.close(h1).unwrap();
        let h3 = registry.open(0, true, None, Arc::new(vec![])).unwrap();
        assert_eq!(h3, 1);
    }

    #[test]
    fn registry_grows_by_five_once_full() {
        let registry = SessionRegistry::new();
        for _ in 0..3 {
            registry.open(0, true, None, Arc::new(vec![])).unwrap();
        }
        assert_eq!(registry.len(), 5);
        for _ in 0..2 {
            registry.open(0, true, None, Arc::new(vec![])).unwrap();
        }
        assert_eq!(registry.len(), 5);
        registry.open(0, true, None, Arc::new(vec![])).unwrap();
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn close_all_only_affects_matching_slot() {
        let registry = SessionRegistry::new();
        let a = registry.open(0, true, None, Arc::new(vec![])).unwrap();
        let _b = registry.open(1, true, None, Arc::new(vec![])).unwrap();
        let closed = registry.close_all(0);
        assert_eq!(closed, 1);
        assert!(registry.close(a).is_err());
    }

    #[test]
    fn closing_twice_reports_invalid_handle() {
        let registry = SessionRegistry::new();
        let h = registry.open(0, true, None, Arc::new(vec![])).unwrap();
        registry.close(h).unwrap();
        assert_eq!(registry.close(h).unwrap_err(), BridgeError::SessionHandleInvalid);
    }
}
