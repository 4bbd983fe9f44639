//! Slot/Token Registry.
//!
//! An integer-indexed, dense array of slots; zero or one token per slot.
//! A single reserved index (the certificate slot) is present only when
//! configuration enables it: a `Vec` of slots behind one registry lock,
//! free-index reuse on insertion, and a dedicated reserved slot that is
//! never a hardware slot.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::constants::CERTIFICATE_SLOT_ID;
use crate::error::BridgeError;
use crate::host::TokenId;
use crate::token::Token;

pub enum SlotEntry {
    Empty,
    Occupied(Arc<Token>),
}

pub struct Slot {
    pub entry: SlotEntry,
}

/// Dense array of hardware slots plus an optional, separately-tracked
/// certificate slot.
pub struct SlotRegistry {
    slots: RwLock<Vec<Slot>>,
    certificate_slot_enabled: RwLock<bool>,
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotRegistry {
    /// A fresh system always has slot 0, the one hardware slot this
    /// bridge reports, even with no token inserted into it yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(vec![Slot { entry: SlotEntry::Empty }]),
            certificate_slot_enabled: RwLock::new(false),
        }
    }

    pub fn set_certificate_slot_enabled(&self, enabled: bool) {
        *self.certificate_slot_enabled.write() = enabled;
    }

    #[must_use]
    pub fn certificate_slot_enabled(&self) -> bool {
        *self.certificate_slot_enabled.read()
    }

    /// Ascending occupied (or all) indices, certificate slot appended
    /// last iff enabled.
    #[must_use]
    pub fn enumerate(&self, present_only: bool) -> Vec<u64> {
        let slots = self.slots.read();
        let mut ids: Vec<u64> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !present_only || matches!(slot.entry, SlotEntry::Occupied(_)))
            .map(|(i, _)| i as u64)
            .collect();
        if self.certificate_slot_enabled() {
            ids.push(CERTIFICATE_SLOT_ID);
        }
        ids
    }

    #[must_use]
    pub fn is_valid_slot(&self, slot_id: u64) -> bool {
        if slot_id == CERTIFICATE_SLOT_ID {
            return self.certificate_slot_enabled();
        }
        let slots = self.slots.read();
        (slot_id as usize) < slots.len()
    }

    /// Rejects valid-but-empty slots with token-not-present.
    pub fn require_present(&self, slot_id: u64) -> Result<Option<Arc<Token>>, BridgeError> {
        if !self.is_valid_slot(slot_id) {
            return Err(BridgeError::SlotIdInvalid);
        }
        if slot_id == CERTIFICATE_SLOT_ID {
            return Ok(None);
        }
        let slots = self.slots.read();
        match &slots[slot_id as usize].entry {
            SlotEntry::Occupied(token) => Ok(Some(Arc::clone(token))),
            SlotEntry::Empty => Err(BridgeError::TokenNotPresent),
        }
    }

    #[must_use]
    pub fn token_at(&self, slot_id: u64) -> Option<Arc<Token>> {
        if slot_id == CERTIFICATE_SLOT_ID {
            return None;
        }
        let slots = self.slots.read();
        slots.get(slot_id as usize).and_then(|slot| match &slot.entry {
            SlotEntry::Occupied(token) => Some(Arc::clone(token)),
            SlotEntry::Empty => None,
        })
    }

    /// Pick the first empty index, else grow by one. Returns the
    /// assigned slot id.
    pub fn insert_token(&self, token: Arc<Token>) -> u64 {
        let mut slots = self.slots.write();
        if let Some(index) = slots
            .iter()
            .position(|slot| matches!(slot.entry, SlotEntry::Empty))
        {
            slots[index].entry = SlotEntry::Occupied(token);
            log::info!("slot registry: token inserted into existing slot {index}");
            index as u64
        } else {
            slots.push(Slot {
                entry: SlotEntry::Occupied(token),
            });
            let index = slots.len() - 1;
            log::info!("slot registry: grew registry to hold token in slot {index}");
            index as u64
        }
    }

    /// Scan for the slot whose token id matches, empty it, and release
    /// the registry's reference. Returns the freed slot id, if any.
    pub fn remove_token(&self, token_id: &TokenId) -> Option<u64> {
        let mut slots = self.slots.write();
        let index = slots.iter().position(|slot| match &slot.entry {
            SlotEntry::Occupied(token) => token.token_id == *token_id,
            SlotEntry::Empty => false,
        })?;
        slots[index].entry = SlotEntry::Empty;
        log::info!("slot registry: removed token from slot {index}");
        Some(index as u64)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_token(id: u64) -> Arc<Token> {
        Token::new(TokenId(id), "t".into(), vec![], vec![], None)
    }

    #[test]
    fn fresh_registry_reports_its_one_empty_hardware_slot() {
        let registry = SlotRegistry::new();
        assert_eq!(registry.enumerate(false), vec![0]);
        assert_eq!(registry.enumerate(true), Vec::<u64>::new());
    }

    #[test]
    fn certificate_slot_appended_last_when_enabled() {
        let registry = SlotRegistry::new();
        registry.insert_token(dummy_token(1));
        registry.set_certificate_slot_enabled(true);
        assert_eq!(registry.enumerate(false), vec![0, CERTIFICATE_SLOT_ID]);
    }

    #[test]
    fn insertion_reuses_freed_index_before_growing() {
        let registry = SlotRegistry::new();
        let slot0 = registry.insert_token(dummy_token(1));
        let slot1 = registry.insert_token(dummy_token(2));
        assert_eq!((slot0, slot1), (0, 1));
        registry.remove_token(&TokenId(1));
        let slot_reused = registry.insert_token(dummy_token(3));
        assert_eq!(slot_reused, 0);
    }

    #[test]
    fn invalid_slot_is_rejected() {
        let registry = SlotRegistry::new();
        assert_eq!(registry.require_present(1).unwrap_err(), BridgeError::SlotIdInvalid);
    }

    #[test]
    fn empty_but_valid_slot_reports_token_not_present() {
        let registry = SlotRegistry::new();
        registry.insert_token(dummy_token(1));
        registry.remove_token(&TokenId(1));
        assert_eq!(
            registry.require_present(0).unwrap_err(),
            BridgeError::TokenNotPresent
        );
    }
}
