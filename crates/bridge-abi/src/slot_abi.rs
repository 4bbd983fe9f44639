//! Slot/Token Registry and Mechanism Registry entry points: `C_GetSlotList`,
//! `C_GetSlotInfo`, `C_GetTokenInfo`, `C_GetMechanismList`,
//! `C_GetMechanismInfo`.

use bridge_core::constants::CERTIFICATE_SLOT_ID;
use bridge_core::error::BridgeError;
use bridge_core::mechanism;

use crate::ck_types::*;
use crate::macros::cryptoki_fn;
use crate::runtime_state::{host, runtime};

fn pad<const N: usize>(text: &str) -> [CK_UTF8CHAR; N] {
    let mut buf = [0x20u8; N];
    let bytes = text.as_bytes();
    let len = bytes.len().min(N);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Copy `src` into the caller's buffer following the usual Cryptoki
/// two-call convention: a null buffer is a count probe, a too-small
/// buffer is `buffer-too-small` without being touched.
unsafe fn fill_ulong_list(src: &[u64], buffer: CK_ULONG_PTR, count: CK_ULONG_PTR) -> Result<(), BridgeError> {
    if count.is_null() {
        return Err(BridgeError::ArgumentsBad);
    }
    if buffer.is_null() {
        *count = src.len() as CK_ULONG;
        return Ok(());
    }
    let capacity = *count as usize;
    if capacity < src.len() {
        *count = src.len() as CK_ULONG;
        return Err(BridgeError::BufferTooSmall);
    }
    for (i, value) in src.iter().enumerate() {
        *buffer.add(i) = *value;
    }
    *count = src.len() as CK_ULONG;
    Ok(())
}

cryptoki_fn! {
    fn C_GetSlotList(token_present: CK_BBOOL, slot_list: CK_SLOT_ID_PTR, count: CK_ULONG_PTR) {
        let ids = runtime().slots.enumerate(token_present != 0);
        fill_ulong_list(&ids, slot_list, count)
    }
}

cryptoki_fn! {
    fn C_GetSlotInfo(slot_id: CK_SLOT_ID, info: *mut CK_SLOT_INFO) {
        if info.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        if !runtime().slots.is_valid_slot(slot_id) {
            return Err(BridgeError::SlotIdInvalid);
        }
        let present = slot_id == CERTIFICATE_SLOT_ID || runtime().slots.token_at(slot_id).is_some();
        let description = if slot_id == CERTIFICATE_SLOT_ID {
            "Platform trusted certificates"
        } else {
            "Software Cryptoki bridge slot"
        };
        *info = CK_SLOT_INFO {
            slot_description: pad(description),
            manufacturer_id: pad("Open source"),
            flags: if present { CKF_TOKEN_PRESENT } else { 0 },
            hardware_version: CK_VERSION { major: 1, minor: 0 },
            firmware_version: CK_VERSION { major: 1, minor: 0 },
        };
        Ok(())
    }
}

cryptoki_fn! {
    fn C_GetTokenInfo(slot_id: CK_SLOT_ID, info: *mut CK_TOKEN_INFO) {
        if info.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        let token = runtime().slots.require_present(slot_id)?;
        let label = match &token {
            Some(token) => token.label(),
            None => "Platform trusted certificates".to_string(),
        };
        *info = CK_TOKEN_INFO {
            label: pad(&label),
            manufacturer_id: pad("Open source"),
            model: pad("software"),
            serial_number: pad("0000000000000001"),
            flags: 0,
            max_session_count: CK_EFFECTIVELY_INFINITE,
            session_count: CK_UNAVAILABLE_INFORMATION,
            max_rw_session_count: CK_EFFECTIVELY_INFINITE,
            rw_session_count: CK_UNAVAILABLE_INFORMATION,
            max_pin_len: 256,
            min_pin_len: 1,
            total_public_memory: CK_UNAVAILABLE_INFORMATION,
            free_public_memory: CK_UNAVAILABLE_INFORMATION,
            total_private_memory: CK_UNAVAILABLE_INFORMATION,
            free_private_memory: CK_UNAVAILABLE_INFORMATION,
            hardware_version: CK_VERSION { major: 1, minor: 0 },
            firmware_version: CK_VERSION { major: 1, minor: 0 },
            utc_time: pad(""),
        };
        Ok(())
    }
}

cryptoki_fn! {
    fn C_GetMechanismList(slot_id: CK_SLOT_ID, mechanism_list: CK_ULONG_PTR, count: CK_ULONG_PTR) {
        if !runtime().slots.is_valid_slot(slot_id) {
            return Err(BridgeError::SlotIdInvalid);
        }
        let mechanisms = mechanism::list_mechanisms();
        fill_ulong_list(&mechanisms, mechanism_list, count)
    }
}

cryptoki_fn! {
    fn C_GetMechanismInfo(slot_id: CK_SLOT_ID, mechanism_type: CK_MECHANISM_TYPE, info: *mut CK_MECHANISM_INFO) {
        if info.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        if !runtime().slots.is_valid_slot(slot_id) {
            return Err(BridgeError::SlotIdInvalid);
        }
        let mechanism_info = mechanism::mechanism_info(mechanism_type).ok_or(BridgeError::MechanismInvalid)?;
        *info = CK_MECHANISM_INFO {
            min_key_size: mechanism_info.min_key_bits,
            max_key_size: mechanism_info.max_key_bits,
            flags: mechanism_info.flags,
        };
        Ok(())
    }
}

cryptoki_fn! {
    fn C_WaitForSlotEvent(flags: CK_FLAGS, slot: CK_SLOT_ID_PTR, _reserved: CK_VOID_PTR) {
        if slot.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        loop {
            if let Some(event) = host().poll() {
                if let Some(slot_id) = runtime().handle_token_event(event, host()) {
                    *slot = slot_id;
                    return Ok(());
                }
                // Event produced no slot change (e.g. an insertion with no
                // usable identities); keep polling rather than report it.
                continue;
            }
            if flags & CKF_DONT_BLOCK != 0 {
                return Err(BridgeError::NoEvent);
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
    }
}
