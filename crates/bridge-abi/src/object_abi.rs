//! Attribute Store and Search Engine entry points: `C_GetAttributeValue`,
//! `C_FindObjectsInit`, `C_FindObjects`, `C_FindObjectsFinal`.

use bridge_core::attribute::{GetAttributeOutcome, TemplateAttribute};
use bridge_core::error::BridgeError;
use bridge_core::search;

use crate::ck_types::*;
use crate::macros::cryptoki_fn;
use crate::runtime_state::runtime;

/// Decode a raw `CK_ATTRIBUTE` array into owned template attributes. A null
/// `p_value` is preserved as `None` (matches only an equally null-valued
/// object attribute, never used by this object model); a non-null one is
/// copied into an owned buffer up front since the session lock is not
/// held while this runs.
unsafe fn decode_template(template: *mut CK_ATTRIBUTE, count: usize) -> Vec<TemplateAttribute> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let attr = &*template.add(i);
        let value = if attr.p_value.is_null() {
            None
        } else {
            Some(std::slice::from_raw_parts(attr.p_value as *const u8, attr.value_len as usize).to_vec())
        };
        out.push(TemplateAttribute {
            kind: attr.attr_type,
            value,
        });
    }
    out
}

cryptoki_fn! {
    fn C_GetAttributeValue(
        session: CK_SESSION_HANDLE,
        object: CK_OBJECT_HANDLE,
        template: *mut CK_ATTRIBUTE,
        count: CK_ULONG,
    ) {
        if template.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        let count = count as usize;
        runtime().sessions.with_session(session, |session| {
            let index = (object as usize).checked_sub(1).ok_or(BridgeError::ObjectHandleInvalid)?;
            let target = session.objects.get(index).ok_or(BridgeError::ObjectHandleInvalid)?;
            let mut outcome = GetAttributeOutcome::Ok;
            for i in 0..count {
                let slot = &mut *template.add(i);
                let capacity = if slot.p_value.is_null() {
                    None
                } else {
                    Some(slot.value_len as usize)
                };
                let (lookup, step) = target.attributes.lookup(slot.attr_type, capacity);
                slot.value_len = lookup.length;
                if let Some(bytes) = &lookup.value {
                    let dst = std::slice::from_raw_parts_mut(slot.p_value as *mut u8, bytes.len());
                    dst.copy_from_slice(bytes);
                }
                outcome = outcome.merge(step);
            }
            outcome.into_result()
        })
    }
}

cryptoki_fn! {
    fn C_FindObjectsInit(session: CK_SESSION_HANDLE, template: *mut CK_ATTRIBUTE, count: CK_ULONG) {
        if template.is_null() && count != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let decoded = decode_template(template, count as usize);
        runtime().sessions.with_session(session, |session| {
            search::find_init(session, decoded);
            Ok(())
        })
    }
}

cryptoki_fn! {
    fn C_FindObjects(
        session: CK_SESSION_HANDLE,
        object_list: CK_OBJECT_HANDLE_PTR,
        max_count: CK_ULONG,
        found_count: CK_ULONG_PTR,
    ) {
        if object_list.is_null() || found_count.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        let handles = runtime().sessions.with_session(session, |session| search::find(session, max_count as usize))?;
        for (i, handle) in handles.iter().enumerate() {
            *object_list.add(i) = *handle;
        }
        *found_count = handles.len() as CK_ULONG;
        Ok(())
    }
}

cryptoki_fn! {
    fn C_FindObjectsFinal(session: CK_SESSION_HANDLE) {
        runtime().sessions.with_session(session, |session| {
            search::find_final(session);
            Ok(())
        })
    }
}
