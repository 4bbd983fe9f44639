//! Session Registry entry points: `C_OpenSession`, `C_CloseSession`,
//! `C_CloseAllSessions`, `C_GetSessionInfo`, `C_Login`, `C_Logout`.

use bridge_core::error::BridgeError;
use bridge_core::host::LocalAuth;

use crate::ck_types::*;
use crate::macros::cryptoki_fn;
use crate::runtime_state::{host, runtime};

cryptoki_fn! {
    fn C_OpenSession(
        slot_id: CK_SLOT_ID,
        flags: CK_FLAGS,
        _application: CK_VOID_PTR,
        _notify: CK_NOTIFY,
        session: CK_SESSION_HANDLE_PTR,
    ) {
        if session.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        let token = runtime().slots.require_present(slot_id)?;
        let objects = match &token {
            Some(token) => token.objects.clone(),
            None => runtime().cert_slot.objects(),
        };
        let serial = flags & CKF_SERIAL_SESSION != 0;
        let handle = runtime().sessions.open(slot_id, serial, token, objects)?;
        *session = handle;
        Ok(())
    }
}

cryptoki_fn! {
    fn C_CloseSession(session: CK_SESSION_HANDLE) {
        runtime().close_session(session, host())
    }
}

cryptoki_fn! {
    fn C_CloseAllSessions(slot_id: CK_SLOT_ID) {
        if !runtime().slots.is_valid_slot(slot_id) {
            return Err(BridgeError::SlotIdInvalid);
        }
        runtime().sessions.close_all(slot_id);
        if let Some(token) = runtime().slots.token_at(slot_id) {
            if let Some(ctx) = token.auth_context() {
                host().release(&ctx);
            }
            token.set_auth_context(None);
            token.set_logged_in(false);
        }
        Ok(())
    }
}

cryptoki_fn! {
    fn C_GetSessionInfo(session: CK_SESSION_HANDLE, info: *mut CK_SESSION_INFO) {
        if info.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        let (slot_id, logged_in) = runtime().sessions.with_session(session, |s| {
            Ok((s.slot_id, s.token.as_ref().is_some_and(|t| t.is_logged_in())))
        })?;
        let state = if logged_in { CKS_RO_USER_FUNCTIONS } else { CKS_RO_PUBLIC_SESSION };
        *info = CK_SESSION_INFO {
            slot_id,
            state,
            flags: CKF_SERIAL_SESSION,
            device_error: 0,
        };
        Ok(())
    }
}

cryptoki_fn! {
    fn C_Login(session: CK_SESSION_HANDLE, user_type: CK_USER_TYPE, pin: CK_UTF8CHAR_PTR, pin_len: CK_ULONG) {
        if user_type != bridge_core::constants::CKU_USER {
            return Err(BridgeError::ArgumentsBad);
        }
        let pin_bytes = if pin.is_null() {
            None
        } else {
            Some(std::slice::from_raw_parts(pin, pin_len as usize))
        };
        runtime().login(session, pin_bytes, host())
    }
}

cryptoki_fn! {
    fn C_Logout(session: CK_SESSION_HANDLE) {
        runtime().logout(session, host())
    }
}
