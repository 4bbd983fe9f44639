//! Operation State Machine entry points: `C_EncryptInit`/`C_Encrypt`,
//! `C_DecryptInit`/`C_Decrypt`, `C_SignInit`/`C_Sign`/`C_SignUpdate`/
//! `C_SignFinal`, `C_VerifyInit`/`C_Verify`/`C_VerifyUpdate`/`C_VerifyFinal`.

use bridge_core::constants::CKM_SHA256_RSA_PKCS_PSS;
use bridge_core::error::BridgeError;
use bridge_core::mechanism::{MechanismParams, OaepParams, OperationKind, PssParams};
use bridge_core::operation;

use crate::ck_types::*;
use crate::macros::cryptoki_fn;
use crate::runtime_state::{host, runtime};

/// Decode a raw `CK_MECHANISM` into the mechanism id and its parameter
/// block, if any. Unknown parameter shapes are left to `mechanism::resolve`
/// to reject; this only reads the two parameter types this bridge supports.
unsafe fn decode_mechanism(mechanism: *mut CK_MECHANISM) -> Result<(u64, MechanismParams), BridgeError> {
    if mechanism.is_null() {
        return Err(BridgeError::ArgumentsBad);
    }
    let raw = &*mechanism;
    let params = match raw.mechanism {
        CKM_RSA_PKCS_OAEP => {
            if raw.p_parameter.is_null() {
                return Err(BridgeError::MechanismParamInvalid);
            }
            let p = &*(raw.p_parameter as *const CK_RSA_PKCS_OAEP_PARAMS);
            MechanismParams::Oaep(OaepParams {
                hash_alg: p.hash_alg,
                mgf: p.mgf,
                source: p.source,
                source_data_present: !p.source_data.is_null(),
            })
        }
        CKM_RSA_PKCS_PSS | CKM_SHA256_RSA_PKCS_PSS => {
            if raw.p_parameter.is_null() {
                return Err(BridgeError::MechanismParamInvalid);
            }
            let p = &*(raw.p_parameter as *const CK_RSA_PKCS_PSS_PARAMS);
            MechanismParams::Pss(PssParams {
                hash_alg: p.hash_alg,
                mgf: p.mgf,
                salt_len: p.salt_len,
            })
        }
        _ => MechanismParams::None,
    };
    Ok((raw.mechanism, params))
}

/// Decode the caller's output-buffer pointer/length into the
/// `Option<usize>` capacity `single_shot`/`sign_final` expect: `None` means
/// a null buffer (size probe), `Some` a caller-supplied capacity.
unsafe fn output_capacity(buffer: CK_BYTE_PTR, len: CK_ULONG_PTR) -> Result<Option<usize>, BridgeError> {
    if len.is_null() {
        return Err(BridgeError::ArgumentsBad);
    }
    if buffer.is_null() {
        return Ok(None);
    }
    Ok(Some(*len as usize))
}

unsafe fn write_output(data: &[u8], buffer: CK_BYTE_PTR, len: CK_ULONG_PTR) {
    let dst = std::slice::from_raw_parts_mut(buffer, data.len());
    dst.copy_from_slice(data);
    *len = data.len() as CK_ULONG;
}

fn init_for(
    session: CK_SESSION_HANDLE,
    kind: OperationKind,
    mechanism: *mut CK_MECHANISM,
    key: CK_OBJECT_HANDLE,
) -> Result<(), BridgeError> {
    let (mechanism_id, params) = unsafe { decode_mechanism(mechanism)? };
    runtime().sessions.with_session(session, |s| {
        let host_key = operation::resolve_host_key(s, key)?;
        operation::init(s, kind, key, host_key, mechanism_id, &params)
    })
}

cryptoki_fn! {
    fn C_EncryptInit(session: CK_SESSION_HANDLE, mechanism: *mut CK_MECHANISM, key: CK_OBJECT_HANDLE) {
        init_for(session, OperationKind::Encrypt, mechanism, key)
    }
}

cryptoki_fn! {
    fn C_Encrypt(
        session: CK_SESSION_HANDLE,
        data: CK_BYTE_PTR,
        data_len: CK_ULONG,
        encrypted_data: CK_BYTE_PTR,
        encrypted_data_len: CK_ULONG_PTR,
    ) {
        if data.is_null() && data_len != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let input = std::slice::from_raw_parts(data, data_len as usize);
        let capacity = output_capacity(encrypted_data, encrypted_data_len)?;
        let outcome = runtime().sessions.with_session(session, |s| {
            operation::single_shot(s, host(), OperationKind::Encrypt, input, capacity)
        })?;
        *encrypted_data_len = outcome.required_len as CK_ULONG;
        match outcome.data {
            Some(out) => {
                write_output(&out, encrypted_data, encrypted_data_len);
                Ok(())
            }
            None if capacity.is_some() => Err(BridgeError::BufferTooSmall),
            None => Ok(()),
        }
    }
}

cryptoki_fn! {
    fn C_DecryptInit(session: CK_SESSION_HANDLE, mechanism: *mut CK_MECHANISM, key: CK_OBJECT_HANDLE) {
        init_for(session, OperationKind::Decrypt, mechanism, key)
    }
}

cryptoki_fn! {
    fn C_Decrypt(
        session: CK_SESSION_HANDLE,
        encrypted_data: CK_BYTE_PTR,
        encrypted_data_len: CK_ULONG,
        data: CK_BYTE_PTR,
        data_len: CK_ULONG_PTR,
    ) {
        if encrypted_data.is_null() && encrypted_data_len != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let input = std::slice::from_raw_parts(encrypted_data, encrypted_data_len as usize);
        let capacity = output_capacity(data, data_len)?;
        let outcome = runtime().sessions.with_session(session, |s| {
            operation::single_shot(s, host(), OperationKind::Decrypt, input, capacity)
        })?;
        *data_len = outcome.required_len as CK_ULONG;
        match outcome.data {
            Some(out) => {
                write_output(&out, data, data_len);
                Ok(())
            }
            None if capacity.is_some() => Err(BridgeError::BufferTooSmall),
            None => Ok(()),
        }
    }
}

cryptoki_fn! {
    fn C_SignInit(session: CK_SESSION_HANDLE, mechanism: *mut CK_MECHANISM, key: CK_OBJECT_HANDLE) {
        init_for(session, OperationKind::Sign, mechanism, key)
    }
}

cryptoki_fn! {
    fn C_Sign(
        session: CK_SESSION_HANDLE,
        data: CK_BYTE_PTR,
        data_len: CK_ULONG,
        signature: CK_BYTE_PTR,
        signature_len: CK_ULONG_PTR,
    ) {
        if data.is_null() && data_len != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let input = std::slice::from_raw_parts(data, data_len as usize);
        let capacity = output_capacity(signature, signature_len)?;
        let outcome = runtime().sessions.with_session(session, |s| {
            operation::single_shot(s, host(), OperationKind::Sign, input, capacity)
        })?;
        *signature_len = outcome.required_len as CK_ULONG;
        match outcome.data {
            Some(out) => {
                write_output(&out, signature, signature_len);
                Ok(())
            }
            None if capacity.is_some() => Err(BridgeError::BufferTooSmall),
            None => Ok(()),
        }
    }
}

cryptoki_fn! {
    fn C_SignUpdate(session: CK_SESSION_HANDLE, part: CK_BYTE_PTR, part_len: CK_ULONG) {
        if part.is_null() && part_len != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let data = std::slice::from_raw_parts(part, part_len as usize);
        runtime().sessions.with_session(session, |s| operation::update(s, OperationKind::Sign, data))
    }
}

cryptoki_fn! {
    fn C_SignFinal(session: CK_SESSION_HANDLE, signature: CK_BYTE_PTR, signature_len: CK_ULONG_PTR) {
        if signature_len.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        let out = runtime().sessions.with_session(session, |s| operation::sign_final(s, host()))?;
        if signature.is_null() {
            *signature_len = out.len() as CK_ULONG;
            return Ok(());
        }
        if (*signature_len as usize) < out.len() {
            *signature_len = out.len() as CK_ULONG;
            return Err(BridgeError::BufferTooSmall);
        }
        write_output(&out, signature, signature_len);
        Ok(())
    }
}

cryptoki_fn! {
    fn C_VerifyInit(session: CK_SESSION_HANDLE, mechanism: *mut CK_MECHANISM, key: CK_OBJECT_HANDLE) {
        init_for(session, OperationKind::Verify, mechanism, key)
    }
}

cryptoki_fn! {
    fn C_Verify(
        session: CK_SESSION_HANDLE,
        data: CK_BYTE_PTR,
        data_len: CK_ULONG,
        signature: CK_BYTE_PTR,
        signature_len: CK_ULONG,
    ) {
        if (data.is_null() && data_len != 0) || (signature.is_null() && signature_len != 0) {
            return Err(BridgeError::ArgumentsBad);
        }
        let input = std::slice::from_raw_parts(data, data_len as usize);
        let sig = std::slice::from_raw_parts(signature, signature_len as usize);
        runtime().sessions.with_session(session, |s| operation::verify_single_shot(s, host(), input, sig))
    }
}

cryptoki_fn! {
    fn C_VerifyUpdate(session: CK_SESSION_HANDLE, part: CK_BYTE_PTR, part_len: CK_ULONG) {
        if part.is_null() && part_len != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let data = std::slice::from_raw_parts(part, part_len as usize);
        runtime().sessions.with_session(session, |s| operation::update(s, OperationKind::Verify, data))
    }
}

cryptoki_fn! {
    fn C_VerifyFinal(session: CK_SESSION_HANDLE, signature: CK_BYTE_PTR, signature_len: CK_ULONG) {
        if signature.is_null() && signature_len != 0 {
            return Err(BridgeError::ArgumentsBad);
        }
        let sig = std::slice::from_raw_parts(signature, signature_len as usize);
        runtime().sessions.with_session(session, |s| operation::verify_final(s, host(), sig))
    }
}
