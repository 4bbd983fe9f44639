//! Stub exports for every Cryptoki function this bridge reports as
//! unsupported: token/PIN management, object creation/mutation, key
//! generation/wrap/unwrap/derive, the RNG entry points, digest-only
//! operations, operation-state save/restore, and the recover/combined
//! update variants. `CK_FUNCTION_LIST` always carries a function pointer
//! here rather than `None` (see `ck_types::CK_FUNCTION_LIST`), and every
//! stub unconditionally returns `CKR_FUNCTION_NOT_SUPPORTED`.
//!
//! Multi-part encrypt/decrypt (`C_EncryptUpdate`/`C_EncryptFinal`/
//! `C_DecryptUpdate`/`C_DecryptFinal`) live here too: only single-shot
//! encrypt/decrypt is implemented, multi-part sign/verify is the one
//! multi-part surface this bridge supports.

use bridge_core::error::BridgeError;

use crate::ck_types::*;
use crate::macros::cryptoki_fn;

cryptoki_fn! {
    fn C_InitToken(
        _slot_id: CK_SLOT_ID,
        _pin: CK_UTF8CHAR_PTR,
        _pin_len: CK_ULONG,
        _label: CK_UTF8CHAR_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_InitPIN(_session: CK_SESSION_HANDLE, _pin: CK_UTF8CHAR_PTR, _pin_len: CK_ULONG) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SetPIN(
        _session: CK_SESSION_HANDLE,
        _old_pin: CK_UTF8CHAR_PTR,
        _old_len: CK_ULONG,
        _new_pin: CK_UTF8CHAR_PTR,
        _new_len: CK_ULONG,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_GetOperationState(_session: CK_SESSION_HANDLE, _state: CK_BYTE_PTR, _state_len: CK_ULONG_PTR) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SetOperationState(
        _session: CK_SESSION_HANDLE,
        _state: CK_BYTE_PTR,
        _state_len: CK_ULONG,
        _encrypt_key: CK_OBJECT_HANDLE,
        _auth_key: CK_OBJECT_HANDLE,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_CreateObject(
        _session: CK_SESSION_HANDLE,
        _template: *mut CK_ATTRIBUTE,
        _count: CK_ULONG,
        _object: CK_OBJECT_HANDLE_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_CopyObject(
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
        _template: *mut CK_ATTRIBUTE,
        _count: CK_ULONG,
        _new_object: CK_OBJECT_HANDLE_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DestroyObject(_session: CK_SESSION_HANDLE, _object: CK_OBJECT_HANDLE) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_GetObjectSize(_session: CK_SESSION_HANDLE, _object: CK_OBJECT_HANDLE, _size: CK_ULONG_PTR) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SetAttributeValue(
        _session: CK_SESSION_HANDLE,
        _object: CK_OBJECT_HANDLE,
        _template: *mut CK_ATTRIBUTE,
        _count: CK_ULONG,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_EncryptUpdate(
        _session: CK_SESSION_HANDLE,
        _part: CK_BYTE_PTR,
        _part_len: CK_ULONG,
        _encrypted: CK_BYTE_PTR,
        _encrypted_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_EncryptFinal(_session: CK_SESSION_HANDLE, _last: CK_BYTE_PTR, _last_len: CK_ULONG_PTR) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DecryptUpdate(
        _session: CK_SESSION_HANDLE,
        _part: CK_BYTE_PTR,
        _part_len: CK_ULONG,
        _decrypted: CK_BYTE_PTR,
        _decrypted_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DecryptFinal(_session: CK_SESSION_HANDLE, _last: CK_BYTE_PTR, _last_len: CK_ULONG_PTR) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DigestInit(_session: CK_SESSION_HANDLE, _mechanism: *mut CK_MECHANISM) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_Digest(
        _session: CK_SESSION_HANDLE,
        _data: CK_BYTE_PTR,
        _data_len: CK_ULONG,
        _digest: CK_BYTE_PTR,
        _digest_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DigestUpdate(_session: CK_SESSION_HANDLE, _part: CK_BYTE_PTR, _part_len: CK_ULONG) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DigestKey(_session: CK_SESSION_HANDLE, _key: CK_OBJECT_HANDLE) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DigestFinal(_session: CK_SESSION_HANDLE, _digest: CK_BYTE_PTR, _digest_len: CK_ULONG_PTR) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SignRecoverInit(_session: CK_SESSION_HANDLE, _mechanism: *mut CK_MECHANISM, _key: CK_OBJECT_HANDLE) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SignRecover(
        _session: CK_SESSION_HANDLE,
        _data: CK_BYTE_PTR,
        _data_len: CK_ULONG,
        _signature: CK_BYTE_PTR,
        _signature_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_VerifyRecoverInit(_session: CK_SESSION_HANDLE, _mechanism: *mut CK_MECHANISM, _key: CK_OBJECT_HANDLE) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_VerifyRecover(
        _session: CK_SESSION_HANDLE,
        _signature: CK_BYTE_PTR,
        _signature_len: CK_ULONG,
        _data: CK_BYTE_PTR,
        _data_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DigestEncryptUpdate(
        _session: CK_SESSION_HANDLE,
        _part: CK_BYTE_PTR,
        _part_len: CK_ULONG,
        _encrypted: CK_BYTE_PTR,
        _encrypted_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DecryptDigestUpdate(
        _session: CK_SESSION_HANDLE,
        _encrypted: CK_BYTE_PTR,
        _encrypted_len: CK_ULONG,
        _part: CK_BYTE_PTR,
        _part_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SignEncryptUpdate(
        _session: CK_SESSION_HANDLE,
        _part: CK_BYTE_PTR,
        _part_len: CK_ULONG,
        _encrypted: CK_BYTE_PTR,
        _encrypted_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DecryptVerifyUpdate(
        _session: CK_SESSION_HANDLE,
        _encrypted: CK_BYTE_PTR,
        _encrypted_len: CK_ULONG,
        _part: CK_BYTE_PTR,
        _part_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_GenerateKey(
        _session: CK_SESSION_HANDLE,
        _mechanism: *mut CK_MECHANISM,
        _template: *mut CK_ATTRIBUTE,
        _count: CK_ULONG,
        _key: CK_OBJECT_HANDLE_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_GenerateKeyPair(
        _session: CK_SESSION_HANDLE,
        _mechanism: *mut CK_MECHANISM,
        _public_template: *mut CK_ATTRIBUTE,
        _public_count: CK_ULONG,
        _private_template: *mut CK_ATTRIBUTE,
        _private_count: CK_ULONG,
        _public_key: CK_OBJECT_HANDLE_PTR,
        _private_key: CK_OBJECT_HANDLE_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_WrapKey(
        _session: CK_SESSION_HANDLE,
        _mechanism: *mut CK_MECHANISM,
        _wrapping_key: CK_OBJECT_HANDLE,
        _key: CK_OBJECT_HANDLE,
        _wrapped_key: CK_BYTE_PTR,
        _wrapped_key_len: CK_ULONG_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_UnwrapKey(
        _session: CK_SESSION_HANDLE,
        _mechanism: *mut CK_MECHANISM,
        _unwrapping_key: CK_OBJECT_HANDLE,
        _wrapped_key: CK_BYTE_PTR,
        _wrapped_key_len: CK_ULONG,
        _template: *mut CK_ATTRIBUTE,
        _count: CK_ULONG,
        _key: CK_OBJECT_HANDLE_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_DeriveKey(
        _session: CK_SESSION_HANDLE,
        _mechanism: *mut CK_MECHANISM,
        _base_key: CK_OBJECT_HANDLE,
        _template: *mut CK_ATTRIBUTE,
        _count: CK_ULONG,
        _key: CK_OBJECT_HANDLE_PTR,
    ) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_SeedRandom(_session: CK_SESSION_HANDLE, _seed: CK_BYTE_PTR, _seed_len: CK_ULONG) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_GenerateRandom(_session: CK_SESSION_HANDLE, _random_data: CK_BYTE_PTR, _random_len: CK_ULONG) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_GetFunctionStatus(_session: CK_SESSION_HANDLE) {
        Err(BridgeError::FunctionNotSupported)
    }
}

cryptoki_fn! {
    fn C_CancelFunction(_session: CK_SESSION_HANDLE) {
        Err(BridgeError::FunctionNotSupported)
    }
}
