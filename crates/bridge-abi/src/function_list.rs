//! Library-level entry points (`C_GetFunctionList`, `C_GetInfo`,
//! `C_Initialize`, `C_Finalize`) and the static dispatch table every
//! other module's functions are wired into.

use bridge_core::error::BridgeError;
use bridge_core::mutex_provider::MutexProvider;

use crate::ck_types::*;
use crate::macros::cryptoki_fn;
use crate::runtime_state::{host, runtime};
use crate::{crypto_abi, object_abi, session_abi, slot_abi, unsupported};

const LIBRARY_DESCRIPTION: &str = "Software Cryptoki bridge";
const MANUFACTURER_ID: &str = "Open source";

fn pad<const N: usize>(text: &str) -> [CK_UTF8CHAR; N] {
    let mut buf = [0x20u8; N];
    let bytes = text.as_bytes();
    let len = bytes.len().min(N);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

fn program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
}

cryptoki_fn! {
    fn C_Initialize(init_args: CK_VOID_PTR) {
        let provider = if init_args.is_null() {
            MutexProvider::Native
        } else {
            let args = &*(init_args as *const CK_C_INITIALIZE_ARGS);
            if args.create_mutex.is_null()
                && args.destroy_mutex.is_null()
                && args.lock_mutex.is_null()
                && args.unlock_mutex.is_null()
            {
                MutexProvider::Native
            } else {
                MutexProvider::NoLocking
            }
        };
        if !provider.locking_enabled() {
            log::warn!("C_Initialize: caller requested no locking, threading is the caller's responsibility");
        }
        let runtime = runtime();
        runtime.initialize(&program_name())?;
        runtime.run_certificate_scan(host());
        // Tokens already present when the library loads are discovered
        // here rather than left for the first `C_WaitForSlotEvent`; a real
        // watcher would report them the same way a later hot-plug does.
        if let Some(event) = host().poll() {
            runtime.handle_token_event(event, host());
        }
        Ok(())
    }
}

cryptoki_fn! {
    fn C_Finalize(_reserved: CK_VOID_PTR) {
        runtime().finalize()
    }
}

cryptoki_fn! {
    fn C_GetInfo(info: *mut CK_INFO) {
        if info.is_null() {
            return Err(BridgeError::ArgumentsBad);
        }
        *info = CK_INFO {
            crypto_ki_version: CK_VERSION { major: 2, minor: 40 },
            manufacturer_id: pad(MANUFACTURER_ID),
            flags: 0,
            library_description: pad(LIBRARY_DESCRIPTION),
            library_version: CK_VERSION { major: 1, minor: 0 },
        };
        Ok(())
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn C_GetFunctionList(list: *mut *mut CK_FUNCTION_LIST) -> CK_RV {
    if list.is_null() {
        return bridge_core::constants::CKR_ARGUMENTS_BAD;
    }
    unsafe {
        *list = (&raw const FUNCTION_LIST) as *mut CK_FUNCTION_LIST;
    }
    bridge_core::constants::CKR_OK
}

pub static FUNCTION_LIST: CK_FUNCTION_LIST = CK_FUNCTION_LIST {
    version: CK_VERSION { major: 2, minor: 40 },
    c_initialize: Some(C_Initialize),
    c_finalize: Some(C_Finalize),
    c_get_info: Some(C_GetInfo),
    c_get_function_list: Some(C_GetFunctionList),
    c_get_slot_list: Some(slot_abi::C_GetSlotList),
    c_get_slot_info: Some(slot_abi::C_GetSlotInfo),
    c_get_token_info: Some(slot_abi::C_GetTokenInfo),
    c_get_mechanism_list: Some(slot_abi::C_GetMechanismList),
    c_get_mechanism_info: Some(slot_abi::C_GetMechanismInfo),
    c_init_token: Some(unsupported::C_InitToken),
    c_init_pin: Some(unsupported::C_InitPIN),
    c_set_pin: Some(unsupported::C_SetPIN),
    c_open_session: Some(session_abi::C_OpenSession),
    c_close_session: Some(session_abi::C_CloseSession),
    c_close_all_sessions: Some(session_abi::C_CloseAllSessions),
    c_get_session_info: Some(session_abi::C_GetSessionInfo),
    c_get_operation_state: Some(unsupported::C_GetOperationState),
    c_set_operation_state: Some(unsupported::C_SetOperationState),
    c_login: Some(session_abi::C_Login),
    c_logout: Some(session_abi::C_Logout),
    c_create_object: Some(unsupported::C_CreateObject),
    c_copy_object: Some(unsupported::C_CopyObject),
    c_destroy_object: Some(unsupported::C_DestroyObject),
    c_get_object_size: Some(unsupported::C_GetObjectSize),
    c_get_attribute_value: Some(object_abi::C_GetAttributeValue),
    c_set_attribute_value: Some(unsupported::C_SetAttributeValue),
    c_find_objects_init: Some(object_abi::C_FindObjectsInit),
    c_find_objects: Some(object_abi::C_FindObjects),
    c_find_objects_final: Some(object_abi::C_FindObjectsFinal),
    c_encrypt_init: Some(crypto_abi::C_EncryptInit),
    c_encrypt: Some(crypto_abi::C_Encrypt),
    c_encrypt_update: Some(unsupported::C_EncryptUpdate),
    c_encrypt_final: Some(unsupported::C_EncryptFinal),
    c_decrypt_init: Some(crypto_abi::C_DecryptInit),
    c_decrypt: Some(crypto_abi::C_Decrypt),
    c_decrypt_update: Some(unsupported::C_DecryptUpdate),
    c_decrypt_final: Some(unsupported::C_DecryptFinal),
    c_digest_init: Some(unsupported::C_DigestInit),
    c_digest: Some(unsupported::C_Digest),
    c_digest_update: Some(unsupported::C_DigestUpdate),
    c_digest_key: Some(unsupported::C_DigestKey),
    c_digest_final: Some(unsupported::C_DigestFinal),
    c_sign_init: Some(crypto_abi::C_SignInit),
    c_sign: Some(crypto_abi::C_Sign),
    c_sign_update: Some(crypto_abi::C_SignUpdate),
    c_sign_final: Some(crypto_abi::C_SignFinal),
    c_sign_recover_init: Some(unsupported::C_SignRecoverInit),
    c_sign_recover: Some(unsupported::C_SignRecover),
    c_verify_init: Some(crypto_abi::C_VerifyInit),
    c_verify: Some(crypto_abi::C_Verify),
    c_verify_update: Some(crypto_abi::C_VerifyUpdate),
    c_verify_final: Some(crypto_abi::C_VerifyFinal),
    c_verify_recover_init: Some(unsupported::C_VerifyRecoverInit),
    c_verify_recover: Some(unsupported::C_VerifyRecover),
    c_digest_encrypt_update: Some(unsupported::C_DigestEncryptUpdate),
    c_decrypt_digest_update: Some(unsupported::C_DecryptDigestUpdate),
    c_sign_encrypt_update: Some(unsupported::C_SignEncryptUpdate),
    c_decrypt_verify_update: Some(unsupported::C_DecryptVerifyUpdate),
    c_generate_key: Some(unsupported::C_GenerateKey),
    c_generate_key_pair: Some(unsupported::C_GenerateKeyPair),
    c_wrap_key: Some(unsupported::C_WrapKey),
    c_unwrap_key: Some(unsupported::C_UnwrapKey),
    c_derive_key: Some(unsupported::C_DeriveKey),
    c_seed_random: Some(unsupported::C_SeedRandom),
    c_generate_random: Some(unsupported::C_GenerateRandom),
    c_get_function_status: Some(unsupported::C_GetFunctionStatus),
    c_cancel_function: Some(unsupported::C_CancelFunction),
    c_wait_for_slot_event: Some(slot_abi::C_WaitForSlotEvent),
};
