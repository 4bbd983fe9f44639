//! Cryptoki v2.40 C type and struct layout, hand-reproduced so this crate
//! doesn't need a second copy of the numeric constants `bridge-core`
//! already owns. Field names and layouts follow the base specification's
//! `pkcs11t.h`/`pkcs11f.h` headers.

#![allow(non_camel_case_types)]

use std::ffi::c_void;

pub type CK_BYTE = u8;
pub type CK_CHAR = u8;
pub type CK_UTF8CHAR = u8;
pub type CK_BBOOL = u8;
pub type CK_ULONG = u64;
pub type CK_LONG = i64;
pub type CK_FLAGS = CK_ULONG;
pub type CK_RV = CK_ULONG;
pub type CK_SLOT_ID = CK_ULONG;
pub type CK_SESSION_HANDLE = CK_ULONG;
pub type CK_OBJECT_HANDLE = CK_ULONG;
pub type CK_USER_TYPE = CK_ULONG;
pub type CK_STATE = CK_ULONG;
pub type CK_OBJECT_CLASS = CK_ULONG;
pub type CK_ATTRIBUTE_TYPE = CK_ULONG;
pub type CK_MECHANISM_TYPE = CK_ULONG;
pub type CK_KEY_TYPE = CK_ULONG;
pub type CK_VOID_PTR = *mut c_void;

pub type CK_BYTE_PTR = *mut CK_BYTE;
pub type CK_CHAR_PTR = *mut CK_CHAR;
pub type CK_UTF8CHAR_PTR = *mut CK_UTF8CHAR;
pub type CK_ULONG_PTR = *mut CK_ULONG;
pub type CK_SLOT_ID_PTR = *mut CK_SLOT_ID;
pub type CK_SESSION_HANDLE_PTR = *mut CK_SESSION_HANDLE;
pub type CK_OBJECT_HANDLE_PTR = *mut CK_OBJECT_HANDLE;

pub const CK_TRUE: CK_BBOOL = 1;
pub const CK_FALSE: CK_BBOOL = 0;
pub const CK_UNAVAILABLE_INFORMATION: CK_ULONG = CK_ULONG::MAX;
pub const CK_EFFECTIVELY_INFINITE: CK_ULONG = 0;

pub const CKF_SERIAL_SESSION: CK_FLAGS = 0x0000_0004;
pub const CKF_RW_SESSION: CK_FLAGS = 0x0000_0002;
pub const CKF_TOKEN_PRESENT: CK_FLAGS = 0x0000_0001;
pub const CKF_REMOVABLE_DEVICE: CK_FLAGS = 0x0000_0002;
pub const CKF_HW_SLOT: CK_FLAGS = 0x0000_0004;
pub const CKF_DONT_BLOCK: CK_FLAGS = 0x0000_0001;

pub const CKS_RO_PUBLIC_SESSION: CK_STATE = 0;
pub const CKS_RO_USER_FUNCTIONS: CK_STATE = 1;
pub const CKS_RW_PUBLIC_SESSION: CK_STATE = 2;
pub const CKS_RW_USER_FUNCTIONS: CK_STATE = 3;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_VERSION {
    pub major: CK_BYTE,
    pub minor: CK_BYTE,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_INFO {
    pub crypto_ki_version: CK_VERSION,
    pub manufacturer_id: [CK_UTF8CHAR; 32],
    pub flags: CK_FLAGS,
    pub library_description: [CK_UTF8CHAR; 32],
    pub library_version: CK_VERSION,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_SLOT_INFO {
    pub slot_description: [CK_UTF8CHAR; 64],
    pub manufacturer_id: [CK_UTF8CHAR; 32],
    pub flags: CK_FLAGS,
    pub hardware_version: CK_VERSION,
    pub firmware_version: CK_VERSION,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_TOKEN_INFO {
    pub label: [CK_UTF8CHAR; 32],
    pub manufacturer_id: [CK_UTF8CHAR; 32],
    pub model: [CK_UTF8CHAR; 16],
    pub serial_number: [CK_CHAR; 16],
    pub flags: CK_FLAGS,
    pub max_session_count: CK_ULONG,
    pub session_count: CK_ULONG,
    pub max_rw_session_count: CK_ULONG,
    pub rw_session_count: CK_ULONG,
    pub max_pin_len: CK_ULONG,
    pub min_pin_len: CK_ULONG,
    pub total_public_memory: CK_ULONG,
    pub free_public_memory: CK_ULONG,
    pub total_private_memory: CK_ULONG,
    pub free_private_memory: CK_ULONG,
    pub hardware_version: CK_VERSION,
    pub firmware_version: CK_VERSION,
    pub utc_time: [CK_CHAR; 16],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_SESSION_INFO {
    pub slot_id: CK_SLOT_ID,
    pub state: CK_STATE,
    pub flags: CK_FLAGS,
    pub device_error: CK_ULONG,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_ATTRIBUTE {
    pub attr_type: CK_ATTRIBUTE_TYPE,
    pub p_value: CK_VOID_PTR,
    pub value_len: CK_ULONG,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_MECHANISM {
    pub mechanism: CK_MECHANISM_TYPE,
    pub p_parameter: CK_VOID_PTR,
    pub parameter_len: CK_ULONG,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_MECHANISM_INFO {
    pub min_key_size: CK_ULONG,
    pub max_key_size: CK_ULONG,
    pub flags: CK_FLAGS,
}

pub const CKM_RSA_PKCS_OAEP: CK_MECHANISM_TYPE = 0x0000_0009;
pub const CKM_RSA_PKCS_PSS: CK_MECHANISM_TYPE = 0x0000_000D;
pub const CKG_MGF1_SHA1: CK_ULONG = 0x0000_0001;
pub const CKZ_DATA_SPECIFIED: CK_ULONG = 0x0000_0001;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_RSA_PKCS_OAEP_PARAMS {
    pub hash_alg: CK_MECHANISM_TYPE,
    pub mgf: CK_ULONG,
    pub source: CK_ULONG,
    pub source_data: CK_VOID_PTR,
    pub source_data_len: CK_ULONG,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_RSA_PKCS_PSS_PARAMS {
    pub hash_alg: CK_MECHANISM_TYPE,
    pub mgf: CK_ULONG,
    pub salt_len: CK_ULONG,
}

pub type CK_NOTIFY = Option<
    unsafe extern "C" fn(session: CK_SESSION_HANDLE, event: CK_ULONG, application: CK_VOID_PTR) -> CK_RV,
>;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CK_C_INITIALIZE_ARGS {
    pub create_mutex: CK_VOID_PTR,
    pub destroy_mutex: CK_VOID_PTR,
    pub lock_mutex: CK_VOID_PTR,
    pub unlock_mutex: CK_VOID_PTR,
    pub flags: CK_FLAGS,
    pub reserved: CK_VOID_PTR,
}

pub const CKF_LIBRARY_CANT_CREATE_OS_THREADS: CK_FLAGS = 0x0000_0001;
pub const CKF_OS_LOCKING_OK: CK_FLAGS = 0x0000_0002;

/// The exported dispatch table `C_GetFunctionList` hands back. Field
/// order matches `pkcs11f.h`; every entry is `Some` except the ones this
/// bridge reports as not supported, which are still populated (with a
/// function that unconditionally returns `CKR_FUNCTION_NOT_SUPPORTED`)
/// rather than left `None`, since real callers dereference the pointer
/// without a null check.
#[repr(C)]
pub struct CK_FUNCTION_LIST {
    pub version: CK_VERSION,
    pub c_initialize: Option<unsafe extern "C" fn(CK_VOID_PTR) -> CK_RV>,
    pub c_finalize: Option<unsafe extern "C" fn(CK_VOID_PTR) -> CK_RV>,
    pub c_get_info: Option<unsafe extern "C" fn(*mut CK_INFO) -> CK_RV>,
    pub c_get_function_list: Option<unsafe extern "C" fn(*mut *mut CK_FUNCTION_LIST) -> CK_RV>,
    pub c_get_slot_list: Option<unsafe extern "C" fn(CK_BBOOL, CK_SLOT_ID_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_get_slot_info: Option<unsafe extern "C" fn(CK_SLOT_ID, *mut CK_SLOT_INFO) -> CK_RV>,
    pub c_get_token_info: Option<unsafe extern "C" fn(CK_SLOT_ID, *mut CK_TOKEN_INFO) -> CK_RV>,
    pub c_get_mechanism_list: Option<unsafe extern "C" fn(CK_SLOT_ID, CK_ULONG_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_get_mechanism_info:
        Option<unsafe extern "C" fn(CK_SLOT_ID, CK_MECHANISM_TYPE, *mut CK_MECHANISM_INFO) -> CK_RV>,
    pub c_init_token: Option<unsafe extern "C" fn(CK_SLOT_ID, CK_UTF8CHAR_PTR, CK_ULONG, CK_UTF8CHAR_PTR) -> CK_RV>,
    pub c_init_pin: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_UTF8CHAR_PTR, CK_ULONG) -> CK_RV>,
    pub c_set_pin:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_UTF8CHAR_PTR, CK_ULONG, CK_UTF8CHAR_PTR, CK_ULONG) -> CK_RV>,
    pub c_open_session: Option<
        unsafe extern "C" fn(CK_SLOT_ID, CK_FLAGS, CK_VOID_PTR, CK_NOTIFY, CK_SESSION_HANDLE_PTR) -> CK_RV,
    >,
    pub c_close_session: Option<unsafe extern "C" fn(CK_SESSION_HANDLE) -> CK_RV>,
    pub c_close_all_sessions: Option<unsafe extern "C" fn(CK_SLOT_ID) -> CK_RV>,
    pub c_get_session_info: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_SESSION_INFO) -> CK_RV>,
    pub c_get_operation_state: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_set_operation_state: Option<
        unsafe extern "C" fn(
            CK_SESSION_HANDLE,
            CK_BYTE_PTR,
            CK_ULONG,
            CK_OBJECT_HANDLE,
            CK_OBJECT_HANDLE,
        ) -> CK_RV,
    >,
    pub c_login: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_USER_TYPE, CK_UTF8CHAR_PTR, CK_ULONG) -> CK_RV>,
    pub c_logout: Option<unsafe extern "C" fn(CK_SESSION_HANDLE) -> CK_RV>,
    pub c_create_object:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_ATTRIBUTE, CK_ULONG, CK_OBJECT_HANDLE_PTR) -> CK_RV>,
    pub c_copy_object: Option<
        unsafe extern "C" fn(
            CK_SESSION_HANDLE,
            CK_OBJECT_HANDLE,
            *mut CK_ATTRIBUTE,
            CK_ULONG,
            CK_OBJECT_HANDLE_PTR,
        ) -> CK_RV,
    >,
    pub c_destroy_object: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_get_object_size: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_OBJECT_HANDLE, CK_ULONG_PTR) -> CK_RV>,
    pub c_get_attribute_value: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_OBJECT_HANDLE, *mut CK_ATTRIBUTE, CK_ULONG) -> CK_RV,
    >,
    pub c_set_attribute_value: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_OBJECT_HANDLE, *mut CK_ATTRIBUTE, CK_ULONG) -> CK_RV,
    >,
    pub c_find_objects_init:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_ATTRIBUTE, CK_ULONG) -> CK_RV>,
    pub c_find_objects: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_OBJECT_HANDLE_PTR, CK_ULONG, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_find_objects_final: Option<unsafe extern "C" fn(CK_SESSION_HANDLE) -> CK_RV>,
    pub c_encrypt_init: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_encrypt: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_encrypt_update: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_encrypt_final: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_decrypt_init: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_decrypt: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_decrypt_update: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_decrypt_final: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_digest_init: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM) -> CK_RV>,
    pub c_digest:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_digest_update: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_digest_key: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_digest_final: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_sign_init: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_sign:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_sign_update: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_sign_final: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_sign_recover_init:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_sign_recover:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_verify_init: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_verify:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_verify_update: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_verify_final: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_verify_recover_init:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, CK_OBJECT_HANDLE) -> CK_RV>,
    pub c_verify_recover:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV>,
    pub c_digest_encrypt_update: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_decrypt_digest_update: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_sign_encrypt_update: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_decrypt_verify_update: Option<
        unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG, CK_BYTE_PTR, CK_ULONG_PTR) -> CK_RV,
    >,
    pub c_generate_key:
        Option<unsafe extern "C" fn(CK_SESSION_HANDLE, *mut CK_MECHANISM, *mut CK_ATTRIBUTE, CK_ULONG, CK_OBJECT_HANDLE_PTR) -> CK_RV>,
    pub c_generate_key_pair: Option<
        unsafe extern "C" fn(
            CK_SESSION_HANDLE,
            *mut CK_MECHANISM,
            *mut CK_ATTRIBUTE,
            CK_ULONG,
            *mut CK_ATTRIBUTE,
            CK_ULONG,
            CK_OBJECT_HANDLE_PTR,
            CK_OBJECT_HANDLE_PTR,
        ) -> CK_RV,
    >,
    pub c_wrap_key: Option<
        unsafe extern "C" fn(
            CK_SESSION_HANDLE,
            *mut CK_MECHANISM,
            CK_OBJECT_HANDLE,
            CK_OBJECT_HANDLE,
            CK_BYTE_PTR,
            CK_ULONG_PTR,
        ) -> CK_RV,
    >,
    pub c_unwrap_key: Option<
        unsafe extern "C" fn(
            CK_SESSION_HANDLE,
            *mut CK_MECHANISM,
            CK_OBJECT_HANDLE,
            CK_BYTE_PTR,
            CK_ULONG,
            *mut CK_ATTRIBUTE,
            CK_ULONG,
            CK_OBJECT_HANDLE_PTR,
        ) -> CK_RV,
    >,
    pub c_derive_key: Option<
        unsafe extern "C" fn(
            CK_SESSION_HANDLE,
            *mut CK_MECHANISM,
            CK_OBJECT_HANDLE,
            *mut CK_ATTRIBUTE,
            CK_ULONG,
            CK_OBJECT_HANDLE_PTR,
        ) -> CK_RV,
    >,
    pub c_seed_random: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_generate_random: Option<unsafe extern "C" fn(CK_SESSION_HANDLE, CK_BYTE_PTR, CK_ULONG) -> CK_RV>,
    pub c_get_function_status: Option<unsafe extern "C" fn(CK_SESSION_HANDLE) -> CK_RV>,
    pub c_cancel_function: Option<unsafe extern "C" fn(CK_SESSION_HANDLE) -> CK_RV>,
    pub c_wait_for_slot_event: Option<unsafe extern "C" fn(CK_FLAGS, CK_SLOT_ID_PTR, CK_VOID_PTR) -> CK_RV>,
}

// Safety: every field is either a plain value or a `fn` pointer; none of
// this crate's static `CK_FUNCTION_LIST` instances hold raw data
// pointers of their own.
unsafe impl Sync for CK_FUNCTION_LIST {}
