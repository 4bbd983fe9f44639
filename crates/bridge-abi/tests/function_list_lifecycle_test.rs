//! Drives the library purely through the `C_GetFunctionList` dispatch
//! table, the way a real PKCS#11 consumer would: no direct access to
//! any `C_*` symbol, no access to `bridge-core` internals.
//!
//! `RUNTIME`/`HOST` are process-wide `OnceLock`s with no reset, so this
//! has to be one long-lived test rather than several independent ones.

use std::ptr;

use bridge_abi::ck_types::*;
use bridge_core::constants::{CKM_SHA256_RSA_PKCS, CKR_NO_EVENT, CKR_OK, CKU_USER};

unsafe fn function_list() -> &'static CK_FUNCTION_LIST {
    let mut list: *mut CK_FUNCTION_LIST = ptr::null_mut();
    let rv = bridge_abi::C_GetFunctionList(&mut list);
    assert_eq!(rv, CKR_OK);
    &*list
}

#[test]
fn full_lifecycle_through_the_dispatch_table() {
    unsafe {
        let funcs = function_list();

        let rv = (funcs.c_initialize.unwrap())(ptr::null_mut());
        assert_eq!(rv, CKR_OK, "C_Initialize");

        // The software token is discovered at C_Initialize time now that
        // the watcher is actually wired in, so it shows up without a
        // C_WaitForSlotEvent round trip first.
        let mut slot_count: CK_ULONG = 0;
        let rv = (funcs.c_get_slot_list.unwrap())(CK_TRUE, ptr::null_mut(), &mut slot_count);
        assert_eq!(rv, CKR_OK, "C_GetSlotList probe");
        assert_eq!(slot_count, 1, "exactly one token-present slot at startup");

        let mut slots = vec![0 as CK_SLOT_ID; slot_count as usize];
        let rv = (funcs.c_get_slot_list.unwrap())(CK_TRUE, slots.as_mut_ptr(), &mut slot_count);
        assert_eq!(rv, CKR_OK, "C_GetSlotList fetch");
        let slot_id = slots[0];

        let mut session: CK_SESSION_HANDLE = 0;
        let rv = (funcs.c_open_session.unwrap())(
            slot_id,
            CKF_SERIAL_SESSION,
            ptr::null_mut(),
            None,
            &mut session,
        );
        assert_eq!(rv, CKR_OK, "C_OpenSession");

        let pin = b"1234";
        let rv = (funcs.c_login.unwrap())(session, CKU_USER, pin.as_ptr() as CK_UTF8CHAR_PTR, pin.len() as CK_ULONG);
        assert_eq!(rv, CKR_OK, "C_Login");

        // Handles 1/2/3 on a freshly inserted single-identity token are
        // the certificate, the public key, and the private key in that
        // order (see `build_identity_objects`).
        let private_key: CK_OBJECT_HANDLE = 3;
        let public_key: CK_OBJECT_HANDLE = 2;

        let mut mechanism = CK_MECHANISM {
            mechanism: CKM_SHA256_RSA_PKCS,
            p_parameter: ptr::null_mut(),
            parameter_len: 0,
        };
        let rv = (funcs.c_sign_init.unwrap())(session, &mut mechanism, private_key);
        assert_eq!(rv, CKR_OK, "C_SignInit");

        let message = b"dispatch table round trip";
        let mut signature_len: CK_ULONG = 0;
        let rv = (funcs.c_sign.unwrap())(
            session,
            message.as_ptr() as CK_BYTE_PTR,
            message.len() as CK_ULONG,
            ptr::null_mut(),
            &mut signature_len,
        );
        assert_eq!(rv, CKR_OK, "C_Sign size probe");
        assert_eq!(signature_len, 256, "RSA-2048 signature length");

        let mut signature = vec![0u8; signature_len as usize];
        let rv = (funcs.c_sign.unwrap())(
            session,
            message.as_ptr() as CK_BYTE_PTR,
            message.len() as CK_ULONG,
            signature.as_mut_ptr(),
            &mut signature_len,
        );
        assert_eq!(rv, CKR_OK, "C_Sign fetch");

        let mut mechanism = CK_MECHANISM {
            mechanism: CKM_SHA256_RSA_PKCS,
            p_parameter: ptr::null_mut(),
            parameter_len: 0,
        };
        let rv = (funcs.c_verify_init.unwrap())(session, &mut mechanism, public_key);
        assert_eq!(rv, CKR_OK, "C_VerifyInit");

        let rv = (funcs.c_verify.unwrap())(
            session,
            message.as_ptr() as CK_BYTE_PTR,
            message.len() as CK_ULONG,
            signature.as_mut_ptr(),
            signature_len,
        );
        assert_eq!(rv, CKR_OK, "C_Verify accepts its own signature");

        // A tampered signature must not verify.
        signature[0] ^= 0xff;
        let mut mechanism = CK_MECHANISM {
            mechanism: CKM_SHA256_RSA_PKCS,
            p_parameter: ptr::null_mut(),
            parameter_len: 0,
        };
        let rv = (funcs.c_verify_init.unwrap())(session, &mut mechanism, public_key);
        assert_eq!(rv, CKR_OK, "C_VerifyInit (tampered run)");
        let rv = (funcs.c_verify.unwrap())(
            session,
            message.as_ptr() as CK_BYTE_PTR,
            message.len() as CK_ULONG,
            signature.as_mut_ptr(),
            signature_len,
        );
        assert_ne!(rv, CKR_OK, "tampered signature must be rejected");

        let rv = (funcs.c_close_session.unwrap())(session);
        assert_eq!(rv, CKR_OK, "C_CloseSession");

        // The software host's watcher only ever fires its one insertion
        // event, already consumed during C_Initialize, so a non-blocking
        // poll now reports nothing pending.
        let mut event_slot: CK_SLOT_ID = 0;
        let rv = (funcs.c_wait_for_slot_event.unwrap())(CKF_DONT_BLOCK, &mut event_slot, ptr::null_mut());
        assert_eq!(rv, CKR_NO_EVENT, "no further token events after startup");

        let rv = (funcs.c_finalize.unwrap())(ptr::null_mut());
        assert_eq!(rv, CKR_OK, "C_Finalize");
    }
}
