//! Operation state machine and single-shot/multi-part crypto
//! dispatch.
//!
//! Every crypto entry point funnels through `init`, `single_shot`,
//! `update`, or `finish` below; each enforces the transition table and
//! then either calls straight into a [`CryptoPrimitives`] method or
//! mutates the session's running [`DigestContext`].

use crate::attribute::AttributeLookup;
use crate::constants::*;
use crate::error::BridgeError;
use crate::host::CryptoPrimitives;
use crate::mechanism::{self, MechanismParams, OperationKind, ResolvedAlgorithm};
use crate::object::{Object, ObjectClass};
use crate::session::{DigestContext, OperationState, Session};

fn capability_flag(kind: OperationKind) -> u64 {
    match kind {
        OperationKind::Encrypt => CKA_ENCRYPT,
        OperationKind::Decrypt => CKA_DECRYPT,
        OperationKind::Sign => CKA_SIGN,
        OperationKind::Verify => CKA_VERIFY,
    }
}

fn expected_class(kind: OperationKind) -> u64 {
    match kind {
        OperationKind::Encrypt | OperationKind::Verify => CKO_PUBLIC_KEY,
        OperationKind::Decrypt | OperationKind::Sign => CKO_PRIVATE_KEY,
    }
}

fn init_state(kind: OperationKind) -> OperationState {
    match kind {
        OperationKind::Encrypt => OperationState::EncryptInit,
        OperationKind::Decrypt => OperationState::DecryptInit,
        OperationKind::Sign => OperationState::SignInit,
        OperationKind::Verify => OperationState::VerifyInit,
    }
}

fn attribute_bool(lookup: &AttributeLookup) -> bool {
    lookup.value.as_deref() == Some(&[1])
}

/// Validate that the key object `handle` names in the session's bound
/// object list carries the class `kind` expects (public for
/// encrypt/verify, private for decrypt/sign) and has the corresponding
/// capability attribute set. The caller is responsible for mapping the
/// same `handle` to the opaque host key handle the crypto primitive
/// actually needs.
fn validate_key(objects: &[Object], handle: u64, kind: OperationKind) -> Result<(), BridgeError> {
    let index = handle.checked_sub(1).ok_or(BridgeError::ObjectHandleInvalid)? as usize;
    let object = objects.get(index).ok_or(BridgeError::ObjectHandleInvalid)?;
    if object.class.cka_class() != expected_class(kind) {
        return Err(BridgeError::KeyTypeInconsistent);
    }
    let (lookup, outcome) = object.attributes.lookup(capability_flag(kind), Some(1));
    outcome.into_result()?;
    if !attribute_bool(&lookup) {
        return Err(BridgeError::KeyFunctionNotPermitted);
    }
    Ok(())
}

/// Map a session-local object handle that names a key object back to the
/// opaque host key handle its identity carries, so a caller can pass it
/// through to [`init`] as `host_key_handle`. Only meaningful for sessions
/// bound to a real token; certificate-slot sessions carry no key objects
/// and never reach here (`validate_key` rejects them first).
pub fn resolve_host_key(session: &Session, handle: u64) -> Result<u64, BridgeError> {
    let index = handle.checked_sub(1).ok_or(BridgeError::KeyHandleInvalid)? as usize;
    let object = session.objects.get(index).ok_or(BridgeError::ObjectHandleInvalid)?;
    let identity_index = object.owning_identity.ok_or(BridgeError::KeyHandleInvalid)?;
    let token = session.token.as_ref().ok_or(BridgeError::KeyHandleInvalid)?;
    let identity = token.identities.get(identity_index).ok_or(BridgeError::KeyHandleInvalid)?;
    match object.class {
        ObjectClass::PrivateKey => Ok(identity.private_key_handle),
        ObjectClass::PublicKey => Ok(identity.public_key_handle),
        _ => Err(BridgeError::KeyTypeInconsistent),
    }
}

/// `*-init`: reject if any operation is already in progress
/// (`operation-active`), else validate the key and mechanism and move to
/// the corresponding `*-init` state.
pub fn init(
    session: &mut Session,
    kind: OperationKind,
    key_handle: u64,
    host_key_handle: u64,
    mechanism: u64,
    params: &MechanismParams,
) -> Result<(), BridgeError> {
    if session.state != OperationState::None {
        return Err(BridgeError::OperationActive);
    }
    validate_key(&session.objects, key_handle, kind)?;
    let resolved = mechanism::resolve(mechanism, kind, params)?;
    session.state = init_state(kind);
    session.operation_kind = Some(kind);
    session.held_key = Some(host_key_handle);
    session.resolved = Some(resolved);
    session.expected_output_size = 0;
    session.digest = None;
    Ok(())
}

fn require_state(session: &Session, expected: OperationState) -> Result<(), BridgeError> {
    if session.state == expected {
        Ok(())
    } else {
        Err(BridgeError::OperationNotInitialized)
    }
}

pub struct CryptoOutcome {
    pub data: Option<Vec<u8>>,
    pub required_len: usize,
}

fn dispatch_single_shot(
    host: &dyn CryptoPrimitives,
    kind: OperationKind,
    resolved: &ResolvedAlgorithm,
    key_handle: u64,
    input: &[u8],
) -> Result<Vec<u8>, BridgeError> {
    match (kind, resolved.mechanism) {
        (OperationKind::Encrypt, CKM_RSA_PKCS) => host.rsa_pkcs1_encrypt(key_handle, input),
        (OperationKind::Decrypt, CKM_RSA_PKCS) => host.rsa_pkcs1_decrypt(key_handle, input),
        (OperationKind::Encrypt, CKM_RSA_PKCS_OAEP) => {
            let hash = resolved.hash.ok_or(BridgeError::MechanismParamInvalid)?;
            let mgf = resolved.mgf_hash.ok_or(BridgeError::MechanismParamInvalid)?;
            host.rsa_oaep_encrypt(key_handle, input, hash, mgf)
        }
        (OperationKind::Decrypt, CKM_RSA_PKCS_OAEP) => {
            let hash = resolved.hash.ok_or(BridgeError::MechanismParamInvalid)?;
            let mgf = resolved.mgf_hash.ok_or(BridgeError::MechanismParamInvalid)?;
            host.rsa_oaep_decrypt(key_handle, input, hash, mgf)
        }
        (OperationKind::Sign, _) if resolved.salt_len.is_some() => {
            let hash = resolved.hash.ok_or(BridgeError::MechanismParamInvalid)?;
            let mgf = resolved.mgf_hash.ok_or(BridgeError::MechanismParamInvalid)?;
            let salt_len = resolved.salt_len.unwrap();
            let digest = host.digest(hash, input);
            host.rsa_pss_sign_digest(key_handle, hash, mgf, salt_len, &digest)
        }
        (OperationKind::Sign, _) if resolved.hash.is_some() => {
            let hash = resolved.hash.unwrap();
            host.rsa_pkcs1_sign(key_handle, hash, input)
        }
        (OperationKind::Verify, _) => Err(BridgeError::FunctionFailed),
        _ => Err(BridgeError::MechanismInvalid),
    }
}

fn dispatch_single_shot_verify(
    host: &dyn CryptoPrimitives,
    resolved: &ResolvedAlgorithm,
    key_handle: u64,
    input: &[u8],
    signature: &[u8],
) -> Result<(), BridgeError> {
    let hash = resolved.hash.ok_or(BridgeError::MechanismParamInvalid)?;
    if let Some(salt_len) = resolved.salt_len {
        let mgf = resolved.mgf_hash.ok_or(BridgeError::MechanismParamInvalid)?;
        let digest = host.digest(hash, input);
        return host.rsa_pss_verify_digest(key_handle, hash, mgf, salt_len, &digest, signature);
    }
    host.rsa_pkcs1_verify(key_handle, hash, input, signature)
}

/// Single-shot encrypt/decrypt/sign: whole buffer in, one host call,
/// output-size probing, then clear state on a completed transfer.
pub fn single_shot(
    session: &mut Session,
    host: &dyn CryptoPrimitives,
    kind: OperationKind,
    input: &[u8],
    output_capacity: Option<usize>,
) -> Result<CryptoOutcome, BridgeError> {
    require_state(session, init_state(kind))?;
    let resolved = session.resolved.ok_or(BridgeError::OperationNotInitialized)?;
    let key_handle = session.held_key.ok_or(BridgeError::OperationNotInitialized)?;

    if output_capacity.is_none() {
        if resolved.blocksize_out {
            if let Some(len) = host.rsa_modulus_len(key_handle) {
                return Ok(CryptoOutcome {
                    data: None,
                    required_len: len,
                });
            }
        }
        return Err(BridgeError::BufferTooSmall);
    }

    let output = match dispatch_single_shot(host, kind, &resolved, key_handle, input) {
        Ok(output) => output,
        Err(err) => {
            session.reset_operation();
            return Err(err);
        }
    };
    let capacity = output_capacity.unwrap();
    if capacity < output.len() {
        return Ok(CryptoOutcome {
            data: None,
            required_len: output.len(),
        });
    }
    session.reset_operation();
    Ok(CryptoOutcome {
        required_len: output.len(),
        data: Some(output),
    })
}

/// Single-shot verify: same state/key handling as `single_shot` but
/// returns `()`/`signature-invalid` instead of producing a buffer.
pub fn verify_single_shot(
    session: &mut Session,
    host: &dyn CryptoPrimitives,
    input: &[u8],
    signature: &[u8],
) -> Result<(), BridgeError> {
    require_state(session, OperationState::VerifyInit)?;
    let resolved = session.resolved.ok_or(BridgeError::OperationNotInitialized)?;
    let key_handle = session.held_key.ok_or(BridgeError::OperationNotInitialized)?;
    let result = dispatch_single_shot_verify(host, &resolved, key_handle, input, signature);
    session.reset_operation();
    result
}

/// `sign-update`/`verify-update`: first call initializes the running
/// digest (requires the mechanism to have a digest-taking variant, else
/// `data-len-range`); subsequent calls feed more data.
pub fn update(session: &mut Session, kind: OperationKind, data: &[u8]) -> Result<(), BridgeError> {
    let (init_state, update_state) = match kind {
        OperationKind::Sign => (OperationState::SignInit, OperationState::SignUpdate),
        OperationKind::Verify => (OperationState::VerifyInit, OperationState::VerifyUpdate),
        _ => return Err(BridgeError::OperationNotInitialized),
    };

    if session.state == update_state {
        if let Some(digest) = session.digest.as_mut() {
            digest.update(data);
        }
        return Ok(());
    }
    if session.state != init_state {
        return Err(BridgeError::OperationNotInitialized);
    }
    let resolved = session.resolved.ok_or(BridgeError::OperationNotInitialized)?;
    if !mechanism::supports_multipart(resolved.mechanism) {
        session.reset_operation();
        return Err(BridgeError::DataLenRange);
    }
    let hash = match resolved.hash {
        Some(hash) => hash,
        None => {
            session.reset_operation();
            return Err(BridgeError::DataLenRange);
        }
    };
    let mut digest = DigestContext::new(hash);
    digest.update(data);
    session.digest = Some(digest);
    session.state = update_state;
    Ok(())
}

/// `sign-final`: finalize the running digest, sign it with the
/// digest-taking host primitive, clear state.
pub fn sign_final(session: &mut Session, host: &dyn CryptoPrimitives) -> Result<Vec<u8>, BridgeError> {
    require_state(session, OperationState::SignUpdate)?;
    let resolved = session.resolved.ok_or(BridgeError::OperationNotInitialized)?;
    let key_handle = session.held_key.ok_or(BridgeError::OperationNotInitialized)?;
    let digest_ctx = session.digest.take().ok_or(BridgeError::OperationNotInitialized)?;
    let hash = digest_ctx.hash;
    let digest = host.digest(hash, &digest_ctx.buffer);
    let result = if let Some(salt_len) = resolved.salt_len {
        let mgf = resolved.mgf_hash.ok_or(BridgeError::MechanismParamInvalid);
        mgf.and_then(|mgf| host.rsa_pss_sign_digest(key_handle, hash, mgf, salt_len, &digest))
    } else {
        host.rsa_pkcs1_sign_digest(key_handle, hash, &digest)
    };
    session.reset_operation();
    result
}

/// `verify-final`: finalize the running digest and verify it against the
/// caller-supplied signature, clear state.
pub fn verify_final(
    session: &mut Session,
    host: &dyn CryptoPrimitives,
    signature: &[u8],
) -> Result<(), BridgeError> {
    require_state(session, OperationState::VerifyUpdate)?;
    let resolved = session.resolved.ok_or(BridgeError::OperationNotInitialized)?;
    let key_handle = session.held_key.ok_or(BridgeError::OperationNotInitialized)?;
    let digest_ctx = session.digest.take().ok_or(BridgeError::OperationNotInitialized)?;
    let hash = digest_ctx.hash;
    let digest = host.digest(hash, &digest_ctx.buffer);
    let result = if let Some(salt_len) = resolved.salt_len {
        let mgf = resolved.mgf_hash.ok_or(BridgeError::MechanismParamInvalid);
        mgf.and_then(|mgf| host.rsa_pss_verify_digest(key_handle, hash, mgf, salt_len, &digest, signature))
    } else {
        host.rsa_pkcs1_verify_digest(key_handle, hash, &digest, signature)
    };
    session.reset_operation();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeStore};
    use crate::constants::{CKA_CLASS, CKA_DECRYPT, CKA_ID, CKA_SIGN, CKA_VERIFY, CKK_RSA, CKM_RSA_PKCS, CKM_SHA256_RSA_PKCS, CKO_PRIVATE_KEY, CKO_PUBLIC_KEY};
    use crate::host::mock::MockHost;
    use crate::host::{AuthContextId, CryptoPrimitives as _, RawIdentityRecord, TokenId};
    use crate::object::{Object, ObjectClass};
    use std::sync::Arc;

    fn sample_objects(host: &MockHost) -> (Vec<Object>, u64) {
        let record = host.add_identity_record(
            &TokenId(1),
            RawIdentityRecord {
                certificate_handle: 0,
                private_key_handle: 0,
                public_key_handle: 0,
                public_key_hash: vec![],
                host_key_type: 0,
                access_control: AuthContextId(1),
                label: "x".into(),
                priv_can_sign: true,
                priv_can_decrypt: true,
                pub_can_verify: true,
                pub_can_encrypt: true,
                pub_can_wrap: false,
                certificate_der: vec![0x30],
                subject: vec![],
                issuer: vec![],
                serial_number: vec![],
                modulus: vec![0xFF; 256],
                public_exponent: vec![1, 0, 1],
                private_key_label: "x (private)".into(),
            },
        );
        let public_key = Object {
            owning_identity: Some(0),
            class: ObjectClass::PublicKey,
            attributes: AttributeStore::new(vec![
                Attribute::u64_attr(CKA_CLASS, CKO_PUBLIC_KEY),
                Attribute::bytes_attr(CKA_ID, vec![0]),
                Attribute::u64_attr(crate::constants::CKA_KEY_TYPE, CKK_RSA),
                Attribute::bool_attr(crate::constants::CKA_ENCRYPT, true),
                Attribute::bool_attr(CKA_VERIFY, true),
            ]),
        };
        let private_key = Object {
            owning_identity: Some(0),
            class: ObjectClass::PrivateKey,
            attributes: AttributeStore::new(vec![
                Attribute::u64_attr(CKA_CLASS, CKO_PRIVATE_KEY),
                Attribute::bytes_attr(CKA_ID, vec![0]),
                Attribute::u64_attr(crate::constants::CKA_KEY_TYPE, CKK_RSA),
                Attribute::bool_attr(CKA_DECRYPT, true),
                Attribute::bool_attr(CKA_SIGN, true),
            ]),
        };
        (vec![public_key, private_key], record.private_key_handle.max(record.public_key_handle))
    }

    #[test]
    fn resolve_host_key_rejects_certificate_slot_sessions() {
        let host = MockHost::new();
        let (objects, _) = sample_objects(&host);
        let session = Session::new(0, None, Arc::new(objects));
        let err = resolve_host_key(&session, 1).unwrap_err();
        assert_eq!(err, BridgeError::KeyHandleInvalid);
    }

    #[test]
    fn resolve_host_key_maps_object_to_identity_key_handle() {
        let host = MockHost::new();
        let record = host.add_identity_record(
            &TokenId(1),
            RawIdentityRecord {
                certificate_handle: 1,
                private_key_handle: 2,
                public_key_handle: 3,
                public_key_hash: vec![],
                host_key_type: 0,
                access_control: AuthContextId(1),
                label: "x".into(),
                priv_can_sign: true,
                priv_can_decrypt: true,
                pub_can_verify: true,
                pub_can_encrypt: true,
                pub_can_wrap: false,
                certificate_der: vec![0x30],
                subject: vec![],
                issuer: vec![],
                serial_number: vec![],
                modulus: vec![0xFF; 256],
                public_exponent: vec![1, 0, 1],
                private_key_label: "x (private)".into(),
            },
        );
        let identity = crate::identity::build_identity(record).unwrap();
        let objects = crate::object::build_identity_objects(0, &identity);
        let token = crate::token::Token::new(TokenId(1), "t".into(), vec![identity], objects.to_vec(), None);
        let session = Session::new(0, Some(token.clone()), token.objects.clone());
        // objects[1] is the public key, objects[2] the private key (see build_identity_objects).
        assert_eq!(resolve_host_key(&session, 2).unwrap(), 3);
        assert_eq!(resolve_host_key(&session, 3).unwrap(), 2);
    }

    #[test]
    fn init_twice_without_finish_is_operation_active() {
        let host = MockHost::new();
        let (objects, _) = sample_objects(&host);
        let mut session = Session::new(0, None, Arc::new(objects));
        init(&mut session, OperationKind::Sign, 2, 1, CKM_SHA256_RSA_PKCS, &MechanismParams::None).unwrap();
        let err = init(&mut session, OperationKind::Encrypt, 1, 1, CKM_RSA_PKCS, &MechanismParams::None)
            .unwrap_err();
        assert_eq!(err, BridgeError::OperationActive);
    }

    #[test]
    fn update_before_init_is_not_initialized() {
        let host = MockHost::new();
        let (objects, _) = sample_objects(&host);
        let mut session = Session::new(0, None, Arc::new(objects));
        let err = update(&mut session, OperationKind::Sign, b"data").unwrap_err();
        assert_eq!(err, BridgeError::OperationNotInitialized);
    }

    #[test]
    fn non_multipart_mechanism_rejects_update_and_clears_state() {
        let host = MockHost::new();
        let (objects, _) = sample_objects(&host);
        let mut session = Session::new(0, None, Arc::new(objects));
        // A sign-capable mechanism this registry never marks multi-part, to
        // exercise the "no digest variant" branch of sign-update.
        session.state = OperationState::SignInit;
        session.held_key = Some(1);
        session.resolved = Some(ResolvedAlgorithm {
            mechanism: CKM_RSA_PKCS_PSS,
            hash: None,
            mgf_hash: None,
            salt_len: None,
            blocksize_out: true,
        });
        let err = update(&mut session, OperationKind::Sign, b"data").unwrap_err();
        assert_eq!(err, BridgeError::DataLenRange);
        assert_eq!(session.state, OperationState::None);
    }

    #[test]
    fn sign_size_probe_matches_modulus_length_then_succeeds() {
        let host = MockHost::new();
        let (objects, keys) = sample_objects(&host);
        let private_handle = keys; // handles are small ints; private key is whichever is larger here in this fixture
        let mut session = Session::new(0, None, Arc::new(objects));
        init(
            &mut session,
            OperationKind::Sign,
            2,
            private_handle,
            CKM_SHA256_RSA_PKCS,
            &MechanismParams::None,
        )
        .unwrap();

        let probe = single_shot(&mut session, &host, OperationKind::Sign, b"hello world", None).unwrap();
        assert_eq!(probe.required_len, 256);
        assert!(probe.data.is_none());
        assert_eq!(session.state, OperationState::SignInit);

        let short = single_shot(&mut session, &host, OperationKind::Sign, b"hello world", Some(255)).unwrap();
        assert_eq!(short.required_len, 256);
        assert!(short.data.is_none());
        assert_eq!(session.state, OperationState::SignInit);

        let full = single_shot(&mut session, &host, OperationKind::Sign, b"hello world", Some(256)).unwrap();
        assert_eq!(full.data.unwrap().len(), 256);
        assert_eq!(session.state, OperationState::None);
    }

    #[test]
    fn multipart_sign_then_verify_round_trips() {
        let host = MockHost::new();
        let (objects, keys) = sample_objects(&host);
        let handle = keys;
        let objects = Arc::new(objects);
        let mut signer = Session::new(0, None, objects.clone());
        init(&mut signer, OperationKind::Sign, 2, handle, CKM_SHA256_RSA_PKCS, &MechanismParams::None).unwrap();
        update(&mut signer, OperationKind::Sign, b"hello ").unwrap();
        update(&mut signer, OperationKind::Sign, b"world").unwrap();
        let signature = sign_final(&mut signer, &host).unwrap();
        assert_eq!(signer.state, OperationState::None);

        let mut verifier = Session::new(0, None, objects);
        init(
            &mut verifier,
            OperationKind::Verify,
            1,
            handle,
            CKM_SHA256_RSA_PKCS,
            &MechanismParams::None,
        )
        .unwrap();
        update(&mut verifier, OperationKind::Verify, b"hello world").unwrap();
        verify_final(&mut verifier, &host, &signature).unwrap();
    }

    #[test]
    fn pss_single_shot_sign_dispatches_to_the_pss_primitive_not_pkcs1() {
        use crate::mechanism::PssParams;

        let host = MockHost::new();
        let (objects, keys) = sample_objects(&host);
        let handle = keys;
        let objects = Arc::new(objects);
        let params = MechanismParams::Pss(PssParams {
            hash_alg: crate::constants::CKM_SHA256,
            mgf: crate::constants::CKG_MGF1_SHA256,
            salt_len: 32,
        });

        let mut signer = Session::new(0, None, objects.clone());
        init(&mut signer, OperationKind::Sign, 2, handle, CKM_SHA256_RSA_PKCS_PSS, &params).unwrap();
        let signature = single_shot(&mut signer, &host, OperationKind::Sign, b"hello world", Some(256))
            .unwrap()
            .data
            .unwrap();

        let mut verifier = Session::new(0, None, objects);
        init(&mut verifier, OperationKind::Verify, 1, handle, CKM_SHA256_RSA_PKCS_PSS, &params).unwrap();
        verify_single_shot(&mut verifier, &host, b"hello world", &signature).unwrap();
    }
}
