//! In-memory host collaborator implementations, used by `bridge-core`'s own
//! test suite and offered to embedding applications for development
//! fixtures (see DESIGN.md for why these replace a CI-only fixture crate
//! that depended on unpublished internal build tooling).
//!
//! The RSA math here is a deliberately simple block-cipher stand-in for a
//! real RSA implementation (no OAEP/PSS padding, no primality proofs) --
//! it exists only to make the encrypt/decrypt and sign/verify round-trip
//! properties checkable without a platform crypto framework or a bignum
//! dependency.

use std::collections::{HashMap, HashSet, VecDeque};

use parking_lot::Mutex;

use super::{
    AuthContextId, AuthUsage, CertRecord, CryptoPrimitives, HashAlg, IdentityProvider, LocalAuth,
    Preferences, RawIdentityRecord, TokenEvent, TokenId, TokenWatcher,
};
use crate::error::BridgeError;

// ---------------------------------------------------------------------------
// Toy RSA
// ---------------------------------------------------------------------------

/// Bytes of plaintext packed per modular-exponentiation block. Kept small
/// enough that `block_value < modulus` always holds for the mock key
/// below, and that `block_value * block_value` never overflows `u128`.
const BLOCK_BYTES: usize = 5;
/// Width of one encoded block in the wire representation.
const CHUNK_BYTES: usize = 8;
/// Length prefix reserved at the front of the plaintext stream so decode
/// can trim trailing zero-padding unambiguously.
const LEN_PREFIX_BYTES: usize = 4;

#[derive(Debug, Clone, Copy)]
struct ToyRsaKey {
    n: u64,
    e: u64,
    d: u64,
    /// Reported modulus size in bytes (what `CKA_MODULUS_BITS` / output-size
    /// probing sees), independent of the toy math's real block size so
    /// that RSA-2048-shaped size-probe tests are exercisable.
    reported_modulus_bytes: usize,
}

fn egcd(a: i128, b: i128) -> (i128, i128, i128) {
    if b == 0 {
        (a, 1, 0)
    } else {
        let (g, x, y) = egcd(b, a % b);
        (g, y, x - (a / b) * y)
    }
}

fn mod_inverse(a: u64, m: u64) -> u64 {
    let (_, x, _) = egcd(a as i128, m as i128);
    (((x % m as i128) + m as i128) % m as i128) as u64
}

fn modexp(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut result: u128 = 1;
    let m = modulus as u128;
    base %= modulus;
    let mut b = base as u128;
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * b) % m;
        }
        b = (b * b) % m;
        exp >>= 1;
    }
    result as u64
}

impl ToyRsaKey {
    /// Fixed demonstration key: p = 2_097_593, q = 2_097_613 (both prime),
    /// n ~= 4.4e12 (< 2^43), comfortably inside the `u128` intermediate
    /// budget for `modexp`.
    fn demo(reported_modulus_bytes: usize) -> Self {
        let p: u64 = 2_097_593;
        let q: u64 = 2_097_613;
        let n = p * q;
        let phi = (p - 1) * (q - 1);
        let e: u64 = 65537 % phi.max(1);
        let e = if e < 3 { 17 } else { e };
        let d = mod_inverse(e, phi);
        Self {
            n,
            e,
            d,
            reported_modulus_bytes,
        }
    }

    fn transform_blocks(&self, input: &[u8], exponent: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len().div_ceil(BLOCK_BYTES) * CHUNK_BYTES);
        for chunk in input.chunks(BLOCK_BYTES) {
            let mut padded = [0u8; BLOCK_BYTES];
            padded[..chunk.len()].copy_from_slice(chunk);
            let value = padded.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
            let transformed = modexp(value, exponent, self.n);
            out.extend_from_slice(&transformed.to_be_bytes());
        }
        out
    }

    fn encrypt_bytes(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut framed = Vec::with_capacity(LEN_PREFIX_BYTES + plaintext.len());
        framed.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());
        framed.extend_from_slice(plaintext);
        self.transform_blocks(&framed, self.e)
    }

    fn decrypt_bytes(&self, ciphertext: &[u8]) -> Result<Vec<u8>, BridgeError> {
        if ciphertext.is_empty() || ciphertext.len() % CHUNK_BYTES != 0 {
            return Err(BridgeError::DataLenRange);
        }
        let mut framed = Vec::with_capacity(ciphertext.len());
        for chunk in ciphertext.chunks(CHUNK_BYTES) {
            let value = u64::from_be_bytes(chunk.try_into().unwrap());
            let recovered = modexp(value, self.d, self.n);
            let block = recovered.to_be_bytes();
            framed.extend_from_slice(&block[CHUNK_BYTES - BLOCK_BYTES..]);
        }
        if framed.len() < LEN_PREFIX_BYTES {
            return Err(BridgeError::FunctionFailed);
        }
        let len = u32::from_be_bytes(framed[..LEN_PREFIX_BYTES].try_into().unwrap()) as usize;
        let payload = &framed[LEN_PREFIX_BYTES..];
        if len > payload.len() {
            return Err(BridgeError::FunctionFailed);
        }
        Ok(payload[..len].to_vec())
    }
}

fn digest_bytes(alg: HashAlg, data: &[u8]) -> Vec<u8> {
    use sha1::Sha1;
    use sha2::{Digest, Sha256, Sha384, Sha512};
    match alg {
        HashAlg::Sha1 => {
            use sha1::Digest as _;
            Sha1::digest(data).to_vec()
        }
        HashAlg::Sha256 => Sha256::digest(data).to_vec(),
        HashAlg::Sha384 => Sha384::digest(data).to_vec(),
        HashAlg::Sha512 => Sha512::digest(data).to_vec(),
    }
}

// ---------------------------------------------------------------------------
// MockHost
// ---------------------------------------------------------------------------

/// Every in-memory host collaborator bundled together. Implements
/// [`IdentityProvider`], [`LocalAuth`], [`CertificateStore`],
/// [`Preferences`], [`TokenWatcher`], and [`CryptoPrimitives`].
pub struct MockHost {
    identities: Mutex<HashMap<TokenId, Vec<RawIdentityRecord>>>,
    /// Correct PIN per auth context; `None` means "any PIN accepted."
    pins: Mutex<HashMap<AuthContextId, Option<Vec<u8>>>>,
    authenticated: Mutex<HashSet<AuthContextId>>,
    certs: Mutex<Vec<CertRecord>>,
    prefs: Mutex<HashMap<String, Vec<String>>>,
    events: Mutex<VecDeque<TokenEvent>>,
    keys: Mutex<HashMap<u64, ToyRsaKey>>,
    next_handle: Mutex<u64>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
            pins: Mutex::new(HashMap::new()),
            authenticated: Mutex::new(HashSet::new()),
            certs: Mutex::new(Vec::new()),
            prefs: Mutex::new(HashMap::new()),
            events: Mutex::new(VecDeque::new()),
            keys: Mutex::new(HashMap::new()),
            next_handle: Mutex::new(1),
        }
    }

    fn alloc_handle(&self) -> u64 {
        let mut next = self.next_handle.lock();
        let h = *next;
        *next += 1;
        h
    }

    /// Register a raw identity record for `token_id`, allocating fresh key
    /// handles and a toy RSA key pair so encrypt/decrypt and sign/verify
    /// round-trip against it. Returns the record actually stored (with
    /// handles filled in) for test convenience.
    pub fn add_identity_record(&self, token_id: &TokenId, mut record: RawIdentityRecord) -> RawIdentityRecord {
        if record.certificate_handle == 0 {
            record.certificate_handle = self.alloc_handle();
        }
        if record.private_key_handle == 0 {
            record.private_key_handle = self.alloc_handle();
        }
        if record.public_key_handle == 0 {
            record.public_key_handle = self.alloc_handle();
        }
        let key = ToyRsaKey::demo(256);
        self.keys.lock().insert(record.private_key_handle, key);
        self.keys.lock().insert(record.public_key_handle, key);
        self.identities
            .lock()
            .entry(*token_id)
            .or_default()
            .push(record.clone());
        record
    }

    pub fn set_pin(&self, ctx: AuthContextId, pin: Option<Vec<u8>>) {
        self.pins.lock().insert(ctx, pin);
    }

    pub fn push_cert(&self, cert: CertRecord) {
        self.certs.lock().push(cert);
    }

    pub fn set_preference(&self, key: &str, values: Vec<String>) {
        self.prefs.lock().insert(key.to_string(), values);
    }

    pub fn push_event(&self, event: TokenEvent) {
        self.events.lock().push_back(event);
    }
}

impl IdentityProvider for MockHost {
    fn identities_for_token(&self, token_id: &TokenId) -> Result<Vec<RawIdentityRecord>, BridgeError> {
        Ok(self.identities.lock().get(token_id).cloned().unwrap_or_default())
    }
}

impl LocalAuth for MockHost {
    fn authenticate(
        &self,
        ctx: &AuthContextId,
        pin: Option<&[u8]>,
        _usage: AuthUsage,
    ) -> Result<(), BridgeError> {
        match pin {
            None => {
                self.authenticated.lock().insert(*ctx);
                Ok(())
            }
            Some(supplied) => {
                let expected = self.pins.lock().get(ctx).cloned().flatten();
                match expected {
                    Some(expected) if expected == supplied => {
                        self.authenticated.lock().insert(*ctx);
                        Ok(())
                    }
                    Some(_) => Err(BridgeError::PinIncorrect),
                    None => {
                        self.authenticated.lock().insert(*ctx);
                        Ok(())
                    }
                }
            }
        }
    }

    fn release(&self, ctx: &AuthContextId) {
        self.authenticated.lock().remove(ctx);
    }
}

impl super::CertificateStore for MockHost {
    fn trusted_certificates(&self) -> Vec<CertRecord> {
        self.certs.lock().clone()
    }
}

impl Preferences for MockHost {
    fn string_list(&self, key: &str) -> Option<Vec<String>> {
        self.prefs.lock().get(key).cloned()
    }
}

impl TokenWatcher for MockHost {
    fn poll(&self) -> Option<TokenEvent> {
        self.events.lock().pop_front()
    }
}

impl CryptoPrimitives for MockHost {
    fn digest(&self, alg: HashAlg, data: &[u8]) -> Vec<u8> {
        digest_bytes(alg, data)
    }

    fn rsa_pkcs1_encrypt(&self, public_key: u64, plaintext: &[u8]) -> Result<Vec<u8>, BridgeError> {
        let key = self.keys.lock().get(&public_key).copied().ok_or(BridgeError::KeyHandleInvalid)?;
        Ok(key.encrypt_bytes(plaintext))
    }

    fn rsa_pkcs1_decrypt(&self, private_key: u64, ciphertext: &[u8]) -> Result<Vec<u8>, BridgeError> {
        let key = self.keys.lock().get(&private_key).copied().ok_or(BridgeError::KeyHandleInvalid)?;
        key.decrypt_bytes(ciphertext)
    }

    fn rsa_oaep_encrypt(
        &self,
        public_key: u64,
        plaintext: &[u8],
        _hash: HashAlg,
        _mgf_hash: HashAlg,
    ) -> Result<Vec<u8>, BridgeError> {
        self.rsa_pkcs1_encrypt(public_key, plaintext)
    }

    fn rsa_oaep_decrypt(
        &self,
        private_key: u64,
        ciphertext: &[u8],
        _hash: HashAlg,
        _mgf_hash: HashAlg,
    ) -> Result<Vec<u8>, BridgeError> {
        self.rsa_pkcs1_decrypt(private_key, ciphertext)
    }

    /// Left-pads the chunked transform to `reported_modulus_bytes` so
    /// output-size probing sees a signature length matching the key size,
    /// as real RSA signing always produces exactly one modulus-length
    /// block regardless of digest size.
    fn rsa_pkcs1_sign_digest(
        &self,
        private_key: u64,
        _hash: HashAlg,
        digest: &[u8],
    ) -> Result<Vec<u8>, BridgeError> {
        let key = self.keys.lock().get(&private_key).copied().ok_or(BridgeError::KeyHandleInvalid)?;
        let raw = key.transform_blocks(digest, key.d);
        if raw.len() > key.reported_modulus_bytes {
            return Err(BridgeError::DataLenRange);
        }
        let mut signature = vec![0u8; key.reported_modulus_bytes - raw.len()];
        signature.extend_from_slice(&raw);
        Ok(signature)
    }

    fn rsa_pkcs1_verify_digest(
        &self,
        public_key: u64,
        _hash: HashAlg,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError> {
        let key = self.keys.lock().get(&public_key).copied().ok_or(BridgeError::KeyHandleInvalid)?;
        if signature.len() != key.reported_modulus_bytes {
            return Err(BridgeError::SignatureInvalid);
        }
        let raw_len = digest.len().div_ceil(BLOCK_BYTES) * CHUNK_BYTES;
        if raw_len == 0 || raw_len > signature.len() {
            return Err(BridgeError::SignatureInvalid);
        }
        let raw = &signature[signature.len() - raw_len..];
        if signature[..signature.len() - raw_len].iter().any(|&b| b != 0) {
            return Err(BridgeError::SignatureInvalid);
        }
        let mut recovered = Vec::with_capacity(raw_len / CHUNK_BYTES * BLOCK_BYTES);
        for chunk in raw.chunks(CHUNK_BYTES) {
            let value = u64::from_be_bytes(chunk.try_into().unwrap());
            let block = modexp(value, key.e, key.n).to_be_bytes();
            recovered.extend_from_slice(&block[CHUNK_BYTES - BLOCK_BYTES..]);
        }
        recovered.truncate(digest.len());
        if recovered == digest {
            Ok(())
        } else {
            Err(BridgeError::SignatureInvalid)
        }
    }

    fn rsa_pkcs1_sign(
        &self,
        private_key: u64,
        hash: HashAlg,
        data: &[u8],
    ) -> Result<Vec<u8>, BridgeError> {
        let digest = self.digest(hash, data);
        self.rsa_pkcs1_sign_digest(private_key, hash, &digest)
    }

    fn rsa_pkcs1_verify(
        &self,
        public_key: u64,
        hash: HashAlg,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError> {
        let digest = self.digest(hash, data);
        self.rsa_pkcs1_verify_digest(public_key, hash, &digest, signature)
    }

    fn rsa_pss_sign_digest(
        &self,
        private_key: u64,
        hash: HashAlg,
        _mgf_hash: HashAlg,
        _salt_len: usize,
        digest: &[u8],
    ) -> Result<Vec<u8>, BridgeError> {
        self.rsa_pkcs1_sign_digest(private_key, hash, digest)
    }

    fn rsa_pss_verify_digest(
        &self,
        public_key: u64,
        hash: HashAlg,
        _mgf_hash: HashAlg,
        _salt_len: usize,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError> {
        self.rsa_pkcs1_verify_digest(public_key, hash, digest, signature)
    }

    fn rsa_modulus_len(&self, key_handle: u64) -> Option<usize> {
        self.keys.lock().get(&key_handle).map(|k| k.reported_modulus_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toy_rsa_round_trips_arbitrary_length_plaintext() {
        let key = ToyRsaKey::demo(256);
        for msg in ["", "a", "hello world", "this message is a fair bit longer than one block"] {
            let ct = key.encrypt_bytes(msg.as_bytes());
            let pt = key.decrypt_bytes(&ct).unwrap();
            assert_eq!(pt, msg.as_bytes());
        }
    }

    #[test]
    fn sign_verify_round_trips_and_detects_tamper() {
        let host = MockHost::new();
        let token_id = TokenId(1);
        let record = host.add_identity_record(
            &token_id,
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
                modulus: vec![],
                public_exponent: vec![],
                private_key_label: "x".into(),
            },
        );

        let sig = host
            .rsa_pkcs1_sign(record.private_key_handle, HashAlg::Sha256, b"hello world")
            .unwrap();
        host.rsa_pkcs1_verify(record.public_key_handle, HashAlg::Sha256, b"hello world", &sig)
            .unwrap();

        let mut tampered = sig.clone();
        tampered[0] ^= 0xFF;
        assert!(host
            .rsa_pkcs1_verify(record.public_key_handle, HashAlg::Sha256, b"hello world", &tampered)
            .is_err());
    }
}
