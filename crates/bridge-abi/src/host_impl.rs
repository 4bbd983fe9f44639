//! Default software host.
//!
//! The session/object engine is deliberately host-agnostic: every
//! platform detail (token enumeration, identity/key lookup, local
//! authentication, the trusted-certificate store, user preferences, and
//! the RSA/digest primitives themselves) lives behind the trait objects
//! in `bridge_core::host`. An embedding that ships this library against a
//! real smartcard middleware or platform keychain replaces every piece
//! below; what's here is the software-only identity this crate is
//! complete and loadable without one, generating a single ephemeral RSA
//! identity in place of a hardware token on first enumeration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use bridge_core::error::BridgeError;
use bridge_core::host::{
    AuthContextId, AuthUsage, CertRecord, CertificateStore, CryptoPrimitives, HashAlg, IdentityProvider, LocalAuth,
    Preferences, RawIdentityRecord, TokenEvent, TokenId, TokenWatcher,
};

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

const DEMO_KEY_BITS: usize = 2048;
const DEMO_CERTIFICATE_HANDLE: u64 = 1;
const DEMO_PRIVATE_KEY_HANDLE: u64 = 2;
const DEMO_PUBLIC_KEY_HANDLE: u64 = 3;

fn env_pref(key: &str) -> Option<Vec<String>> {
    let var = format!("CRYPTOKI_BRIDGE_{}", key.to_uppercase());
    std::env::var(var).ok().map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
}

/// Software-backed implementation of every host collaborator trait.
/// Generates and keeps exactly one demo RSA identity in process memory;
/// nothing here persists across a restart.
pub struct SoftwareHost {
    keys: Mutex<HashMap<u64, RsaPrivateKey>>,
    token_announced: AtomicBool,
}

impl SoftwareHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            token_announced: AtomicBool::new(false),
        }
    }

    fn private_key(&self, handle: u64) -> Result<RsaPrivateKey, BridgeError> {
        self.keys
            .lock()
            .unwrap()
            .get(&handle)
            .cloned()
            .ok_or(BridgeError::KeyHandleInvalid)
    }

    fn public_key(&self, handle: u64) -> Result<RsaPublicKey, BridgeError> {
        self.private_key(handle).map(|key| key.to_public_key())
    }
}

impl Default for SoftwareHost {
    fn default() -> Self {
        Self::new()
    }
}

fn oaep_encrypt(public_key: &RsaPublicKey, plaintext: &[u8], hash: HashAlg) -> Result<Vec<u8>, BridgeError> {
    let mut rng = OsRng;
    let result = match hash {
        HashAlg::Sha1 => public_key.encrypt(&mut rng, Oaep::new::<Sha1>(), plaintext),
        HashAlg::Sha256 => public_key.encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext),
        HashAlg::Sha384 => public_key.encrypt(&mut rng, Oaep::new::<Sha384>(), plaintext),
        HashAlg::Sha512 => public_key.encrypt(&mut rng, Oaep::new::<Sha512>(), plaintext),
    };
    result.map_err(|_| BridgeError::FunctionFailed)
}

fn oaep_decrypt(private_key: &RsaPrivateKey, ciphertext: &[u8], hash: HashAlg) -> Result<Vec<u8>, BridgeError> {
    let result = match hash {
        HashAlg::Sha1 => private_key.decrypt(Oaep::new::<Sha1>(), ciphertext),
        HashAlg::Sha256 => private_key.decrypt(Oaep::new::<Sha256>(), ciphertext),
        HashAlg::Sha384 => private_key.decrypt(Oaep::new::<Sha384>(), ciphertext),
        HashAlg::Sha512 => private_key.decrypt(Oaep::new::<Sha512>(), ciphertext),
    };
    result.map_err(|_| BridgeError::FunctionFailed)
}

fn pkcs1_sign_digest(private_key: &RsaPrivateKey, hash: HashAlg, digest: &[u8]) -> Result<Vec<u8>, BridgeError> {
    let result = match hash {
        HashAlg::Sha1 => private_key.sign(Pkcs1v15Sign::new::<Sha1>(), digest),
        HashAlg::Sha256 => private_key.sign(Pkcs1v15Sign::new::<Sha256>(), digest),
        HashAlg::Sha384 => private_key.sign(Pkcs1v15Sign::new::<Sha384>(), digest),
        HashAlg::Sha512 => private_key.sign(Pkcs1v15Sign::new::<Sha512>(), digest),
    };
    result.map_err(|_| BridgeError::FunctionFailed)
}

fn pkcs1_verify_digest(
    public_key: &RsaPublicKey,
    hash: HashAlg,
    digest: &[u8],
    signature: &[u8],
) -> Result<(), BridgeError> {
    let result = match hash {
        HashAlg::Sha1 => public_key.verify(Pkcs1v15Sign::new::<Sha1>(), digest, signature),
        HashAlg::Sha256 => public_key.verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature),
        HashAlg::Sha384 => public_key.verify(Pkcs1v15Sign::new::<Sha384>(), digest, signature),
        HashAlg::Sha512 => public_key.verify(Pkcs1v15Sign::new::<Sha512>(), digest, signature),
    };
    result.map_err(|_| BridgeError::SignatureInvalid)
}

fn pss_sign_digest(
    private_key: &RsaPrivateKey,
    hash: HashAlg,
    salt_len: usize,
    digest: &[u8],
) -> Result<Vec<u8>, BridgeError> {
    let mut rng = OsRng;
    let result = match hash {
        HashAlg::Sha1 => private_key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha1>(salt_len), digest),
        HashAlg::Sha256 => private_key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha256>(salt_len), digest),
        HashAlg::Sha384 => private_key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha384>(salt_len), digest),
        HashAlg::Sha512 => private_key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha512>(salt_len), digest),
    };
    result.map_err(|_| BridgeError::FunctionFailed)
}

fn pss_verify_digest(
    public_key: &RsaPublicKey,
    hash: HashAlg,
    salt_len: usize,
    digest: &[u8],
    signature: &[u8],
) -> Result<(), BridgeError> {
    let result = match hash {
        HashAlg::Sha1 => public_key.verify(Pss::new_with_salt::<Sha1>(salt_len), digest, signature),
        HashAlg::Sha256 => public_key.verify(Pss::new_with_salt::<Sha256>(salt_len), digest, signature),
        HashAlg::Sha384 => public_key.verify(Pss::new_with_salt::<Sha384>(salt_len), digest, signature),
        HashAlg::Sha512 => public_key.verify(Pss::new_with_salt::<Sha512>(salt_len), digest, signature),
    };
    result.map_err(|_| BridgeError::SignatureInvalid)
}

impl CryptoPrimitives for SoftwareHost {
    fn digest(&self, alg: HashAlg, data: &[u8]) -> Vec<u8> {
        match alg {
            HashAlg::Sha1 => Sha1::digest(data).to_vec(),
            HashAlg::Sha256 => Sha256::digest(data).to_vec(),
            HashAlg::Sha384 => Sha384::digest(data).to_vec(),
            HashAlg::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn rsa_pkcs1_encrypt(&self, public_key: u64, plaintext: &[u8]) -> Result<Vec<u8>, BridgeError> {
        let key = self.public_key(public_key)?;
        key.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|_| BridgeError::FunctionFailed)
    }

    fn rsa_pkcs1_decrypt(&self, private_key: u64, ciphertext: &[u8]) -> Result<Vec<u8>, BridgeError> {
        let key = self.private_key(private_key)?;
        key.decrypt(Pkcs1v15Encrypt, ciphertext).map_err(|_| BridgeError::FunctionFailed)
    }

    fn rsa_oaep_encrypt(
        &self,
        public_key: u64,
        plaintext: &[u8],
        hash: HashAlg,
        _mgf_hash: HashAlg,
    ) -> Result<Vec<u8>, BridgeError> {
        oaep_encrypt(&self.public_key(public_key)?, plaintext, hash)
    }

    fn rsa_oaep_decrypt(
        &self,
        private_key: u64,
        ciphertext: &[u8],
        hash: HashAlg,
        _mgf_hash: HashAlg,
    ) -> Result<Vec<u8>, BridgeError> {
        oaep_decrypt(&self.private_key(private_key)?, ciphertext, hash)
    }

    fn rsa_pkcs1_sign_digest(&self, private_key: u64, hash: HashAlg, digest: &[u8]) -> Result<Vec<u8>, BridgeError> {
        pkcs1_sign_digest(&self.private_key(private_key)?, hash, digest)
    }

    fn rsa_pkcs1_verify_digest(
        &self,
        public_key: u64,
        hash: HashAlg,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError> {
        pkcs1_verify_digest(&self.public_key(public_key)?, hash, digest, signature)
    }

    fn rsa_pkcs1_sign(&self, private_key: u64, hash: HashAlg, data: &[u8]) -> Result<Vec<u8>, BridgeError> {
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
        salt_len: usize,
        digest: &[u8],
    ) -> Result<Vec<u8>, BridgeError> {
        pss_sign_digest(&self.private_key(private_key)?, hash, salt_len, digest)
    }

    fn rsa_pss_verify_digest(
        &self,
        public_key: u64,
        hash: HashAlg,
        _mgf_hash: HashAlg,
        salt_len: usize,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError> {
        pss_verify_digest(&self.public_key(public_key)?, hash, salt_len, digest, signature)
    }

    fn rsa_modulus_len(&self, key_handle: u64) -> Option<usize> {
        self.keys.lock().unwrap().get(&key_handle).map(rsa::traits::PublicKeyParts::size)
    }
}

impl TokenWatcher for SoftwareHost {
    /// A single synthetic hot-plug event the first time anyone polls;
    /// never fires again. A real watcher would block on a platform
    /// notification source (IOKit, PCSC, udev, ...) instead.
    fn poll(&self) -> Option<TokenEvent> {
        if self.token_announced.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(TokenEvent::Added(TokenId(1)))
    }
}

impl IdentityProvider for SoftwareHost {
    fn identities_for_token(&self, token_id: &TokenId) -> Result<Vec<RawIdentityRecord>, BridgeError> {
        if token_id.0 != 1 {
            return Ok(Vec::new());
        }
        let mut keys = self.keys.lock().unwrap();
        if keys.contains_key(&DEMO_PRIVATE_KEY_HANDLE) {
            return Ok(Vec::new());
        }
        let private_key = RsaPrivateKey::new(&mut OsRng, DEMO_KEY_BITS).map_err(|_| BridgeError::GeneralError)?;
        let public_key = private_key.to_public_key();
        let modulus = public_key.n().to_bytes_be();
        let public_exponent = public_key.e().to_bytes_be();
        keys.insert(DEMO_PRIVATE_KEY_HANDLE, private_key.clone());
        keys.insert(DEMO_PUBLIC_KEY_HANDLE, private_key);

        Ok(vec![RawIdentityRecord {
            certificate_handle: DEMO_CERTIFICATE_HANDLE,
            private_key_handle: DEMO_PRIVATE_KEY_HANDLE,
            public_key_handle: DEMO_PUBLIC_KEY_HANDLE,
            public_key_hash: Sha1::digest(&modulus).to_vec(),
            host_key_type: 0,
            access_control: AuthContextId(1),
            label: "Software demo identity".to_string(),
            priv_can_sign: true,
            priv_can_decrypt: true,
            pub_can_verify: true,
            pub_can_encrypt: true,
            pub_can_wrap: false,
            // Not a real X.509 DER encoding: this host generates a key pair
            // without a certificate authority, so the object builder gets
            // a placeholder blob. The engine treats `CKA_VALUE` as opaque.
            certificate_der: vec![0x30, 0x03, 0x02, 0x01, 0x00],
            subject: b"CN=Software Demo Identity".to_vec(),
            issuer: b"CN=Software Demo Identity".to_vec(),
            serial_number: vec![0x01],
            modulus,
            public_exponent,
            private_key_label: "Software demo identity (private)".to_string(),
        }])
    }
}

impl LocalAuth for SoftwareHost {
    /// No platform credential store backs this host: any non-empty PIN
    /// authenticates, matching the `CKU_USER`-only, no-token-init-or-PIN
    /// surface this bridge exposes.
    fn authenticate(&self, _ctx: &AuthContextId, pin: Option<&[u8]>, _usage: AuthUsage) -> Result<(), BridgeError> {
        match pin {
            Some(pin) if pin.is_empty() => Err(BridgeError::PinIncorrect),
            _ => Ok(()),
        }
    }

    fn release(&self, _ctx: &AuthContextId) {}
}

impl CertificateStore for SoftwareHost {
    /// No platform trust store is wired in; the certificate slot is
    /// enabled but empty until a real `CertificateStore` replaces this
    /// one.
    fn trusted_certificates(&self) -> Vec<CertRecord> {
        Vec::new()
    }
}

impl Preferences for SoftwareHost {
    fn string_list(&self, key: &str) -> Option<Vec<String>> {
        env_pref(key)
    }
}
