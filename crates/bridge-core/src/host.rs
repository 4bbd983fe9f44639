//! Host collaborator traits.
//!
//! The token-insertion/removal notification source, the host identity/key
//! query interface, the local-authentication subsystem, the message-digest
//! primitive, certificate-parsing helpers, and user-preference lookup all
//! live outside this crate. They are modeled here as traits so the engine
//! compiles and is testable without a real platform identity store; an
//! embedding application supplies real implementations (e.g. backed by a
//! platform keychain/PKCS#11-under-PKCS#11 bridge, CryptoTokenKit, or
//! similar).

use crate::error::BridgeError;

/// Opaque, host-assigned token identifier; equality on this value is how
/// the insertion/removal handlers match a notification to
/// a slot's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub u64);

/// Opaque handle binding a credential context to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthContextId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthUsage {
    Sign,
    Decrypt,
}

/// One identity record as returned by the host identity/key query
/// interface, carrying every attribute the object builder needs.
#[derive(Debug, Clone)]
pub struct RawIdentityRecord {
    pub certificate_handle: u64,
    pub private_key_handle: u64,
    pub public_key_handle: u64,
    pub public_key_hash: Vec<u8>,
    pub host_key_type: u32,
    pub access_control: AuthContextId,
    pub label: String,
    pub priv_can_sign: bool,
    pub priv_can_decrypt: bool,
    pub pub_can_verify: bool,
    pub pub_can_encrypt: bool,
    pub pub_can_wrap: bool,
    pub certificate_der: Vec<u8>,
    pub subject: Vec<u8>,
    pub issuer: Vec<u8>,
    pub serial_number: Vec<u8>,
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
    pub private_key_label: String,
}

/// The host identity/key query interface.
pub trait IdentityProvider: Send + Sync {
    fn identities_for_token(&self, token_id: &TokenId) -> Result<Vec<RawIdentityRecord>, BridgeError>;
}

/// The local-authentication subsystem: binds a credential context to an
/// identity and accepts a PIN.
pub trait LocalAuth: Send + Sync {
    fn authenticate(
        &self,
        ctx: &AuthContextId,
        pin: Option<&[u8]>,
        usage: AuthUsage,
    ) -> Result<(), BridgeError>;

    /// Release a context previously bound by `authenticate`.
    fn release(&self, ctx: &AuthContextId);
}

/// One platform-trusted certificate record as returned by the
/// certificate-parsing helpers / host trust store.
#[derive(Debug, Clone)]
pub struct CertRecord {
    pub der: Vec<u8>,
    pub subject_common_name: String,
    pub subject: Vec<u8>,
    pub issuer: Vec<u8>,
    pub serial_number: Vec<u8>,
    pub is_ca: bool,
    /// True if this certificate lives on a hardware token rather than the
    /// platform trust store (excluded from transitive chain expansion).
    pub on_hardware_token: bool,
}

/// Retrieve all trusted certificates.
pub trait CertificateStore: Send + Sync {
    fn trusted_certificates(&self) -> Vec<CertRecord>;
}

/// User-preference lookup.
pub trait Preferences: Send + Sync {
    fn string_list(&self, key: &str) -> Option<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEvent {
    Added(TokenId),
    Removed(TokenId),
}

/// The token-insertion/removal notification source.
///
/// Modeled as pull-style (`poll`) rather than push/callback so `bridge-core`
/// stays free of a background-thread dependency of its own; an embedding
/// application pumps this on a thread or async task and feeds the result
/// into `Runtime::handle_token_event`.
pub trait TokenWatcher: Send + Sync {
    fn poll(&self) -> Option<TokenEvent>;
}

/// Digest algorithm identifiers the mechanism/parameter validator resolves mechanisms to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

/// The message-digest primitive plus the handful of host crypto
/// primitives the mechanism validator dispatches into (encrypt, decrypt,
/// single-shot sign, digest-taking sign, and their verify counterparts).
pub trait CryptoPrimitives: Send + Sync {
    fn digest(&self, alg: HashAlg, data: &[u8]) -> Vec<u8>;

    /// One-shot RSA PKCS#1 v1.5 encrypt under the identity's public key.
    fn rsa_pkcs1_encrypt(&self, public_key: u64, plaintext: &[u8]) -> Result<Vec<u8>, BridgeError>;
    fn rsa_pkcs1_decrypt(&self, private_key: u64, ciphertext: &[u8]) -> Result<Vec<u8>, BridgeError>;
    fn rsa_oaep_encrypt(
        &self,
        public_key: u64,
        plaintext: &[u8],
        hash: HashAlg,
        mgf_hash: HashAlg,
    ) -> Result<Vec<u8>, BridgeError>;
    fn rsa_oaep_decrypt(
        &self,
        private_key: u64,
        ciphertext: &[u8],
        hash: HashAlg,
        mgf_hash: HashAlg,
    ) -> Result<Vec<u8>, BridgeError>;

    /// Sign a pre-computed digest using RSA PKCS#1 v1.5; the variant
    /// multi-part sign/verify resolves to.
    fn rsa_pkcs1_sign_digest(
        &self,
        private_key: u64,
        hash: HashAlg,
        digest: &[u8],
    ) -> Result<Vec<u8>, BridgeError>;
    fn rsa_pkcs1_verify_digest(
        &self,
        public_key: u64,
        hash: HashAlg,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError>;

    /// Single-shot RSA PKCS#1 v1.5 sign/verify over raw data (hashes
    /// internally), used for `C_Sign`/`C_Verify` without a preceding
    /// `*_Update`.
    fn rsa_pkcs1_sign(
        &self,
        private_key: u64,
        hash: HashAlg,
        data: &[u8],
    ) -> Result<Vec<u8>, BridgeError>;
    fn rsa_pkcs1_verify(
        &self,
        public_key: u64,
        hash: HashAlg,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError>;

    fn rsa_pss_sign_digest(
        &self,
        private_key: u64,
        hash: HashAlg,
        mgf_hash: HashAlg,
        salt_len: usize,
        digest: &[u8],
    ) -> Result<Vec<u8>, BridgeError>;
    fn rsa_pss_verify_digest(
        &self,
        public_key: u64,
        hash: HashAlg,
        mgf_hash: HashAlg,
        salt_len: usize,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), BridgeError>;

    /// Modulus length in bytes for a key, used for output-size probing.
    fn rsa_modulus_len(&self, key_handle: u64) -> Option<usize>;
}

pub mod mock;
