//! Cryptoki v2.40 numeric constants used by the engine.
//!
//! Values match the PKCS #11 base specification so that a `bridge-abi`
//! caller sees the standard numbers. Only the subset referenced by the
//! components this crate implements is declared; the rest of the v2.40
//! constant space belongs to features this bridge reports as
//! unsupported.

/// Reserved slot index for the pseudo-token exposing curated platform
/// certificates.
pub const CERTIFICATE_SLOT_ID: u64 = 254;

// ---------------------------------------------------------------------------
// CKR_* return codes
// ---------------------------------------------------------------------------

pub const CKR_OK: u64 = 0x0000_0000;
pub const CKR_SLOT_ID_INVALID: u64 = 0x0000_0003;
pub const CKR_GENERAL_ERROR: u64 = 0x0000_0005;
pub const CKR_FUNCTION_FAILED: u64 = 0x0000_0006;
pub const CKR_ARGUMENTS_BAD: u64 = 0x0000_0007;
pub const CKR_ATTRIBUTE_TYPE_INVALID: u64 = 0x0000_0012;
pub const CKR_DATA_LEN_RANGE: u64 = 0x0000_0021;
pub const CKR_DEVICE_REMOVED: u64 = 0x0000_0032;
pub const CKR_FUNCTION_NOT_SUPPORTED: u64 = 0x0000_0054;
pub const CKR_KEY_HANDLE_INVALID: u64 = 0x0000_0060;
pub const CKR_KEY_TYPE_INCONSISTENT: u64 = 0x0000_0063;
pub const CKR_KEY_FUNCTION_NOT_PERMITTED: u64 = 0x0000_0068;
pub const CKR_MECHANISM_INVALID: u64 = 0x0000_0070;
pub const CKR_MECHANISM_PARAM_INVALID: u64 = 0x0000_0071;
pub const CKR_NO_EVENT: u64 = 0x0000_0008;
pub const CKR_OBJECT_HANDLE_INVALID: u64 = 0x0000_0082;
pub const CKR_OPERATION_ACTIVE: u64 = 0x0000_0090;
pub const CKR_OPERATION_NOT_INITIALIZED: u64 = 0x0000_0091;
pub const CKR_PIN_INCORRECT: u64 = 0x0000_00A0;
pub const CKR_SESSION_HANDLE_INVALID: u64 = 0x0000_00B3;
pub const CKR_SESSION_PARALLEL_NOT_SUPPORTED: u64 = 0x0000_00B4;
pub const CKR_SIGNATURE_INVALID: u64 = 0x0000_00C0;
pub const CKR_TOKEN_NOT_PRESENT: u64 = 0x0000_00E0;
pub const CKR_USER_NOT_LOGGED_IN: u64 = 0x0000_0101;
pub const CKR_BUFFER_TOO_SMALL: u64 = 0x0000_0150;
pub const CKR_CRYPTOKI_NOT_INITIALIZED: u64 = 0x0000_0190;
pub const CKR_CRYPTOKI_ALREADY_INITIALIZED: u64 = 0x0000_0191;

// ---------------------------------------------------------------------------
// CKO_* object classes
// ---------------------------------------------------------------------------

pub const CKO_CERTIFICATE: u64 = 0x0000_0001;
pub const CKO_PUBLIC_KEY: u64 = 0x0000_0002;
pub const CKO_PRIVATE_KEY: u64 = 0x0000_0003;
/// Not a standard PKCS #11 class; matches NSS's trust-object convention
/// for the certificate-slot "is this a trust anchor" records.
pub const CKO_NSS_TRUST: u64 = 0xCE53_4351;

// ---------------------------------------------------------------------------
// CKA_* attribute types (only those this bridge sets or queries)
// ---------------------------------------------------------------------------

pub const CKA_CLASS: u64 = 0x0000_0000;
pub const CKA_TOKEN: u64 = 0x0000_0001;
pub const CKA_PRIVATE: u64 = 0x0000_0002;
pub const CKA_LABEL: u64 = 0x0000_0003;
pub const CKA_VALUE: u64 = 0x0000_0011;
pub const CKA_CERTIFICATE_TYPE: u64 = 0x0000_0080;
pub const CKA_ISSUER: u64 = 0x0000_0081;
pub const CKA_SERIAL_NUMBER: u64 = 0x0000_0082;
pub const CKA_SUBJECT: u64 = 0x0000_0101;
pub const CKA_ID: u64 = 0x0000_0102;
pub const CKA_SENSITIVE: u64 = 0x0000_0103;
pub const CKA_ENCRYPT: u64 = 0x0000_0104;
pub const CKA_DECRYPT: u64 = 0x0000_0105;
pub const CKA_WRAP: u64 = 0x0000_0106;
pub const CKA_UNWRAP: u64 = 0x0000_0107;
pub const CKA_SIGN: u64 = 0x0000_0108;
pub const CKA_VERIFY: u64 = 0x0000_010A;
pub const CKA_KEY_TYPE: u64 = 0x0000_0100;
pub const CKA_MODULUS: u64 = 0x0000_0120;
pub const CKA_MODULUS_BITS: u64 = 0x0000_0121;
pub const CKA_PUBLIC_EXPONENT: u64 = 0x0000_0122;
pub const CKA_EXTRACTABLE: u64 = 0x0000_0162;
pub const CKA_LOCAL: u64 = 0x0000_0163;
pub const CKA_NEVER_EXTRACTABLE: u64 = 0x0000_0164;
pub const CKA_ALWAYS_SENSITIVE: u64 = 0x0000_0165;
pub const CKA_DERIVE: u64 = 0x0000_010C;
pub const CKA_ALWAYS_AUTHENTICATE: u64 = 0x0000_0202;
/// NSS trust attributes, used only on `CKO_NSS_TRUST` objects.
pub const CKA_TRUST_SERVER_AUTH: u64 = 0xCE53_4354;
pub const CKA_TRUST_CLIENT_AUTH: u64 = 0xCE53_4355;
pub const CKA_TRUST_EMAIL_PROTECTION: u64 = 0xCE53_4356;
pub const CKA_TRUST_CODE_SIGNING: u64 = 0xCE53_4357;
pub const CKA_CERT_SHA1_HASH: u64 = 0xCE53_4358;
pub const CKATTR_TRUSTED_DELEGATOR: u64 = 6;

/// Sentinel returned in `CK_ATTRIBUTE::ulValueLen` when the attribute type
/// is not present on the object.
pub const CK_UNAVAILABLE_INFORMATION: u64 = u64::MAX;

// ---------------------------------------------------------------------------
// CKK_* key types
// ---------------------------------------------------------------------------

pub const CKK_RSA: u64 = 0x0000_0000;
pub const CKK_EC: u64 = 0x0000_0003;
pub const CKK_VENDOR_DEFINED: u64 = 0x8000_0000;

// ---------------------------------------------------------------------------
// CKC_* certificate types
// ---------------------------------------------------------------------------

pub const CKC_X_509: u64 = 0x0000_0000;

// ---------------------------------------------------------------------------
// CKU_* user types
// ---------------------------------------------------------------------------

pub const CKU_SO: u64 = 0;
pub const CKU_USER: u64 = 1;

// ---------------------------------------------------------------------------
// Session flags
// ---------------------------------------------------------------------------

pub const CKF_SERIAL_SESSION: u64 = 0x0000_0004;
pub const CKF_RW_SESSION: u64 = 0x0000_0002;

// ---------------------------------------------------------------------------
// CKM_* mechanism types relevant to this bridge
// ---------------------------------------------------------------------------

pub const CKM_RSA_PKCS: u64 = 0x0000_0001;
pub const CKM_RSA_PKCS_OAEP: u64 = 0x0000_0009;
pub const CKM_RSA_PKCS_PSS: u64 = 0x0000_000D;
pub const CKM_SHA1_RSA_PKCS: u64 = 0x0000_0006;
pub const CKM_SHA256_RSA_PKCS: u64 = 0x0000_0040;
pub const CKM_SHA384_RSA_PKCS: u64 = 0x0000_0041;
pub const CKM_SHA512_RSA_PKCS: u64 = 0x0000_0042;
pub const CKM_SHA256_RSA_PKCS_PSS: u64 = 0x0000_0043;
pub const CKM_SHA1: u64 = 0x0000_0220;
pub const CKM_SHA256: u64 = 0x0000_0250;
pub const CKM_SHA384: u64 = 0x0000_0260;
pub const CKM_SHA512: u64 = 0x0000_0270;

// ---------------------------------------------------------------------------
// CKG_* mask generation functions / CKZ_* source types
// ---------------------------------------------------------------------------

pub const CKG_MGF1_SHA1: u64 = 0x0000_0001;
pub const CKG_MGF1_SHA256: u64 = 0x0000_0002;
pub const CKG_MGF1_SHA384: u64 = 0x0000_0003;
pub const CKG_MGF1_SHA512: u64 = 0x0000_0004;
pub const CKZ_DATA_SPECIFIED: u64 = 0x0000_0001;

// ---------------------------------------------------------------------------
// CKF_* mechanism usage flags
// ---------------------------------------------------------------------------

pub const CKF_ENCRYPT: u64 = 1 << 8;
pub const CKF_DECRYPT: u64 = 1 << 9;
pub const CKF_SIGN: u64 = 1 << 10;
pub const CKF_VERIFY: u64 = 1 << 11;
