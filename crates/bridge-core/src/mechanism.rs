//! Mechanism Registry and Mechanism/Parameter Validator.
//!
//! The registry (min/max key length, usage flags) and the OAEP/PSS
//! parameter->algorithm rows are treated as data rather than hard-coded
//! match arms, following the same constant-table-plus-lookup style used
//! for mutex attribute validation elsewhere in this workspace's lineage.
//! The tables below are a representative static set.

use crate::constants::*;
use crate::error::BridgeError;
use crate::host::HashAlg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MechanismInfo {
    pub mechanism: u64,
    pub min_key_bits: u64,
    pub max_key_bits: u64,
    pub flags: u64,
}

/// Static mechanism registry. Real deployments would load this (and the
/// parameter maps below) from the host crypto framework's capability
/// list rather than a compiled-in table.
pub const MECHANISMS: &[MechanismInfo] = &[
    MechanismInfo {
        mechanism: CKM_RSA_PKCS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_ENCRYPT | CKF_DECRYPT,
    },
    MechanismInfo {
        mechanism: CKM_RSA_PKCS_OAEP,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_ENCRYPT | CKF_DECRYPT,
    },
    MechanismInfo {
        mechanism: CKM_RSA_PKCS_PSS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_SIGN | CKF_VERIFY,
    },
    MechanismInfo {
        mechanism: CKM_SHA1_RSA_PKCS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_SIGN | CKF_VERIFY,
    },
    MechanismInfo {
        mechanism: CKM_SHA256_RSA_PKCS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_SIGN | CKF_VERIFY,
    },
    MechanismInfo {
        mechanism: CKM_SHA384_RSA_PKCS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_SIGN | CKF_VERIFY,
    },
    MechanismInfo {
        mechanism: CKM_SHA512_RSA_PKCS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_SIGN | CKF_VERIFY,
    },
    MechanismInfo {
        mechanism: CKM_SHA256_RSA_PKCS_PSS,
        min_key_bits: 1024,
        max_key_bits: 4096,
        flags: CKF_SIGN | CKF_VERIFY,
    },
];

#[must_use]
pub fn mechanism_info(mechanism: u64) -> Option<MechanismInfo> {
    MECHANISMS.iter().copied().find(|m| m.mechanism == mechanism)
}

#[must_use]
pub fn list_mechanisms() -> Vec<u64> {
    MECHANISMS.iter().map(|m| m.mechanism).collect()
}

/// Which Cryptoki entry point is resolving a mechanism, so that
/// single-shot-only mechanisms (plain RSA PKCS #1 encrypt/decrypt) can be
/// rejected for sign/verify and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
}

/// Everything the operation state machine needs once a
/// mechanism + optional parameters have been validated: the single-shot
/// host algorithm, the digest-taking variant (multi-part sign/verify), and
/// the hash identifier driving the running digest.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAlgorithm {
    pub mechanism: u64,
    pub hash: Option<HashAlg>,
    pub mgf_hash: Option<HashAlg>,
    /// PSS salt length in bytes, when applicable.
    pub salt_len: Option<usize>,
    /// Mechanism reports a fixed ("blocksize-out") output size so output
    /// probing can answer without invoking the host.
    pub blocksize_out: bool,
}

fn hash_alg_from_mechanism(mechanism: u64) -> Option<HashAlg> {
    match mechanism {
        CKM_SHA1_RSA_PKCS => Some(HashAlg::Sha1),
        CKM_SHA256_RSA_PKCS | CKM_SHA256_RSA_PKCS_PSS => Some(HashAlg::Sha256),
        CKM_SHA384_RSA_PKCS => Some(HashAlg::Sha384),
        CKM_SHA512_RSA_PKCS => Some(HashAlg::Sha512),
        _ => None,
    }
}

fn hash_alg_from_ckm(ckm_hash: u64) -> Option<HashAlg> {
    match ckm_hash {
        CKM_SHA1 => Some(HashAlg::Sha1),
        CKM_SHA256 => Some(HashAlg::Sha256),
        CKM_SHA384 => Some(HashAlg::Sha384),
        CKM_SHA512 => Some(HashAlg::Sha512),
        _ => None,
    }
}

fn mgf_to_hash(mgf: u64) -> Option<HashAlg> {
    match mgf {
        CKG_MGF1_SHA1 => Some(HashAlg::Sha1),
        CKG_MGF1_SHA256 => Some(HashAlg::Sha256),
        CKG_MGF1_SHA384 => Some(HashAlg::Sha384),
        CKG_MGF1_SHA512 => Some(HashAlg::Sha512),
        _ => None,
    }
}

/// Caller-supplied OAEP parameter block (`CK_RSA_PKCS_OAEP_PARAMS`).
#[derive(Debug, Clone, Copy)]
pub struct OaepParams {
    pub hash_alg: u64,
    pub mgf: u64,
    pub source: u64,
    pub source_data_present: bool,
}

/// Caller-supplied PSS parameter block (`CK_RSA_PKCS_PSS_PARAMS`).
#[derive(Debug, Clone, Copy)]
pub struct PssParams {
    pub hash_alg: u64,
    pub mgf: u64,
    pub salt_len: u64,
}

/// Caller-supplied mechanism parameter, already decoded from the raw
/// `CK_MECHANISM::pParameter` buffer by the ABI boundary. `None` means no
/// parameter was supplied.
#[derive(Debug, Clone, Copy)]
pub enum MechanismParams {
    None,
    Oaep(OaepParams),
    Pss(PssParams),
}

/// Fixed parameter->algorithm rows for OAEP matches the request").
const OAEP_ROWS: &[(u64, u64)] = &[
    (CKG_MGF1_SHA1, CKM_SHA1),
    (CKG_MGF1_SHA256, CKM_SHA256),
    (CKG_MGF1_SHA384, CKM_SHA384),
    (CKG_MGF1_SHA512, CKM_SHA512),
];

/// Fixed parameter->algorithm rows for PSS.
const PSS_ROWS: &[(u64, u64, u64)] = &[
    (CKG_MGF1_SHA1, CKM_SHA1, 20),
    (CKG_MGF1_SHA256, CKM_SHA256, 32),
    (CKG_MGF1_SHA384, CKM_SHA384, 48),
    (CKG_MGF1_SHA512, CKM_SHA512, 64),
];

fn validate_oaep(mechanism: u64, params: &OaepParams) -> Result<ResolvedAlgorithm, BridgeError> {
    if params.source != 0 && !(params.source == CKZ_DATA_SPECIFIED && !params.source_data_present) {
        return Err(BridgeError::MechanismParamInvalid);
    }
    let hash = hash_alg_from_ckm(params.hash_alg).ok_or(BridgeError::MechanismParamInvalid)?;
    let row = OAEP_ROWS
        .iter()
        .find(|(mgf, hash_ckm)| *mgf == params.mgf && *hash_ckm == params.hash_alg)
        .ok_or(BridgeError::MechanismParamInvalid)?;
    let mgf_hash = mgf_to_hash(row.0).ok_or(BridgeError::MechanismParamInvalid)?;
    Ok(ResolvedAlgorithm {
        mechanism,
        hash: Some(hash),
        mgf_hash: Some(mgf_hash),
        salt_len: None,
        blocksize_out: true,
    })
}

fn validate_pss(mechanism: u64, params: &PssParams) -> Result<ResolvedAlgorithm, BridgeError> {
    let hash = hash_alg_from_ckm(params.hash_alg).ok_or(BridgeError::MechanismParamInvalid)?;
    let row = PSS_ROWS
        .iter()
        .find(|(mgf, hash_ckm, salt_len)| {
            *mgf == params.mgf && *hash_ckm == params.hash_alg && *salt_len == params.salt_len
        })
        .ok_or(BridgeError::MechanismParamInvalid)?;
    let mgf_hash = mgf_to_hash(row.0).ok_or(BridgeError::MechanismParamInvalid)?;
    Ok(ResolvedAlgorithm {
        mechanism,
        hash: Some(hash),
        mgf_hash: Some(mgf_hash),
        salt_len: Some(row.2 as usize),
        blocksize_out: true,
    })
}

/// Resolve a mechanism + optional parameters for `kind` into the algorithm
/// identifiers the operation state machine dispatches to.
pub fn resolve(
    mechanism: u64,
    kind: OperationKind,
    params: &MechanismParams,
) -> Result<ResolvedAlgorithm, BridgeError> {
    let info = mechanism_info(mechanism).ok_or(BridgeError::MechanismInvalid)?;
    let required_flag = match kind {
        OperationKind::Encrypt => CKF_ENCRYPT,
        OperationKind::Decrypt => CKF_DECRYPT,
        OperationKind::Sign => CKF_SIGN,
        OperationKind::Verify => CKF_VERIFY,
    };
    if info.flags & required_flag == 0 {
        return Err(BridgeError::MechanismInvalid);
    }

    match (mechanism, params) {
        (CKM_RSA_PKCS_OAEP, MechanismParams::Oaep(p)) => validate_oaep(mechanism, p),
        (CKM_RSA_PKCS_OAEP, _) => Err(BridgeError::MechanismParamInvalid),
        (CKM_RSA_PKCS_PSS | CKM_SHA256_RSA_PKCS_PSS, MechanismParams::Pss(p)) => {
            validate_pss(mechanism, p)
        }
        (CKM_RSA_PKCS_PSS | CKM_SHA256_RSA_PKCS_PSS, _) => Err(BridgeError::MechanismParamInvalid),
        (CKM_RSA_PKCS, MechanismParams::None) => Ok(ResolvedAlgorithm {
            mechanism,
            hash: None,
            mgf_hash: None,
            salt_len: None,
            blocksize_out: true,
        }),
        (_, MechanismParams::None) => Ok(ResolvedAlgorithm {
            mechanism,
            hash: hash_alg_from_mechanism(mechanism),
            mgf_hash: None,
            salt_len: None,
            blocksize_out: true,
        }),
        _ => Err(BridgeError::MechanismParamInvalid),
    }
}

/// Whether `mechanism` has a digest-taking multi-part variant").
#[must_use]
pub fn supports_multipart(mechanism: u64) -> bool {
    matches!(
        mechanism,
        CKM_SHA1_RSA_PKCS
            | CKM_SHA256_RSA_PKCS
            | CKM_SHA384_RSA_PKCS
            | CKM_SHA512_RSA_PKCS
            | CKM_SHA256_RSA_PKCS_PSS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rsa_pkcs_resolves_for_encrypt() {
        let resolved = resolve(CKM_RSA_PKCS, OperationKind::Encrypt, &MechanismParams::None).unwrap();
        assert_eq!(resolved.mechanism, CKM_RSA_PKCS);
    }

    #[test]
    fn plain_rsa_pkcs_rejected_for_sign() {
        assert_eq!(
            resolve(CKM_RSA_PKCS, OperationKind::Sign, &MechanismParams::None).unwrap_err(),
            BridgeError::MechanismInvalid
        );
    }

    #[test]
    fn oaep_mismatched_hash_and_mgf_is_param_invalid() {
        let params = OaepParams {
            hash_alg: CKM_SHA512,
            mgf: CKG_MGF1_SHA256,
            source: 0,
            source_data_present: false,
        };
        let err = resolve(
            CKM_RSA_PKCS_OAEP,
            OperationKind::Encrypt,
            &MechanismParams::Oaep(params),
        )
        .unwrap_err();
        assert_eq!(err, BridgeError::MechanismParamInvalid);
    }

    #[test]
    fn oaep_matched_row_resolves() {
        let params = OaepParams {
            hash_alg: CKM_SHA256,
            mgf: CKG_MGF1_SHA256,
            source: CKZ_DATA_SPECIFIED,
            source_data_present: false,
        };
        let resolved = resolve(
            CKM_RSA_PKCS_OAEP,
            OperationKind::Encrypt,
            &MechanismParams::Oaep(params),
        )
        .unwrap();
        assert_eq!(resolved.hash, Some(HashAlg::Sha256));
    }

    #[test]
    fn pss_requires_exact_salt_length_row() {
        let params = PssParams {
            hash_alg: CKM_SHA256,
            mgf: CKG_MGF1_SHA256,
            salt_len: 16,
        };
        let err = resolve(
            CKM_SHA256_RSA_PKCS_PSS,
            OperationKind::Sign,
            &MechanismParams::Pss(params),
        )
        .unwrap_err();
        assert_eq!(err, BridgeError::MechanismParamInvalid);
    }

    #[test]
    fn sign_mechanism_supports_multipart() {
        assert!(supports_multipart(CKM_SHA256_RSA_PKCS));
        assert!(!supports_multipart(CKM_RSA_PKCS));
    }
}
