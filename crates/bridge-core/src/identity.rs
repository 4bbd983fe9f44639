//! Identity loader.
//!
//! An [`Identity`] is owned by exactly one [`crate::token::Token`]; it is a
//! triple of (certificate, private key, public key) plus the capability
//! flags and access-control reference the object builder and the
//! operation state machine consult.

use crate::host::{AuthContextId, IdentityProvider, RawIdentityRecord, TokenId};

/// Numeric Cryptoki key type, mapped from the host's key-type attribute
/// through a small fixed table, defaulting to
/// vendor-defined when the host reports something this bridge doesn't
/// recognize.
pub type KeyType = u64;

/// Opaque handle into the host's identity/key query interface. The
/// concrete representation is owned by the [`IdentityProvider`]
/// implementation; this crate only ever compares, clones, and stores it.
pub type OpaqueHandle = u64;

#[derive(Debug, Clone)]
pub struct Identity {
    pub certificate_handle: OpaqueHandle,
    pub private_key_handle: OpaqueHandle,
    pub public_key_handle: OpaqueHandle,
    pub public_key_hash: Vec<u8>,
    pub key_type: KeyType,
    pub access_control: AuthContextId,
    pub label: String,
    pub priv_can_sign: bool,
    pub priv_can_decrypt: bool,
    pub pub_can_verify: bool,
    pub pub_can_encrypt: bool,
    pub certificate_der: Vec<u8>,
    pub subject: Vec<u8>,
    pub issuer: Vec<u8>,
    pub serial_number: Vec<u8>,
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
    pub private_key_label: String,
}

const DEFAULT_LABEL: &str = "Hardware token";

/// Map a host-reported key-type code onto the Cryptoki key type,
/// defaulting to vendor-defined.
#[must_use]
pub fn map_key_type(host_key_type: u32) -> KeyType {
    match host_key_type {
        0 => crate::constants::CKK_RSA,
        3 => crate::constants::CKK_EC,
        _ => crate::constants::CKK_VENDOR_DEFINED,
    }
}

/// Build one [`Identity`] from a raw record the host returned. Returns
/// `None` when a mandatory attribute is missing; an error on any single
/// identity drops that identity but does not abort the rest.
#[must_use]
pub fn build_identity(record: RawIdentityRecord) -> Option<Identity> {
    if record.certificate_der.is_empty()
        || record.certificate_handle == 0
        || record.private_key_handle == 0
    {
        return None;
    }
    let pub_can_encrypt = record.pub_can_encrypt || record.pub_can_wrap;
    Some(Identity {
        certificate_handle: record.certificate_handle,
        private_key_handle: record.private_key_handle,
        public_key_handle: record.public_key_handle,
        public_key_hash: record.public_key_hash,
        key_type: map_key_type(record.host_key_type),
        access_control: record.access_control,
        label: if record.label.is_empty() {
            DEFAULT_LABEL.to_string()
        } else {
            record.label
        },
        priv_can_sign: record.priv_can_sign,
        priv_can_decrypt: record.priv_can_decrypt,
        pub_can_verify: record.pub_can_verify,
        pub_can_encrypt,
        certificate_der: record.certificate_der,
        subject: record.subject,
        issuer: record.issuer,
        serial_number: record.serial_number,
        modulus: record.modulus,
        public_exponent: record.public_exponent,
        private_key_label: record.private_key_label,
    })
}

/// Load every identity for a token.
pub fn load_identities(provider: &dyn IdentityProvider, token_id: &TokenId) -> Vec<Identity> {
    let records = match provider.identities_for_token(token_id) {
        Ok(records) => records,
        Err(err) => {
            log::warn!("identity loader: host query failed for token {token_id:?}: {err}");
            return Vec::new();
        }
    };
    records
        .into_iter()
        .filter_map(|record| {
            let label_for_log = record.label.clone();
            let built = build_identity(record);
            if built.is_none() {
                log::warn!("identity loader: dropping malformed identity record ({label_for_log})");
            }
            built
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::host::RawIdentityRecord;

    fn sample_record() -> RawIdentityRecord {
        RawIdentityRecord {
            certificate_handle: 1,
            private_key_handle: 2,
            public_key_handle: 3,
            public_key_hash: vec![0xAB],
            host_key_type: 0,
            access_control: AuthContextId(7),
            label: "Alice".into(),
            priv_can_sign: true,
            priv_can_decrypt: true,
            pub_can_verify: true,
            pub_can_encrypt: false,
            pub_can_wrap: true,
            certificate_der: vec![0x30, 0x82],
            subject: b"CN=Alice".to_vec(),
            issuer: b"CN=Root".to_vec(),
            serial_number: vec![1, 2, 3],
            modulus: vec![0xFF; 256],
            public_exponent: vec![1, 0, 1],
            private_key_label: "Alice (private)".into(),
        }
    }

    #[test]
    fn wrap_implies_encrypt() {
        let identity = build_identity(sample_record()).unwrap();
        assert!(identity.pub_can_encrypt);
    }

    #[test]
    fn missing_certificate_drops_identity() {
        let mut record = sample_record();
        record.certificate_der.clear();
        assert!(build_identity(record).is_none());
    }

    #[test]
    fn default_label_used_when_absent() {
        let mut record = sample_record();
        record.label.clear();
        let identity = build_identity(record).unwrap();
        assert_eq!(identity.label, DEFAULT_LABEL);
    }

    #[test]
    fn loader_drops_bad_records_but_keeps_good_ones() {
        let host = MockHost::new();
        let token_id = TokenId(42);
        host.add_identity_record(&token_id, sample_record());
        let mut bad = sample_record();
        bad.private_key_handle = 0;
        host.add_identity_record(&token_id, bad);

        let identities = load_identities(&host, &token_id);
        assert_eq!(identities.len(), 1);
    }
}
