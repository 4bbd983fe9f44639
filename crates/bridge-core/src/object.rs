//! Object model and object builder.

use crate::attribute::{Attribute, AttributeStore};
use crate::constants::*;
use crate::identity::Identity;
use crate::host::CertRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Certificate,
    PublicKey,
    PrivateKey,
    TrustRecord,
}

impl ObjectClass {
    #[must_use]
    pub const fn cka_class(self) -> u64 {
        match self {
            Self::Certificate => CKO_CERTIFICATE,
            Self::PublicKey => CKO_PUBLIC_KEY,
            Self::PrivateKey => CKO_PRIVATE_KEY,
            Self::TrustRecord => CKO_NSS_TRUST,
        }
    }
}

/// A single token-scoped object. `owning_identity` is the index into the
/// token's identity list; absent for certificate-slot objects built
/// directly from a scanned certificate.
#[derive(Debug, Clone)]
pub struct Object {
    pub owning_identity: Option<usize>,
    pub class: ObjectClass,
    pub attributes: AttributeStore,
}

/// Minimum-length big-endian encoding of a 0-based index, always at least
/// one byte.
#[must_use]
pub fn encode_id(index: usize) -> Vec<u8> {
    let full = (index as u64).to_be_bytes();
    let first_nonzero = full.iter().position(|&b| b != 0).unwrap_or(full.len() - 1);
    full[first_nonzero..].to_vec()
}

/// Build the certificate/public-key/private-key triple for one identity,
/// in that order, all three sharing the same `id`.
#[must_use]
pub fn build_identity_objects(identity_index: usize, identity: &Identity) -> [Object; 3] {
    let id = encode_id(identity_index);
    let modulus_bits = (identity.modulus.len() as u64) * 8;

    let certificate = Object {
        owning_identity: Some(identity_index),
        class: ObjectClass::Certificate,
        attributes: AttributeStore::new(vec![
            Attribute::u64_attr(CKA_CLASS, ObjectClass::Certificate.cka_class()),
            Attribute::bytes_attr(CKA_ID, id.clone()),
            Attribute::u64_attr(CKA_CERTIFICATE_TYPE, CKC_X_509),
            Attribute::bool_attr(CKA_TOKEN, true),
            Attribute::bytes_attr(CKA_LABEL, identity.label.clone()),
            Attribute::bytes_attr(CKA_VALUE, identity.certificate_der.clone()),
            Attribute::bytes_attr(CKA_SUBJECT, identity.subject.clone()),
            Attribute::bytes_attr(CKA_ISSUER, identity.issuer.clone()),
            Attribute::bytes_attr(CKA_SERIAL_NUMBER, identity.serial_number.clone()),
        ]),
    };

    let public_key = Object {
        owning_identity: Some(identity_index),
        class: ObjectClass::PublicKey,
        attributes: AttributeStore::new(vec![
            Attribute::u64_attr(CKA_CLASS, ObjectClass::PublicKey.cka_class()),
            Attribute::bytes_attr(CKA_ID, id.clone()),
            Attribute::u64_attr(CKA_KEY_TYPE, identity.key_type),
            Attribute::bool_attr(CKA_TOKEN, true),
            Attribute::bool_attr(CKA_LOCAL, true),
            Attribute::bool_attr(CKA_ENCRYPT, identity.pub_can_encrypt),
            Attribute::bool_attr(CKA_VERIFY, identity.pub_can_verify),
            Attribute::bytes_attr(CKA_SUBJECT, identity.subject.clone()),
            Attribute::bytes_attr(CKA_LABEL, identity.label.clone()),
            Attribute::u64_attr(CKA_MODULUS_BITS, modulus_bits),
            Attribute::bytes_attr(CKA_MODULUS, identity.modulus.clone()),
            Attribute::bytes_attr(CKA_PUBLIC_EXPONENT, identity.public_exponent.clone()),
            Attribute::bool_attr(CKA_WRAP, false),
            Attribute::bool_attr(CKA_DERIVE, false),
        ]),
    };

    let private_key = Object {
        owning_identity: Some(identity_index),
        class: ObjectClass::PrivateKey,
        attributes: AttributeStore::new(vec![
            Attribute::u64_attr(CKA_CLASS, ObjectClass::PrivateKey.cka_class()),
            Attribute::bytes_attr(CKA_ID, id),
            Attribute::u64_attr(CKA_KEY_TYPE, identity.key_type),
            Attribute::bool_attr(CKA_TOKEN, true),
            Attribute::bool_attr(CKA_PRIVATE, true),
            Attribute::bool_attr(CKA_DECRYPT, identity.priv_can_decrypt),
            Attribute::bool_attr(CKA_SIGN, identity.priv_can_sign),
            Attribute::bytes_attr(CKA_SUBJECT, identity.subject.clone()),
            Attribute::bytes_attr(CKA_LABEL, identity.private_key_label.clone()),
            Attribute::bytes_attr(CKA_MODULUS, identity.modulus.clone()),
            Attribute::bytes_attr(CKA_PUBLIC_EXPONENT, identity.public_exponent.clone()),
            Attribute::bool_attr(CKA_SENSITIVE, true),
            Attribute::bool_attr(CKA_ALWAYS_SENSITIVE, true),
            Attribute::bool_attr(CKA_NEVER_EXTRACTABLE, true),
            Attribute::bool_attr(CKA_LOCAL, true),
            Attribute::bool_attr(CKA_ALWAYS_AUTHENTICATE, false),
            Attribute::bool_attr(CKA_UNWRAP, false),
            Attribute::bool_attr(CKA_DERIVE, false),
            Attribute::bool_attr(CKA_EXTRACTABLE, false),
        ]),
    };

    [certificate, public_key, private_key]
}

/// Build the full object list for a hardware token: three objects per
/// identity, in identity order.
#[must_use]
pub fn build_token_objects(identities: &[Identity]) -> Vec<Object> {
    let mut objects = Vec::with_capacity(identities.len() * 3);
    for (index, identity) in identities.iter().enumerate() {
        objects.extend(build_identity_objects(index, identity));
    }
    objects
}

/// Summarize a certificate's subject into a short label when the host
/// doesn't supply one directly.
#[must_use]
pub fn subject_summary(subject: &[u8]) -> String {
    String::from_utf8_lossy(subject).into_owned()
}

/// Build the certificate + NSS-trust pair for one scanned platform
/// certificate.
#[must_use]
pub fn build_certificate_slot_objects(cert: &CertRecord) -> [Object; 2] {
    let certificate = Object {
        owning_identity: None,
        class: ObjectClass::Certificate,
        attributes: AttributeStore::new(vec![
            Attribute::u64_attr(CKA_CLASS, ObjectClass::Certificate.cka_class()),
            Attribute::u64_attr(CKA_CERTIFICATE_TYPE, CKC_X_509),
            Attribute::bool_attr(CKA_TOKEN, true),
            Attribute::bytes_attr(CKA_LABEL, subject_summary(&cert.subject)),
            Attribute::bytes_attr(CKA_VALUE, cert.der.clone()),
            Attribute::bytes_attr(CKA_SUBJECT, cert.subject.clone()),
            Attribute::bytes_attr(CKA_ISSUER, cert.issuer.clone()),
            Attribute::bytes_attr(CKA_SERIAL_NUMBER, cert.serial_number.clone()),
        ]),
    };

    let sha1 = {
        use sha1::{Digest, Sha1};
        Sha1::digest(&cert.der).to_vec()
    };

    let mut trust_attrs = vec![
        Attribute::u64_attr(CKA_CLASS, ObjectClass::TrustRecord.cka_class()),
        Attribute::bool_attr(CKA_TOKEN, true),
        Attribute::bytes_attr(CKA_ISSUER, cert.issuer.clone()),
        Attribute::bytes_attr(CKA_SERIAL_NUMBER, cert.serial_number.clone()),
        Attribute::bytes_attr(CKA_CERT_SHA1_HASH, sha1),
    ];
    if cert.is_ca {
        for trust_kind in [
            CKA_TRUST_SERVER_AUTH,
            CKA_TRUST_CLIENT_AUTH,
            CKA_TRUST_EMAIL_PROTECTION,
            CKA_TRUST_CODE_SIGNING,
        ] {
            trust_attrs.push(Attribute::u64_attr(trust_kind, CKATTR_TRUSTED_DELEGATOR));
        }
    }

    let trust = Object {
        owning_identity: None,
        class: ObjectClass::TrustRecord,
        attributes: AttributeStore::new(trust_attrs),
    };

    [certificate, trust]
}

/// Build the full object list for the certificate slot.
#[must_use]
pub fn build_certificate_slot_object_list(certs: &[CertRecord]) -> Vec<Object> {
    let mut objects = Vec::with_capacity(certs.len() * 2);
    for cert in certs {
        objects.extend(build_certificate_slot_objects(cert));
    }
    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_id_is_minimum_length_big_endian() {
        assert_eq!(encode_id(0), vec![0]);
        assert_eq!(encode_id(1), vec![1]);
        assert_eq!(encode_id(255), vec![255]);
        assert_eq!(encode_id(256), vec![1, 0]);
        assert_eq!(encode_id(65535), vec![255, 255]);
        assert_eq!(encode_id(65536), vec![1, 0, 0]);
    }

    fn sample_identity() -> Identity {
        Identity {
            certificate_handle: 1,
            private_key_handle: 2,
            public_key_handle: 3,
            public_key_hash: vec![],
            key_type: CKK_RSA,
            access_control: crate::host::AuthContextId(1),
            label: "Alice".into(),
            priv_can_sign: true,
            priv_can_decrypt: true,
            pub_can_verify: true,
            pub_can_encrypt: true,
            certificate_der: vec![0x30, 0x82],
            subject: b"CN=Alice".to_vec(),
            issuer: b"CN=Root".to_vec(),
            serial_number: vec![1],
            modulus: vec![0xFF; 256],
            public_exponent: vec![1, 0, 1],
            private_key_label: "Alice (private)".into(),
        }
    }

    #[test]
    fn triple_shares_id_and_class_order() {
        let identity = sample_identity();
        let [cert, public_key, private_key] = build_identity_objects(4, &identity);
        let id = cert.attributes.get(CKA_ID).unwrap().value.clone();
        assert_eq!(id, encode_id(4));
        assert_eq!(public_key.attributes.get(CKA_ID).unwrap().value, id);
        assert_eq!(private_key.attributes.get(CKA_ID).unwrap().value, id);
        assert_eq!(cert.class, ObjectClass::Certificate);
        assert_eq!(public_key.class, ObjectClass::PublicKey);
        assert_eq!(private_key.class, ObjectClass::PrivateKey);
    }

    #[test]
    fn private_key_is_always_sensitive_and_never_extractable() {
        let identity = sample_identity();
        let [_, _, private_key] = build_identity_objects(0, &identity);
        assert_eq!(
            private_key.attributes.get(CKA_SENSITIVE).unwrap().value,
            vec![1]
        );
        assert_eq!(
            private_key.attributes.get(CKA_EXTRACTABLE).unwrap().value,
            vec![0]
        );
    }

    #[test]
    fn token_object_count_is_three_times_identity_count() {
        let identities = vec![sample_identity(), sample_identity(), sample_identity()];
        let objects = build_token_objects(&identities);
        assert_eq!(objects.len(), 9);
    }

    #[test]
    fn cert_slot_object_count_is_two_times_cert_count() {
        let certs = vec![
            CertRecord {
                der: vec![1, 2, 3],
                subject_common_name: "DoD Root CA 3".into(),
                subject: b"CN=DoD Root CA 3".to_vec(),
                issuer: b"CN=DoD Root CA 3".to_vec(),
                serial_number: vec![9],
                is_ca: true,
                on_hardware_token: false,
            },
        ];
        let objects = build_certificate_slot_object_list(&certs);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].class, ObjectClass::TrustRecord);
        assert_eq!(
            objects[1]
                .attributes
                .get(CKA_TRUST_SERVER_AUTH)
                .unwrap()
                .value,
            CKATTR_TRUSTED_DELEGATOR.to_le_bytes().to_vec()
        );
    }
}
