//! Background Scanner.
//!
//! A one-shot certificate-import task gated by an atomic tri-state:
//! `uninitialized → initializing` by compare-and-swap so only the
//! winning thread launches the scan; `initializing → initialized` by a
//! plain store after the object list is committed, read by others with
//! acquire semantics.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::host::{CertRecord, CertificateStore};
use crate::object::{build_certificate_slot_object_list, Object};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const INITIALIZED: u8 = 2;

pub struct CertSlotState {
    state: AtomicU8,
    objects: RwLock<Arc<Vec<Object>>>,
}

impl Default for CertSlotState {
    fn default() -> Self {
        Self::new()
    }
}

impl CertSlotState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(UNINITIALIZED),
            objects: RwLock::new(Arc::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == INITIALIZED
    }

    /// Current object list, snapshotted at whatever point the scan (if
    /// any) had reached. A session opened before the scan completes sees
    /// whatever is published at open time and never sees later updates
    /// (snapshot-at-open, per the engine's stated behavior for this open
    /// question).
    #[must_use]
    pub fn objects(&self) -> Arc<Vec<Object>> {
        Arc::clone(&self.objects.read())
    }

    /// Attempt to become the scan's sole runner. Returns `true` exactly
    /// once across the process's lifetime (until a test resets state).
    fn try_start(&self) -> bool {
        self.state
            .compare_exchange(UNINITIALIZED, INITIALIZING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn publish(&self, objects: Vec<Object>) {
        *self.objects.write() = Arc::new(objects);
        self.state.store(INITIALIZED, Ordering::Release);
    }

    /// Run the scan if this caller won the compare-and-swap; otherwise a
    /// no-op (someone else is running it, or it already ran).
    pub fn scan_once(&self, store: &dyn CertificateStore, substrings: &[String]) {
        if !self.try_start() {
            return;
        }
        let matched = select_certificates(store.trusted_certificates(), substrings);
        let objects = build_certificate_slot_object_list(&matched);
        log::info!("certificate scan: published {} certificate(s)", matched.len());
        self.publish(objects);
    }
}

/// Certificate scan algorithm: common-name substring match, then
/// transitive issuer-chain expansion excluding hardware-token
/// certificates.
#[must_use]
pub fn select_certificates(certs: Vec<CertRecord>, substrings: &[String]) -> Vec<CertRecord> {
    let mut working: Vec<CertRecord> = certs;
    let mut exported = Vec::new();

    let mut index = 0;
    while index < working.len() {
        if substrings
            .iter()
            .any(|needle| working[index].subject_common_name.contains(needle.as_str()))
        {
            let cert = working.remove(index);
            expand_chain(cert, &mut working, &mut exported);
        } else {
            index += 1;
        }
    }
    exported
}

fn expand_chain(cert: CertRecord, working: &mut Vec<CertRecord>, exported: &mut Vec<CertRecord>) {
    let subject = cert.subject.clone();
    exported.push(cert);
    let mut index = 0;
    while index < working.len() {
        if !working[index].on_hardware_token && working[index].issuer == subject {
            let child = working.remove(index);
            expand_chain(child, working, exported);
        } else {
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;

    fn cert(common_name: &str, subject: &str, issuer: &str, on_hardware_token: bool) -> CertRecord {
        CertRecord {
            der: vec![1],
            subject_common_name: common_name.into(),
            subject: subject.as_bytes().to_vec(),
            issuer: issuer.as_bytes().to_vec(),
            serial_number: vec![1],
            is_ca: true,
            on_hardware_token,
        }
    }

    #[test]
    fn matches_by_substring_and_expands_issued_chain() {
        let certs = vec![
            cert("DoD Root CA 3", "CN=DoD Root CA 3", "CN=DoD Root CA 3", false),
            cert("DoD Interop CA 1", "CN=DoD Interop CA 1", "CN=DoD Root CA 3", false),
            cert("Unrelated CA", "CN=Unrelated CA", "CN=Unrelated CA", false),
        ];
        let exported = select_certificates(certs, &["DoD Root CA".to_string()]);
        let names: Vec<_> = exported.iter().map(|c| c.subject_common_name.clone()).collect();
        assert_eq!(names, vec!["DoD Root CA 3", "DoD Interop CA 1"]);
    }

    #[test]
    fn hardware_token_certificates_are_excluded_from_chain_expansion() {
        let certs = vec![
            cert("DoD Root CA 3", "CN=DoD Root CA 3", "CN=DoD Root CA 3", false),
            cert("Smartcard Cert", "CN=Smartcard Cert", "CN=DoD Root CA 3", true),
        ];
        let exported = select_certificates(certs, &["DoD Root CA".to_string()]);
        assert_eq!(exported.len(), 1);
    }

    #[test]
    fn scan_once_only_runs_a_single_time() {
        let host = MockHost::new();
        host.push_cert(cert("DoD Root CA 3", "CN=DoD Root CA 3", "CN=DoD Root CA 3", false));
        let state = CertSlotState::new();
        state.scan_once(&host, &["DoD Root CA".to_string()]);
        assert!(state.is_initialized());
        assert_eq!(state.objects().len(), 2);

        host.push_cert(cert("DoD Root CA 4", "CN=DoD Root CA 4", "CN=DoD Root CA 4", false));
        state.scan_once(&host, &["DoD Root CA".to_string()]);
        assert_eq!(state.objects().len(), 2);
    }
}
