//! Process-wide runtime object: ties the slot registry, session registry,
//! certificate-slot state, and mutex-provider selection behind one handle
//! with `initialize`/`finalize` lifecycle rules.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::error::BridgeError;
use crate::host::{AuthUsage, CertificateStore, IdentityProvider, LocalAuth, Preferences, TokenEvent, TokenId};
use crate::identity::load_identities;
use crate::mutex_provider::MutexProvider;
use crate::object::build_token_objects;
use crate::scanner::CertSlotState;
use crate::session_registry::SessionRegistry;
use crate::slot::SlotRegistry;
use crate::token::Token;

pub struct Runtime {
    initialized: AtomicBool,
    pub slots: SlotRegistry,
    pub sessions: SessionRegistry,
    pub cert_slot: CertSlotState,
    pub config: Config,
    mutex_provider: MutexProvider,
}

impl Runtime {
    #[must_use]
    pub fn new(config: Config, mutex_provider: MutexProvider) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            slots: SlotRegistry::new(),
            sessions: SessionRegistry::new(),
            cert_slot: CertSlotState::new(),
            config,
            mutex_provider,
        }
    }

    #[must_use]
    pub fn mutex_provider(&self) -> &MutexProvider {
        &self.mutex_provider
    }

    /// Double-initialize is an error; `finalize` must precede a re-init.
    pub fn initialize(&self, program_name: &str) -> Result<(), BridgeError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyInitialized);
        }
        self.slots
            .set_certificate_slot_enabled(self.config.keychain_cert_slot_enabled_for(program_name));
        log::info!("runtime: initialized for program {program_name}");
        Ok(())
    }

    pub fn finalize(&self) -> Result<(), BridgeError> {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return Err(BridgeError::NotInitialized);
        }
        let closed = self.sessions.close_all_present();
        log::info!("runtime: finalized, released {closed} open session(s)");
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Run the certificate scan if the certificate slot is enabled and
    /// the preference substring list isn't the `"none"` sentinel.
    pub fn run_certificate_scan(&self, store: &dyn CertificateStore) {
        if !self.slots.certificate_slot_enabled() {
            return;
        }
        let Some(substrings) = self.config.certificate_substrings.clone() else {
            return;
        };
        self.cert_slot.scan_once(store, &substrings);
    }

    /// Handle one token-insertion/removal event. Returns the slot id the
    /// event affected, for callers (`C_WaitForSlotEvent`) that must report
    /// it back to the caller; `None` if the event produced no slot change
    /// (e.g. an insertion with no usable identities).
    pub fn handle_token_event(&self, event: TokenEvent, provider: &dyn IdentityProvider) -> Option<u64> {
        match event {
            TokenEvent::Added(token_id) => self.add_token(token_id, provider),
            TokenEvent::Removed(token_id) => {
                let slot_id = self.slots.remove_token(&token_id);
                if let Some(slot_id) = slot_id {
                    log::info!("runtime: token {token_id:?} removed from slot {slot_id}");
                }
                slot_id
            }
        }
    }

    fn add_token(&self, token_id: TokenId, provider: &dyn IdentityProvider) -> Option<u64> {
        let identities = load_identities(provider, &token_id);
        if identities.is_empty() {
            log::warn!("runtime: token {token_id:?} produced no usable identities, ignoring insertion");
            return None;
        }
        let objects = build_token_objects(&identities);
        let token = Token::new(token_id, "Hardware token".to_string(), identities, objects, None);
        let slot_id = self.slots.insert_token(token);
        log::info!("runtime: token {token_id:?} inserted into slot {slot_id}");
        Some(slot_id)
    }

    /// `C_Login`. Succeeds silently against the certificate slot (no
    /// token). A present PIN authenticates every identity on the token
    /// individually; a null PIN delegates to the platform and logs in
    /// without calling the primitive.
    pub fn login(
        &self,
        session_handle: u64,
        pin: Option<&[u8]>,
        local_auth: &dyn LocalAuth,
    ) -> Result<(), BridgeError> {
        let token = self.sessions.with_session(session_handle, |session| Ok(session.token.clone()))?;
        let Some(token) = token else {
            return Ok(());
        };
        if pin.is_none() {
            token.set_logged_in(true);
            return Ok(());
        }
        if token.auth_context().is_none() {
            token.set_logged_in(true);
            return Ok(());
        }
        for identity in &token.identities {
            let usage = if identity.priv_can_sign {
                AuthUsage::Sign
            } else {
                AuthUsage::Decrypt
            };
            local_auth.authenticate(&identity.access_control, pin, usage)?;
        }
        token.set_logged_in(true);
        Ok(())
    }

    pub fn logout(&self, session_handle: u64, local_auth: &dyn LocalAuth) -> Result<(), BridgeError> {
        let token = self.sessions.with_session(session_handle, |session| Ok(session.token.clone()))?;
        if let Some(token) = token {
            logout_token(&token, local_auth);
        }
        Ok(())
    }

    /// Close one session; if this drops the bound token's refcount from
    /// 2 to 1 (no other sessions remain, only the slot registry's
    /// reference), implicitly logs it out first.
    pub fn close_session(&self, session_handle: u64, local_auth: &dyn LocalAuth) -> Result<(), BridgeError> {
        let token = self.sessions.with_session(session_handle, |session| Ok(session.token.clone()))?;
        if let Some(token) = &token {
            // `token` here is itself one extra clone beyond the registry's
            // and this session's references, so the "drops to 1" moment is
            // observed at count 3, not 2.
            if Arc::strong_count(token) == 3 {
                logout_token(token, local_auth);
            }
        }
        self.sessions.close(session_handle)
    }
}

fn logout_token(token: &Arc<Token>, local_auth: &dyn LocalAuth) {
    if let Some(ctx) = token.auth_context() {
        local_auth.release(&ctx);
    }
    token.set_auth_context(None);
    token.set_logged_in(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::host::{AuthContextId, RawIdentityRecord};

    fn runtime() -> Runtime {
        let host = MockHost::new();
        let config = Config::load(&host);
        Runtime::new(config, MutexProvider::Native)
    }

    #[test]
    fn double_initialize_is_an_error() {
        let rt = runtime();
        rt.initialize("firefox").unwrap();
        assert_eq!(rt.initialize("firefox").unwrap_err(), BridgeError::AlreadyInitialized);
    }

    #[test]
    fn finalize_before_initialize_is_an_error() {
        let rt = runtime();
        assert_eq!(rt.finalize().unwrap_err(), BridgeError::NotInitialized);
    }

    #[test]
    fn finalize_then_reinitialize_succeeds() {
        let rt = runtime();
        rt.initialize("firefox").unwrap();
        rt.finalize().unwrap();
        rt.initialize("firefox").unwrap();
    }

    #[test]
    fn certificate_slot_enabled_only_for_configured_programs() {
        let rt = runtime();
        rt.initialize("curl").unwrap();
        assert!(!rt.slots.certificate_slot_enabled());
    }

    fn add_sample_token(rt: &Runtime, host: &MockHost, token_id: TokenId) {
        host.add_identity_record(
            &token_id,
            RawIdentityRecord {
                certificate_handle: 0,
                private_key_handle: 0,
                public_key_handle: 0,
                public_key_hash: vec![],
                host_key_type: 0,
                access_control: AuthContextId(1),
                label: "Alice".into(),
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
                private_key_label: "Alice (private)".into(),
            },
        );
        rt.handle_token_event(TokenEvent::Added(token_id), host);
    }

    #[test]
    fn login_with_null_pin_delegates_and_sets_logged_in() {
        let host = MockHost::new();
        let rt = runtime();
        rt.initialize("firefox").unwrap();
        let token_id = TokenId(1);
        add_sample_token(&rt, &host, token_id);
        let token = rt.slots.token_at(0).unwrap();
        let handle = rt
            .sessions
            .open(0, true, Some(Arc::clone(&token)), Arc::clone(&token.objects))
            .unwrap();
        rt.login(handle, None, &host).unwrap();
        assert!(token.is_logged_in());
    }

    #[test]
    fn close_session_drops_refcount_to_one_triggers_logout() {
        let host = MockHost::new();
        let rt = runtime();
        rt.initialize("firefox").unwrap();
        let token_id = TokenId(1);
        add_sample_token(&rt, &host, token_id);
        let handle = {
            let token = rt.slots.token_at(0).unwrap();
            token.set_auth_context(Some(AuthContextId(9)));
            let handle = rt
                .sessions
                .open(0, true, Some(Arc::clone(&token)), Arc::clone(&token.objects))
                .unwrap();
            rt.login(handle, None, &host).unwrap();
            assert!(token.is_logged_in());
            handle
        };
        rt.close_session(handle, &host).unwrap();
        assert!(!rt.slots.token_at(0).unwrap().is_logged_in());
    }
}
