//! Process-level configuration, read once at `initialize` time from the
//! host preference domain `mil.navy.nrl.cmf.pkcs11` via the
//! [`Preferences`] trait.

use crate::host::Preferences;

const PREF_ASK_PIN: &str = "askPIN";
const PREF_KEYCHAIN_CERT_SLOT: &str = "keychainCertSlot";
const PREF_CERTIFICATE_LIST: &str = "certificateList";

const DEFAULT_KEYCHAIN_PROGRAMS: &[&str] = &["firefox", "thunderbird"];
const DEFAULT_CERTIFICATE_SUBSTRINGS: &[&str] = &["DoD Root CA"];

/// Who gets PINs relayed into the local-authentication primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskPinPolicy {
    All,
    None,
    Programs(Vec<String>),
}

impl AskPinPolicy {
    #[must_use]
    pub fn matches(&self, program: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Programs(names) => names.iter().any(|n| n == program),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ask_pin: AskPinPolicy,
    /// Programs for which the certificate slot is enabled and the
    /// background scan runs. Empty means never.
    pub keychain_cert_slot_programs: Vec<String>,
    /// Substrings matched against certificate common names; `None` means
    /// the scan is disabled entirely (the `"none"` sentinel value).
    pub certificate_substrings: Option<Vec<String>>,
}

fn parse_ask_pin(values: Option<Vec<String>>) -> AskPinPolicy {
    match values {
        None => AskPinPolicy::None,
        Some(values) if values.iter().any(|v| v == "all") => AskPinPolicy::All,
        Some(values) if values.iter().any(|v| v == "none") => AskPinPolicy::None,
        Some(values) => AskPinPolicy::Programs(values),
    }
}

fn parse_keychain_cert_slot(values: Option<Vec<String>>) -> Vec<String> {
    values.unwrap_or_else(|| {
        DEFAULT_KEYCHAIN_PROGRAMS
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    })
}

fn parse_certificate_list(values: Option<Vec<String>>) -> Option<Vec<String>> {
    match values {
        None => Some(
            DEFAULT_CERTIFICATE_SUBSTRINGS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        ),
        Some(values) if values.len() == 1 && values[0] == "none" => None,
        Some(values) => Some(values),
    }
}

impl Config {
    #[must_use]
    pub fn load(preferences: &dyn Preferences) -> Self {
        Self {
            ask_pin: parse_ask_pin(preferences.string_list(PREF_ASK_PIN)),
            keychain_cert_slot_programs: parse_keychain_cert_slot(
                preferences.string_list(PREF_KEYCHAIN_CERT_SLOT),
            ),
            certificate_substrings: parse_certificate_list(
                preferences.string_list(PREF_CERTIFICATE_LIST),
            ),
        }
    }

    #[must_use]
    pub fn keychain_cert_slot_enabled_for(&self, program: &str) -> bool {
        self.keychain_cert_slot_programs.iter().any(|p| p == program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;

    #[test]
    fn defaults_apply_when_preferences_absent() {
        let host = MockHost::new();
        let config = Config::load(&host);
        assert_eq!(config.ask_pin, AskPinPolicy::None);
        assert_eq!(
            config.keychain_cert_slot_programs,
            vec!["firefox".to_string(), "thunderbird".to_string()]
        );
        assert_eq!(
            config.certificate_substrings,
            Some(vec!["DoD Root CA".to_string()])
        );
    }

    #[test]
    fn ask_pin_all_matches_every_program() {
        let host = MockHost::new();
        host.set_preference(PREF_ASK_PIN, vec!["all".into()]);
        let config = Config::load(&host);
        assert!(config.ask_pin.matches("anything"));
    }

    #[test]
    fn ask_pin_program_list_matches_only_named_programs() {
        let host = MockHost::new();
        host.set_preference(PREF_ASK_PIN, vec!["ssh-agent".into()]);
        let config = Config::load(&host);
        assert!(config.ask_pin.matches("ssh-agent"));
        assert!(!config.ask_pin.matches("firefox"));
    }

    #[test]
    fn certificate_list_none_sentinel_disables_scan() {
        let host = MockHost::new();
        host.set_preference(PREF_CERTIFICATE_LIST, vec!["none".into()]);
        let config = Config::load(&host);
        assert!(config.certificate_substrings.is_none());
    }

    #[test]
    fn keychain_cert_slot_checks_program_membership() {
        let host = MockHost::new();
        let config = Config::load(&host);
        assert!(config.keychain_cert_slot_enabled_for("firefox"));
        assert!(!config.keychain_cert_slot_enabled_for("curl"));
    }
}
