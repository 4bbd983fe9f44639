//! Token.
//!
//! Owned by a slot; created by the insertion handler, destroyed when its
//! reference count reaches zero. Modeled as `Arc<Token>` so the slot
//! registry and every session bound to it can each hold a strong
//! reference: the registry's reference is released on
//! removal, each session's reference is released on close, and the token
//! is dropped once the last reference goes away.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::host::{AuthContextId, TokenId};
use crate::identity::Identity;
use crate::object::Object;

/// Fields guarded by the per-token mutex.
pub struct TokenMut {
    pub label: String,
    pub logged_in: bool,
    /// Present once `C_Login` binds a context; absent if the host refused
    /// to allocate one.
    pub auth_context: Option<AuthContextId>,
}

pub struct Token {
    pub token_id: TokenId,
    pub identities: Vec<Identity>,
    pub objects: Arc<Vec<Object>>,
    inner: Mutex<TokenMut>,
}

impl Token {
    #[must_use]
    pub fn new(
        token_id: TokenId,
        label: String,
        identities: Vec<Identity>,
        objects: Vec<Object>,
        auth_context: Option<AuthContextId>,
    ) -> Arc<Self> {
        Arc::new(Self {
            token_id,
            identities,
            objects: Arc::new(objects),
            inner: Mutex::new(TokenMut {
                label,
                logged_in: false,
                auth_context,
            }),
        })
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.inner.lock().label.clone()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner.lock().logged_in
    }

    pub fn set_logged_in(&self, value: bool) {
        self.inner.lock().logged_in = value;
    }

    #[must_use]
    pub fn auth_context(&self) -> Option<AuthContextId> {
        self.inner.lock().auth_context
    }

    pub fn set_auth_context(&self, ctx: Option<AuthContextId>) {
        self.inner.lock().auth_context = ctx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_starts_logged_out() {
        let token = Token::new(TokenId(1), "t".into(), vec![], vec![], None);
        assert!(!token.is_logged_in());
    }

    #[test]
    fn refcount_tracks_registry_plus_sessions() {
        let token = Token::new(TokenId(1), "t".into(), vec![], vec![], None);
        assert_eq!(Arc::strong_count(&token), 1);
        let session_ref = Arc::clone(&token);
        assert_eq!(Arc::strong_count(&token), 2);
        drop(session_ref);
        assert_eq!(Arc::strong_count(&token), 1);
    }
}
