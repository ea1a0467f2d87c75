use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use storefront_types::{Authenticator, ErrorKind, Failure, Outcome, SessionToken, Username};

/// Session lookup table for tests and single-process deployments.
///
/// Tokens are issued by whoever owns the login flow; this type only maps
/// them to users.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessions {
    sessions: Arc<RwLock<HashMap<SessionToken, Username>>>,
}

impl InMemorySessions {
    /// Create an empty session table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `token` with `user`, replacing any previous owner.
    pub fn issue(&self, token: SessionToken, user: Username) {
        let _ = self.sessions.write().insert(token, user);
    }

    /// Forget `token`. Returns true when it was known.
    pub fn revoke(&self, token: &SessionToken) -> bool {
        self.sessions.write().remove(token).is_some()
    }
}

impl Authenticator for InMemorySessions {
    async fn resolve(&self, token: &SessionToken) -> Outcome<Username> {
        self.sessions.read().get(token).cloned().ok_or_else(|| {
            Failure::new(
                ErrorKind::InvalidSession,
                "The session is invalid or has expired.",
            )
        })
    }
}
