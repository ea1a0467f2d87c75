use crate::order::Username;
use crate::outcome::Outcome;
use nutype::nutype;
use std::future::Future;

/// Opaque session token issued by the account layer.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 512),
    derive(Debug, Clone, PartialEq, Eq, Hash, AsRef, Serialize, Deserialize, TryFrom)
)]
pub struct SessionToken(String);

/// Resolves a session token to the user it belongs to.
///
/// Issuing and expiring tokens is the account layer's concern; the storefront
/// only needs the lookup.
pub trait Authenticator {
    /// The user owning `token`, or `InvalidSession`.
    fn resolve(&self, token: &SessionToken) -> impl Future<Output = Outcome<Username>> + Send;
}

/// Blanket implementation allowing Authenticator to work with references.
impl<T: Authenticator + Sync> Authenticator for &T {
    async fn resolve(&self, token: &SessionToken) -> Outcome<Username> {
        (*self).resolve(token).await
    }
}
