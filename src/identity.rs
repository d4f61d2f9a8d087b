use std::sync::Arc;

use async_trait::async_trait;

use crate::BoxError;

/// Resolves the identity of the user behind the current request.
///
/// Tokens are bound to this value, so a token minted for one user is rejected
/// when presented by another. Implementations may perform I/O; the guard calls
/// [`user_id`](UserIdStorage::user_id) once per request and never retries.
#[async_trait]
pub trait UserIdStorage: Send + Sync + 'static {
    async fn user_id(&self) -> Result<String, BoxError>;
}

#[async_trait]
impl<T: UserIdStorage + ?Sized> UserIdStorage for Arc<T> {
    async fn user_id(&self) -> Result<String, BoxError> {
        (**self).user_id().await
    }
}
