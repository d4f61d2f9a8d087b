use async_trait::async_trait;
use axum_core::extract::FromRequestParts;
use http::{request::Parts, StatusCode};

use crate::{Error, XsrfToken};

/// Rejected with `500 Internal Server Error` when [`Xsrf`](crate::Xsrf) isn't
/// layered around the handler.
#[async_trait]
impl<S> FromRequestParts<S> for XsrfToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = parts.extensions.get::<XsrfToken>() else {
            let err = Error::ExtensionNotFound("XsrfToken".into());
            tracing::error!(err = %err);

            return Err((err.status_code(), err.to_string()));
        };

        Ok(token.clone())
    }
}
