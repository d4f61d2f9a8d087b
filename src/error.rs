use http::{header, HeaderName, HeaderValue, StatusCode};

use crate::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Maps the [`hmac::digest::InvalidLength`] error.
    #[error(transparent)]
    InvalidLength(#[from] hmac::digest::InvalidLength),
    /// An expected extension was missing.
    #[error("couldn't extract `{0}`. is `Xsrf` enabled?")]
    ExtensionNotFound(String),
    /// The [`UserIdStorage`](crate::UserIdStorage) couldn't resolve the current user.
    #[error("couldn't look up user id: {0}")]
    IdentityLookup(#[source] BoxError),
    /// The user id lookup didn't finish within the configured timeout.
    #[error("user id lookup timed out")]
    LookupTimeout,
    /// The request body didn't carry a usable token.
    #[error("xsrf token not present")]
    TokenNotPresent,
    /// The request carried a token that wasn't issued for it.
    #[error("xsrf token mismatch")]
    TokenMismatch,
    /// Another component already owns the response header.
    #[error("header `{0}` is already claimed")]
    HeaderClaimConflict(HeaderName),
}

impl Error {
    /// The status a rejected request is answered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::TokenNotPresent => StatusCode::UNAUTHORIZED,
            Error::TokenMismatch => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn make_layer_error<T: From<&'static str>, E>(
        err: impl std::error::Error,
    ) -> Result<http::Response<T>, E> {
        tracing::error!(err = %err);

        Ok(plain_text_response(StatusCode::INTERNAL_SERVER_ERROR))
    }

    pub(crate) fn make_layer_rejection<T: From<&'static str>, E>(
        self,
    ) -> Result<http::Response<T>, E> {
        let status = self.status_code();
        if status.is_server_error() {
            return Self::make_layer_error(self);
        }

        tracing::debug!(err = %self, status = status.as_u16(), "rejecting request");

        Ok(plain_text_response(status))
    }
}

/// Reason phrase plus newline, served as `text/plain` with sniffing disabled.
fn plain_text_response<T: From<&'static str>>(status: StatusCode) -> http::Response<T> {
    let body = match status {
        StatusCode::UNAUTHORIZED => "Unauthorized\n",
        StatusCode::FORBIDDEN => "Forbidden\n",
        _ => "Internal Server Error\n",
    };

    let mut response = http::Response::new(T::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_client_faults() {
        assert_eq!(Error::TokenNotPresent.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::TokenMismatch.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::LookupTimeout.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::HeaderClaimConflict(header::X_XSS_PROTECTION).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rejection_is_plain_text() {
        let response: http::Response<String> = Error::TokenMismatch
            .make_layer_rejection::<String, ()>()
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), "Forbidden\n");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers().len(), 2);
    }

    #[test]
    fn server_errors_hide_details() {
        let err = Error::IdentityLookup("database unreachable".into());
        let response: http::Response<String> = err.make_layer_rejection::<String, ()>().unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), "Internal Server Error\n");
    }
}
