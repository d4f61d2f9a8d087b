use std::sync::Arc;

use base64::prelude::*;
use hmac::Mac;
use subtle::ConstantTimeEq;

use crate::{error::Error, xsrf::Config, HmacSha256};

/// Mints tokens for forms rendered while handling a request.
///
/// Attached to every request passing through [`Xsrf`](crate::Xsrf). With the
/// `axum` feature it can be taken as a handler argument.
#[derive(Clone, Debug)]
pub struct XsrfToken {
    pub(crate) config: Arc<Config>,
    pub(crate) host: String,
}

impl XsrfToken {
    /// Token for a form that posts to `path` on the host of the current request.
    ///
    /// `path` is the full path the browser will post to, so handlers behind a
    /// nested router include the nesting prefix.
    pub async fn generate(&self, path: &str) -> Result<String, Error> {
        self.config.generate(&self.host, path).await
    }

    pub async fn generate_for(&self, host: &str, path: &str) -> Result<String, Error> {
        self.config.generate(host, path).await
    }

    /// The form field name the guard reads the token from.
    pub fn field_name(&self) -> &str {
        &self.config.field_name
    }
}

/// Signs `(host, path, user_id)` with `secret`.
///
/// Every field is length-prefixed so that moving bytes between neighbours
/// (`foo.com` + `/pizza` vs `foo.com/` + `pizza`) yields a different message.
pub(crate) fn sign(secret: &[u8], host: &str, path: &str, user_id: &str) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    for field in [host, path, user_id] {
        mac.update(field.len().to_string().as_bytes());
        mac.update(b":");
        mac.update(field.as_bytes());
    }

    Ok(BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Compares tokens without short-circuiting on the first differing byte.
pub(crate) fn verify(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn is_deterministic() {
        let a = sign(b"1234", "foo.com", "/pizza", "potato").unwrap();
        let b = sign(b"1234", "foo.com", "/pizza", "potato").unwrap();

        assert_eq!(a, b);
        assert!(verify(&a, &b));
    }

    #[test]
    fn is_form_safe() {
        let token = sign(b"1234", "foo.com", "/pizza", "potato").unwrap();

        assert!(token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn separates_fields() {
        let a = sign(b"1234", "foo.com", "/pizza", "potato").unwrap();
        let b = sign(b"1234", "foo.com/", "pizza", "potato").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn rejects_prefix() {
        let token = sign(b"1234", "foo.com", "/pizza", "potato").unwrap();

        assert!(!verify(&token[..token.len() - 1], &token));
        assert!(!verify("", &token));
    }

    proptest! {
        #[test]
        fn same_inputs_same_token(
            secret in ".{0,32}",
            host in ".{0,32}",
            path in ".{0,32}",
            user in ".{0,32}",
        ) {
            let a = sign(secret.as_bytes(), &host, &path, &user).unwrap();
            let b = sign(secret.as_bytes(), &host, &path, &user).unwrap();
            prop_assert!(verify(&a, &b));
        }

        #[test]
        fn other_host_other_token(
            host in "[a-z]{1,16}\\.com",
            other in "[a-z]{1,16}\\.org",
            path in "/[a-z]{0,16}",
        ) {
            let a = sign(b"1234", &host, &path, "potato").unwrap();
            let b = sign(b"1234", &other, &path, "potato").unwrap();
            prop_assert!(!verify(&b, &a));
        }

        #[test]
        fn other_path_other_token(
            path in "/[a-z]{1,16}",
            other in "/[a-z]{1,16}",
        ) {
            prop_assume!(path != other);
            let a = sign(b"1234", "foo.com", &path, "potato").unwrap();
            let b = sign(b"1234", "foo.com", &other, "potato").unwrap();
            prop_assert!(!verify(&b, &a));
        }

        #[test]
        fn other_user_other_token(
            user in "[a-z]{1,16}",
            other in "[A-Z]{1,16}",
        ) {
            let a = sign(b"1234", "foo.com", "/pizza", &user).unwrap();
            let b = sign(b"1234", "foo.com", "/pizza", &other).unwrap();
            prop_assert!(!verify(&b, &a));
        }
    }
}
