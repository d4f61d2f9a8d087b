//! ## Overview
//!
//! This crate protects form submissions against cross-site request forgery with
//! tokens bound to the request they are meant for, plus a small layer setting
//! static security headers.
//!
//! ### How it works
//!
//! - **Secret key**: You provide a **secret key** used to sign XSRF tokens (See: [OWASP's Cryptographic Storage Cheat Sheet][owasp-cryptographic-storage]).
//! - **User identity**: You provide a [`UserIdStorage`] that tells us who is behind the current request.
//! - **Token creation**:
//!   - We sign the **host** and **path** the form will be submitted to, together with the **user id**, using HMAC-SHA256 and the **secret key**.
//!   - The token is the URL-safe base64 encoding of that signature, so it can be dropped into a form body as is.
//!   - The same inputs always produce the same token; there is nothing to store server side.
//! - **Token validation**:
//!   - For every `POST`, `PUT`, `PATCH` and `DELETE` request, before your handler runs:
//!     - We read the [`TOKEN_KEY`] field from the `application/x-www-form-urlencoded` or `multipart/form-data` body.
//!     - We recompute the token for the host and path the request was actually sent to and compare both in constant time.
//!   - A missing token is answered with `401 Unauthorized`, a wrong one with `403 Forbidden`.
//!   - Accepted requests reach your handler with the body intact.
//!
//! ## Usage
//!
//! ### With [`axum`][crate-axum]
//!
//! ```rust, no_run
//! use std::net::SocketAddr;
//!
//! use async_trait::async_trait;
//! use axum::{response::Html, routing::get, Router};
//! use http::StatusCode;
//! use tower_xsrf::{BoxError, StaticHeaders, UserIdStorage, Xsrf, XsrfToken};
//!
//! struct Session;
//!
//! #[async_trait]
//! impl UserIdStorage for Session {
//!     async fn user_id(&self) -> Result<String, BoxError> {
//!         Ok("unique-user-id".into())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .route("/", get(form).post(|| async { "Thanks!" }))
//!         .layer(Xsrf::new("secret-key", Session))
//!         .layer(StaticHeaders);
//!
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
//!     let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
//!
//!     axum::serve(listener, app.into_make_service())
//!         .await
//!         .unwrap();
//! }
//!
//! async fn form(token: XsrfToken) -> Result<Html<String>, StatusCode> {
//!     let value = token
//!         .generate("/")
//!         .await
//!         .map_err(|err| err.status_code())?;
//!
//!     Ok(Html(format!(
//!         r#"<form method="post"><input type="hidden" name="{}" value="{}"><button>Go</button></form>"#,
//!         token.field_name(),
//!         value,
//!     )))
//! }
//! ```
//!
//! [crate-axum]: https://github.com/tokio-rs/axum
//! [owasp-cryptographic-storage]: https://cheatsheetseries.owasp.org/cheatsheets/Cryptographic_Storage_Cheat_Sheet.html

use hmac::Hmac;
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Form field carrying the token, unless configured otherwise with [`Xsrf::field_name`].
pub const TOKEN_KEY: &str = "xsrf-token";

pub use claim::{Claims, HeaderSetter};
pub use error::Error;
pub use guard::GuardService;
pub use identity::UserIdStorage;
pub use static_headers::{StaticHeaders, StaticHeadersService};
pub use token::XsrfToken;
pub use xsrf::{Xsrf, XsrfService};

mod claim;
mod error;
mod form;
mod guard;
mod identity;
mod static_headers;
mod token;
mod xsrf;

#[cfg(feature = "axum")]
mod extract;
