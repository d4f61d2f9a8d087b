use http::{header, Extensions, HeaderMap, Request, Uri};
use percent_encoding::percent_decode_str;
use std::{
    borrow::Cow,
    fmt,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tower_layer::Layer;
use tower_service::Service;

use crate::{guard::GuardService, token, Error, UserIdStorage, XsrfToken, TOKEN_KEY};

const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) secret: Vec<u8>,
    pub(crate) storage: Arc<dyn UserIdStorage>,
    pub(crate) field_name: String,
    pub(crate) body_limit: usize,
    pub(crate) lookup_timeout: Option<Duration>,
}

impl Config {
    pub(crate) async fn user_id(&self) -> Result<String, Error> {
        let lookup = self.storage.user_id();

        let result = match self.lookup_timeout {
            Some(duration) => tokio::time::timeout(duration, lookup)
                .await
                .map_err(|_| Error::LookupTimeout)?,
            None => lookup.await,
        };

        result.map_err(Error::IdentityLookup)
    }

    pub(crate) async fn generate(&self, host: &str, path: &str) -> Result<String, Error> {
        let user_id = self.user_id().await?;

        token::sign(&self.secret, host, path, &user_id)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"[REDACTED]")
            .field("field_name", &self.field_name)
            .field("body_limit", &self.body_limit)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

/// The host a request was sent to: the `Host` header, or the URI authority
/// when the header is absent.
pub(crate) fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or_default()
}

/// The URI the client sent, before a nesting router stripped its prefix.
pub(crate) fn original_uri<'a>(extensions: &'a Extensions, uri: &'a Uri) -> &'a Uri {
    #[cfg(feature = "axum")]
    let uri = extensions
        .get::<axum::extract::OriginalUri>()
        .map_or(uri, |original| &original.0);
    #[cfg(not(feature = "axum"))]
    let _ = extensions;

    uri
}

/// Tokens are bound to the percent-decoded path.
pub(crate) fn request_path(uri: &Uri) -> Cow<'_, str> {
    percent_decode_str(uri.path()).decode_utf8_lossy()
}

/// XSRF protection for a [`tower`](https://docs.rs/tower) service.
///
/// Rejects state-changing requests whose form body doesn't carry a token
/// minted for the request's host, path and user.
#[derive(Clone, Debug)]
pub struct Xsrf {
    pub(crate) config: Config,
}

impl Xsrf {
    pub fn new(secret: impl Into<Vec<u8>>, storage: impl UserIdStorage) -> Self {
        Self {
            config: Config {
                secret: secret.into(),
                storage: Arc::new(storage),
                field_name: TOKEN_KEY.into(),
                body_limit: DEFAULT_BODY_LIMIT,
                lookup_timeout: None,
            },
        }
    }

    /// Name of the form field the token is read from. Defaults to [`TOKEN_KEY`].
    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.config.field_name = field_name.into();

        self
    }

    /// Largest request body buffered while looking for the token.
    pub fn body_limit(mut self, body_limit: usize) -> Self {
        self.config.body_limit = body_limit;

        self
    }

    pub fn lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.config.lookup_timeout = Some(lookup_timeout);

        self
    }

    /// Mints a token for a form that will be submitted to `host` and `path`.
    ///
    /// `path` is the full, percent-decoded path the client posts to, including
    /// any prefix a router is nested under (`/café`, not `/caf%C3%A9`).
    pub async fn generate_token(&self, host: &str, path: &str) -> Result<String, Error> {
        self.config.generate(host, path).await
    }
}

impl<S> Layer<S> for Xsrf {
    type Service = XsrfService<GuardService<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        XsrfService {
            config: Arc::new(self.config.clone()),
            inner: GuardService::new(inner),
        }
    }
}

#[derive(Clone)]
pub struct XsrfService<S> {
    config: Arc<Config>,
    inner: S,
}

impl<S, B> Service<Request<B>> for XsrfService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let uri = original_uri(request.extensions(), request.uri());
        let token = XsrfToken {
            config: self.config.clone(),
            host: request_host(request.headers(), uri).to_owned(),
        };

        request.extensions_mut().insert(self.config.clone());
        request.extensions_mut().insert(token);

        self.inner.call(request)
    }
}
