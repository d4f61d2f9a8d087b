use futures_util::future::BoxFuture;
use http::{header, HeaderValue, Request, Response};
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

use crate::{claim::Claims, Error};

/// Claims and sets the following headers on every response:
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-XSS-Protection: 0`
///
/// If another component already claimed one of them the request is answered
/// with `500 Internal Server Error` and the inner service isn't called.
#[derive(Clone, Debug, Default)]
pub struct StaticHeaders;

impl<S> Layer<S> for StaticHeaders {
    type Service = StaticHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StaticHeadersService { inner }
    }
}

#[derive(Clone)]
pub struct StaticHeadersService<S> {
    inner: S,
}

impl<S, Q, R> Service<Request<Q>> for StaticHeadersService<S>
where
    S: Service<Request<Q>, Response = Response<R>> + Send + 'static,
    S::Future: Send + 'static,
    Q: Send + 'static,
    R: From<&'static str> + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Q>) -> Self::Future {
        let claims = Claims::from_extensions(request.extensions_mut());

        let mut set_xcto = match claims.claim(header::X_CONTENT_TYPE_OPTIONS) {
            Ok(setter) => setter,
            Err(err) => return Box::pin(async move { Error::make_layer_error(err) }),
        };
        set_xcto.set([HeaderValue::from_static("nosniff")]);

        let mut set_xxp = match claims.claim(header::X_XSS_PROTECTION) {
            Ok(setter) => setter,
            Err(err) => return Box::pin(async move { Error::make_layer_error(err) }),
        };
        set_xxp.set([HeaderValue::from_static("0")]);

        let future = self.inner.call(request);

        Box::pin(async move {
            let mut response = future.await?;

            set_xcto.apply(response.headers_mut());
            set_xxp.apply(response.headers_mut());

            Ok(response)
        })
    }
}
