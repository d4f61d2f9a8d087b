use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{request::Parts, Method, Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Limited};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower_service::Service;

use crate::{
    form, token,
    xsrf::{original_uri, request_host, request_path, Config},
    BoxError, Error,
};

#[derive(Clone)]
pub struct GuardService<S> {
    inner: S,
}

impl<S> GuardService<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Checks the token carried by the body and returns the buffered body so
    /// that it can be handed to the inner service.
    pub(crate) async fn validate<B>(config: &Config, parts: &Parts, body: B) -> Result<Bytes, Error>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let user_id = config.user_id().await?;

        let body = Limited::new(body, config.body_limit)
            .collect()
            .await
            .map_err(|err| {
                tracing::debug!(err = %err, "couldn't buffer request body");
                Error::TokenNotPresent
            })?
            .to_bytes();

        let presented = form::extract(&parts.headers, body.clone(), &config.field_name)
            .await
            .ok_or(Error::TokenNotPresent)?;

        let uri = original_uri(&parts.extensions, &parts.uri);
        let host = request_host(&parts.headers, uri);
        let expected = token::sign(&config.secret, host, &request_path(uri), &user_id)?;

        if !token::verify(&presented, &expected) {
            return Err(Error::TokenMismatch);
        }

        Ok(body)
    }
}

impl<S, B, R> Service<Request<B>> for GuardService<S>
where
    S: Service<Request<B>, Response = Response<R>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Body + From<Bytes> + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    R: From<&'static str> + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        if ![Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(request.method()) {
            tracing::trace!(method = %request.method(), "not guarded");
            return Box::pin(self.inner.call(request));
        }

        // The ready service is the one we were polled with, keep it for this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let config = match request
                .extensions()
                .get::<Arc<Config>>()
                .cloned()
                .ok_or(Error::ExtensionNotFound("Config".into()))
            {
                Ok(config) => config,
                Err(err) => return Error::make_layer_error(err),
            };

            let (parts, body) = request.into_parts();

            let body = match GuardService::<S>::validate(&config, &parts, body).await {
                Ok(body) => body,
                Err(err) => return err.make_layer_rejection(),
            };

            inner.call(Request::from_parts(parts, B::from(body))).await
        })
    }
}
