// src/server/handler.rs
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;

use crate::proxy::HealthProxy;

#[derive(Clone)]
pub struct RequestHandler {
    proxy: Arc<HealthProxy>,
}

impl RequestHandler {
    pub fn new(proxy: Arc<HealthProxy>) -> Self {
        Self { proxy }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let proxy = self.proxy.clone();
        let span = tracing::info_span!(
            "request",
            id = %uuid::Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                match proxy.handle(req).await {
                    Ok(response) => Ok(response),
                    Err(e) => {
                        tracing::error!(%e, "failed to answer health query");
                        Ok(e.into())
                    }
                }
            }
            .instrument(span),
        )
    }
}
