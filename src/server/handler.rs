// src/server/handler.rs
use crate::config::ServerConfig;
use crate::metrics::MetricsRegistry;
use crate::report::CycleSummary;
use arc_swap::ArcSwapOption;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

/// Serves metrics, the last cycle summary and a liveness probe.
#[derive(Clone)]
pub struct StatusHandler {
    registry: Arc<MetricsRegistry>,
    latest: Arc<ArcSwapOption<CycleSummary>>,
    metrics_path: Arc<str>,
    status_path: Arc<str>,
}

impl StatusHandler {
    pub fn new(
        config: &ServerConfig,
        registry: Arc<MetricsRegistry>,
        latest: Arc<ArcSwapOption<CycleSummary>>,
    ) -> Self {
        Self {
            registry,
            latest,
            metrics_path: config.metrics_path.as_str().into(),
            status_path: config.status_path.as_str().into(),
        }
    }

    pub fn respond(&self, req: &Request<Body>) -> Response<Body> {
        if *req.method() != Method::GET {
            return text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }

        let path = req.uri().path();
        if path == &*self.metrics_path {
            self.metrics()
        } else if path == &*self.status_path {
            self.status()
        } else if path == "/health" {
            text(StatusCode::OK, "OK")
        } else {
            text(StatusCode::NOT_FOUND, "Not Found")
        }
    }

    fn metrics(&self) -> Response<Body> {
        match self.registry.gather() {
            Ok(buffer) => with_content_type(
                Response::new(Body::from(buffer)),
                "text/plain; version=0.0.4",
            ),
            Err(e) => {
                tracing::error!("Failed to encode metrics: {}", e);
                text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    fn status(&self) -> Response<Body> {
        let Some(summary) = self.latest.load_full() else {
            return text(StatusCode::SERVICE_UNAVAILABLE, "No cycle completed yet");
        };

        match serde_json::to_vec(summary.as_ref()) {
            Ok(json) => with_content_type(Response::new(Body::from(json)), "application/json"),
            Err(e) => {
                tracing::error!("Failed to serialize status: {}", e);
                text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

fn text(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = with_content_type(Response::new(Body::from(message)), "text/plain");
    *response.status_mut() = status;
    response
}

fn with_content_type(mut response: Response<Body>, content_type: &'static str) -> Response<Body> {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

impl Service<Request<Body>> for StatusHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        futures::future::ready(Ok(self.respond(&req)))
    }
}
