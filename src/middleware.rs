/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, Request},
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    net::SocketAddr,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::resolver::{AddrResolver, ResolvedAddr, X_FORWARDED_FOR};
use crate::trust::TrustPolicy;

/// Layer that resolves the effective client address for every request.
///
/// The service reads the raw `X-Forwarded-For` value and the peer socket
/// address, runs the resolver, and stores the result as a request extension.
/// When the resolved host is an IP literal the `ConnectInfo<SocketAddr>`
/// extension is replaced as well, so downstream handlers that look at the
/// standard connection info see the resolved address instead of the proxy's.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use remote_addr::ResolvedAddrLayer;
/// use tower::ServiceBuilder;
///
/// # async fn handler() {}
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(ServiceBuilder::new().layer(ResolvedAddrLayer::default()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolvedAddrLayer {
    resolver: AddrResolver,
}

impl ResolvedAddrLayer {
    /// Create a layer with the default single-step skip behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer with a custom resolver configuration.
    pub fn with_resolver(resolver: AddrResolver) -> Self {
        Self { resolver }
    }

    /// Create a layer that trusts every private range and walks the whole
    /// chain of trusted hops.
    pub fn private_ranges() -> Self {
        Self {
            resolver: AddrResolver::new()
                .with_trust(TrustPolicy::private_ranges())
                .skip_all_trusted(true),
        }
    }
}

impl<S> Layer<S> for ResolvedAddrLayer {
    type Service = ResolvedAddrService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResolvedAddrService {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

/// Service that resolves client addresses.
#[derive(Debug, Clone)]
pub struct ResolvedAddrService<S> {
    inner: S,
    resolver: AddrResolver,
}

impl<S> Service<Request> for ResolvedAddrService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let header = req
            .headers()
            .get(X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        // Without ConnectInfo there is no peer to fall back to and no port
        // source, so the request passes through untouched.
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0);

        if let Some(peer) = peer {
            let resolved = self.resolver.resolve(header.as_deref(), peer);
            if let Some(addr) = resolved.socket_addr() {
                req.extensions_mut().insert(ConnectInfo(addr));
            }
            req.extensions_mut().insert(resolved);
        }

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

/// Axum extractor for the resolved client address.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use remote_addr::{ResolvedAddr, ResolvedAddrLayer};
///
/// async fn handler(resolved: ResolvedAddr) -> String {
///     format!("client: {resolved}")
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(ResolvedAddrLayer::default());
/// ```
impl<S> axum::extract::FromRequestParts<S> for ResolvedAddr
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<ResolvedAddr>() {
            Ok(resolved.clone())
        } else {
            // Fallback to connection info if available
            if let Some(connect_info) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
                Ok(ResolvedAddr::from(connect_info.0))
            } else {
                // Default fallback
                Ok(ResolvedAddr::from(SocketAddr::from(([127, 0, 0, 1], 0))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, routing::get};
    use tower::ServiceExt;

    async fn resolved_handler(resolved: ResolvedAddr) -> String {
        resolved.to_string()
    }

    async fn connect_info_handler(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> String {
        addr.to_string()
    }

    fn request(header: Option<&str>, peer: &str) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    async fn body_string(app: Router, req: HttpRequest<Body>) -> String {
        let response = app.oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_extension_holds_resolved_address() {
        let app = Router::new()
            .route("/", get(resolved_handler))
            .layer(ResolvedAddrLayer::default());

        let body = body_string(app, request(Some("203.0.113.7, 10.0.0.5"), "192.0.2.1:8080")).await;
        assert_eq!(body, "203.0.113.7:8080");
    }

    #[tokio::test]
    async fn test_connect_info_is_replaced_not_supplemented() {
        let app = Router::new()
            .route("/", get(connect_info_handler))
            .layer(ResolvedAddrLayer::default());

        let body = body_string(app, request(Some("203.0.113.7, 10.0.0.5"), "192.0.2.1:8080")).await;
        assert_eq!(body, "203.0.113.7:8080");
    }

    #[tokio::test]
    async fn test_missing_header_falls_back_to_peer() {
        let app = Router::new()
            .route("/", get(resolved_handler))
            .layer(ResolvedAddrLayer::default());

        let body = body_string(app, request(None, "192.0.2.1:8080")).await;
        assert_eq!(body, "192.0.2.1:8080");
    }

    #[tokio::test]
    async fn test_hostname_token_keeps_original_connect_info() {
        let app = Router::new()
            .route("/", get(connect_info_handler))
            .layer(ResolvedAddrLayer::default());

        let body = body_string(app, request(Some("edge.example.com"), "192.0.2.1:8080")).await;
        assert_eq!(body, "192.0.2.1:8080");
    }

    #[tokio::test]
    async fn test_private_ranges_layer_walks_whole_chain() {
        let app = Router::new()
            .route("/", get(resolved_handler))
            .layer(ResolvedAddrLayer::private_ranges());

        let body = body_string(
            app,
            request(Some("203.0.113.7, 192.168.1.10, 10.0.0.5"), "192.0.2.1:8080"),
        )
        .await;
        assert_eq!(body, "203.0.113.7:8080");
    }
}
