/* src/lib.rs */
//! # Remote Address Resolver
//!
//! A lightweight library for resolving the effective client address of
//! proxied HTTP requests from the `X-Forwarded-For` chain, skipping trusted
//! internal hops, with a fallback to the remote socket address.
//!
//! ## Features
//!
//! - Resolve the client address from the rightmost hops of an
//!   `X-Forwarded-For` chain
//! - Step back past an internal load-balancer hop, or walk the whole chain
//!   of trusted proxies
//! - Prefix-based or CIDR-range trust policies (IPv4 and IPv6)
//! - Fallback to the remote socket address; the port always comes from it
//! - Optional Axum middleware and extractor integration via the `axum`
//!   feature
//!
//! ## Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use remote_addr::resolve_remote_addr;
//! use std::net::SocketAddr;
//!
//! let peer: SocketAddr = "192.0.2.1:443".parse().unwrap();
//!
//! // The trailing hop belongs to an internal load balancer, so the
//! // entry before it wins; the port is always the peer's.
//! let resolved = resolve_remote_addr(Some("203.0.113.7, 10.0.0.5"), peer);
//! assert_eq!(resolved.host(), "203.0.113.7");
//! assert_eq!(resolved.port(), 443);
//! ```

pub mod error;
pub mod resolver;
pub mod trust;

#[cfg(feature = "axum")]
pub mod middleware;

pub use error::{RemoteAddrError, Result};
pub use resolver::{
    AddrResolver, ForwardedChain, ResolvedAddr, X_FORWARDED_FOR, resolve_remote_addr,
};
pub use trust::TrustPolicy;

#[cfg(feature = "axum")]
pub use middleware::{ResolvedAddrLayer, ResolvedAddrService};

/// Re-export commonly used types
pub use std::net::SocketAddr;
