/* src/resolver.rs */

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::trust::TrustPolicy;

/// Name of the forwarding header this crate consumes.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// An `X-Forwarded-For` hop chain, split on `,` with each token trimmed.
///
/// Order is preserved as received: the leftmost token is the original client
/// by convention, the rightmost token is the proxy hop nearest this server.
/// Tokens that are empty after trimming are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedChain<'a> {
    hops: Vec<&'a str>,
}

impl<'a> ForwardedChain<'a> {
    /// Parse a raw header value into a chain. A chain always has at least
    /// one token: splitting an empty value yields a single empty token.
    pub fn parse(raw: &'a str) -> Self {
        Self {
            hops: raw.split(',').map(str::trim).collect(),
        }
    }

    /// The rightmost token: the hop appended by the proxy nearest this server.
    pub fn last(&self) -> Option<&'a str> {
        self.hops.last().copied()
    }

    /// The second-to-last token, if the chain has at least two hops.
    pub fn prior(&self) -> Option<&'a str> {
        self.hops.len().checked_sub(2).map(|i| self.hops[i])
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Iterate hops left to right.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a str> + '_ {
        self.hops.iter().copied()
    }
}

/// The resolved client address: a host paired with the peer's port.
///
/// The host is kept as received from the header, so it may be an IP literal
/// or a hostname; the port always comes from the transport-layer peer
/// because the header carries no port information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddr {
    host: String,
    port: u16,
}

impl ResolvedAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The host as an IP address, if it parses as one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }

    /// The full socket address, if the host is an IP literal.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip().map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl From<SocketAddr> for ResolvedAddr {
    fn from(peer: SocketAddr) -> Self {
        Self {
            host: peer.ip().to_string(),
            port: peer.port(),
        }
    }
}

impl fmt::Display for ResolvedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip() {
            Some(IpAddr::V6(v6)) => write!(f, "[{}]:{}", v6, self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

/// Configuration for forwarded-address resolution.
///
/// The default resolver takes the rightmost hop of the chain and steps back
/// past at most one trusted hop. The rightmost entry is used rather than the
/// conventional leftmost one because each proxy can only vouch for who
/// connected to it; earlier entries are client-controlled claims.
#[derive(Debug, Clone, Default)]
pub struct AddrResolver {
    /// Policy classifying a hop token as internal/trusted.
    trust: TrustPolicy,
    /// Walk the whole chain from the right instead of stepping back once.
    skip_all_trusted: bool,
}

impl AddrResolver {
    /// Create a resolver with the default single-step skip behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trust policy used to classify hop tokens.
    pub fn with_trust(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }

    /// Skip every trusted hop from the right and take the first untrusted
    /// token, instead of stepping back exactly once. When every hop is
    /// trusted the resolver degrades to the peer address.
    pub fn skip_all_trusted(mut self, skip_all: bool) -> Self {
        self.skip_all_trusted = skip_all;
        self
    }

    /// Resolve the effective client address from the raw `X-Forwarded-For`
    /// value and the transport-layer peer.
    ///
    /// This never fails: an absent header resolves to the peer itself, and a
    /// malformed token is carried through as a host string without
    /// validation. The resolved port is always `peer.port()`.
    pub fn resolve(&self, header: Option<&str>, peer: SocketAddr) -> ResolvedAddr {
        let Some(raw) = header else {
            return ResolvedAddr::from(peer);
        };

        let chain = ForwardedChain::parse(raw);
        let candidate = if self.skip_all_trusted {
            self.hops_from_edge(&chain)
        } else {
            self.step_back_once(&chain)
        };

        match candidate {
            Some(host) => ResolvedAddr::new(host, peer.port()),
            None => ResolvedAddr::from(peer),
        }
    }

    /// Single-step skip: use the last hop, unless the chain has at least two
    /// hops and the last one is trusted, in which case use the one before
    /// it. Not recursive: the prior hop is used even if itself trusted.
    fn step_back_once<'a>(&self, chain: &ForwardedChain<'a>) -> Option<&'a str> {
        let last = chain.last()?;
        if chain.len() >= 2 && self.trust.is_trusted(last) {
            chain.prior()
        } else {
            Some(last)
        }
    }

    /// Generalized walk: the first hop from the right that falls outside the
    /// trust policy.
    fn hops_from_edge<'a>(&self, chain: &ForwardedChain<'a>) -> Option<&'a str> {
        chain.iter().rev().find(|hop| !self.trust.is_trusted(hop))
    }
}

/// Convenience function resolving with the default configuration.
///
/// This is a shortcut for `AddrResolver::default().resolve(header, peer)`.
///
/// # Arguments
///
/// * `header` - Raw value of the `X-Forwarded-For` header, if present
/// * `peer` - The remote socket address of the accepted connection
///
/// # Examples
///
/// ```rust
/// use remote_addr::resolve_remote_addr;
/// use std::net::SocketAddr;
///
/// let peer: SocketAddr = "192.0.2.1:443".parse().unwrap();
///
/// let resolved = resolve_remote_addr(Some("203.0.113.7, 10.0.0.5"), peer);
/// assert_eq!(resolved.host(), "203.0.113.7");
/// assert_eq!(resolved.port(), 443);
/// ```
pub fn resolve_remote_addr(header: Option<&str>, peer: SocketAddr) -> ResolvedAddr {
    AddrResolver::default().resolve(header, peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "192.0.2.1:8080".parse().unwrap()
    }

    #[test]
    fn test_absent_header_falls_back_to_peer() {
        let resolved = resolve_remote_addr(None, peer());
        assert_eq!(resolved, ResolvedAddr::from(peer()));
        assert_eq!(resolved.host(), "192.0.2.1");
        assert_eq!(resolved.port(), 8080);
    }

    #[test]
    fn test_single_entry_is_used() {
        let resolved = resolve_remote_addr(Some("203.0.113.7"), peer());
        assert_eq!(resolved, ResolvedAddr::new("203.0.113.7", 8080));
    }

    #[test]
    fn test_trailing_internal_hop_is_skipped() {
        let resolved = resolve_remote_addr(Some("203.0.113.7, 10.0.0.5"), peer());
        assert_eq!(resolved.host(), "203.0.113.7");
    }

    #[test]
    fn test_skip_is_not_recursive() {
        let resolved = resolve_remote_addr(Some("10.0.0.9, 10.0.0.5"), peer());
        assert_eq!(resolved.host(), "10.0.0.9");
    }

    #[test]
    fn test_external_last_hop_is_used_as_is() {
        let resolved = resolve_remote_addr(Some("10.0.0.9, 203.0.113.7"), peer());
        assert_eq!(resolved.host(), "203.0.113.7");
    }

    #[test]
    fn test_single_internal_entry_cannot_be_skipped() {
        let resolved = resolve_remote_addr(Some("10.0.0.5"), peer());
        assert_eq!(resolved.host(), "10.0.0.5");
    }

    #[test]
    fn test_tokens_are_trimmed() {
        let resolved = resolve_remote_addr(Some(" 203.0.113.7 , 10.0.0.5 "), peer());
        assert_eq!(resolved.host(), "203.0.113.7");
    }

    #[test]
    fn test_port_always_comes_from_peer() {
        let peer: SocketAddr = "192.0.2.1:65535".parse().unwrap();
        for header in [None, Some("203.0.113.7"), Some("203.0.113.7, 10.0.0.5")] {
            assert_eq!(resolve_remote_addr(header, peer).port(), 65535);
        }
    }

    #[test]
    fn test_empty_header_yields_empty_host() {
        let resolved = resolve_remote_addr(Some(""), peer());
        assert_eq!(resolved.host(), "");
        assert_eq!(resolved.port(), 8080);
        assert_eq!(resolved.socket_addr(), None);
    }

    #[test]
    fn test_hostname_token_passes_through_unvalidated() {
        let resolved = resolve_remote_addr(Some("edge.example.com, 10.0.0.5"), peer());
        assert_eq!(resolved.host(), "edge.example.com");
        assert_eq!(resolved.ip(), None);
    }

    #[test]
    fn test_skip_all_trusted_walks_past_every_internal_hop() {
        let resolver = AddrResolver::new().skip_all_trusted(true);
        let resolved = resolver.resolve(Some("203.0.113.7, 10.0.0.5, 10.0.0.9"), peer());
        assert_eq!(resolved.host(), "203.0.113.7");
    }

    #[test]
    fn test_skip_all_trusted_degrades_when_whole_chain_is_internal() {
        let resolver = AddrResolver::new().skip_all_trusted(true);
        let resolved = resolver.resolve(Some("10.0.0.5, 10.0.0.9"), peer());
        assert_eq!(resolved, ResolvedAddr::from(peer()));
    }

    #[test]
    fn test_network_policy_skips_hops_the_prefix_rule_misses() {
        let resolver = AddrResolver::new().with_trust(TrustPolicy::private_ranges());
        let resolved = resolver.resolve(Some("203.0.113.7, 192.168.1.10"), peer());
        assert_eq!(resolved.host(), "203.0.113.7");
    }

    #[test]
    fn test_chain_parse_preserves_order_and_empty_tokens() {
        let chain = ForwardedChain::parse("a, ,b");
        assert_eq!(chain.iter().collect::<Vec<_>>(), vec!["a", "", "b"]);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.last(), Some("b"));
        assert_eq!(chain.prior(), Some(""));
    }

    #[test]
    fn test_chain_of_one_has_no_prior() {
        let chain = ForwardedChain::parse("203.0.113.7");
        assert_eq!(chain.last(), Some("203.0.113.7"));
        assert_eq!(chain.prior(), None);
    }

    #[test]
    fn test_resolved_addr_display_brackets_ipv6() {
        assert_eq!(ResolvedAddr::new("2001:db8::1", 443).to_string(), "[2001:db8::1]:443");
        assert_eq!(ResolvedAddr::new("203.0.113.7", 443).to_string(), "203.0.113.7:443");
        assert_eq!(ResolvedAddr::new("edge.example.com", 443).to_string(), "edge.example.com:443");
    }
}
