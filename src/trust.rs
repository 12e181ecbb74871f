/* src/trust.rs */

use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{RemoteAddrError, Result};

/// Policy classifying a forwarded hop token as internal/trusted.
///
/// The default policy is textual: a token is internal iff it starts with the
/// literal prefix `10.`. For real deployments, [`TrustPolicy::networks`]
/// evaluates proper address-range containment over a configurable list of
/// IPv4/IPv6 CIDR ranges instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Token is trusted iff its textual form starts with this prefix.
    /// No address parsing is performed.
    Prefix(String),
    /// Token is trusted iff it parses as an IP address contained in one of
    /// these ranges. Tokens that do not parse are never trusted.
    Networks(Vec<IpNet>),
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::Prefix("10.".to_string())
    }
}

impl TrustPolicy {
    /// Trust tokens starting with the given literal prefix.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Trust addresses contained in any of the given ranges.
    pub fn networks(nets: impl IntoIterator<Item = IpNet>) -> Self {
        Self::Networks(nets.into_iter().collect())
    }

    /// Trust addresses contained in any of the given CIDR strings,
    /// e.g. `["10.0.0.0/8", "fd00::/8"]`.
    pub fn from_cidrs<I, S>(cidrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nets = cidrs
            .into_iter()
            .map(|cidr| {
                let cidr = cidr.as_ref();
                cidr.parse()
                    .map_err(|_| RemoteAddrError::InvalidNetwork(cidr.to_string()))
            })
            .collect::<Result<Vec<IpNet>>>()?;
        Ok(Self::Networks(nets))
    }

    /// Trust every private, loopback, and link-local range, IPv4 and IPv6.
    pub fn private_ranges() -> Self {
        let cidr_blocks = [
            "127.0.0.0/8",    // localhost
            "10.0.0.0/8",     // 24-bit block
            "172.16.0.0/12",  // 20-bit block
            "192.168.0.0/16", // 16-bit block
            "169.254.0.0/16", // link local address
            "::1/128",        // localhost IPv6
            "fc00::/7",       // unique local address IPv6
            "fe80::/10",      // link local address IPv6
        ];

        Self::Networks(
            cidr_blocks
                .iter()
                .filter_map(|cidr| cidr.parse().ok())
                .collect(),
        )
    }

    /// Whether the given hop token is classified as internal/trusted.
    pub fn is_trusted(&self, token: &str) -> bool {
        match self {
            Self::Prefix(prefix) => token.starts_with(prefix.as_str()),
            Self::Networks(nets) => match token.parse::<IpAddr>() {
                Ok(ip) => nets.iter().any(|net| net.contains(&ip)),
                Err(_) => false,
            },
        }
    }
}
