/* src/error.rs */

use thiserror::Error;

/// Result type alias for operations that may fail with `RemoteAddrError`.
pub type Result<T> = std::result::Result<T, RemoteAddrError>;

/// Errors that can occur while configuring address resolution.
///
/// Resolution itself never fails; the only fallible operation is building a
/// trust policy from CIDR strings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteAddrError {
    /// A trusted-network range could not be parsed as CIDR notation.
    #[error("Invalid trusted network range: {0}")]
    InvalidNetwork(String),
}
