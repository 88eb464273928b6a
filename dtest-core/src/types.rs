//! Identifiers and addressing for simulated nodes.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Identifier of a simulated node. Clusters number their nodes from 1.
pub type NodeId = u32;

/// Integer tag identifying a message's logical type.
pub type Verb = u32;

/// Node address (IPv4/IPv6 + port).
///
/// # Examples
///
/// ```
/// use dtest_core::AddressAndPort;
/// use std::net::{IpAddr, Ipv4Addr};
///
/// let addr = AddressAndPort::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 7012);
/// assert_eq!(addr.to_string(), "127.0.0.1:7012");
/// assert_eq!(AddressAndPort::parse("127.0.0.1:7012").ok(), Some(addr));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressAndPort {
    /// IP address (IPv4 or IPv6).
    pub address: IpAddr,
    /// Port number.
    pub port: u16,
}

impl AddressAndPort {
    /// Create a new address.
    pub const fn new(address: IpAddr, port: u16) -> Self {
        Self { address, port }
    }

    /// Parse from `ip:port`, or `[ip]:port` for IPv6.
    ///
    /// # Errors
    ///
    /// Returns an error if the IP or the port cannot be parsed.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let (ip_str, port_str) = if let Some(rest) = s.strip_prefix('[') {
            let (ip, tail) = rest
                .split_once(']')
                .ok_or(AddressParseError::InvalidIp)?;
            let port = tail
                .strip_prefix(':')
                .ok_or(AddressParseError::MissingPort)?;
            (ip, port)
        } else {
            s.rsplit_once(':').ok_or(AddressParseError::MissingPort)?
        };

        let address: IpAddr = ip_str.parse().map_err(|_| AddressParseError::InvalidIp)?;
        let port: u16 = port_str
            .parse()
            .map_err(|_| AddressParseError::InvalidPort)?;
        Ok(Self::new(address, port))
    }
}

impl std::fmt::Display for AddressAndPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.address {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

impl std::str::FromStr for AddressAndPort {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error parsing an [`AddressAndPort`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// The IP address could not be parsed.
    #[error("invalid IP address")]
    InvalidIp,
    /// The port number could not be parsed.
    #[error("invalid port number")]
    InvalidPort,
    /// No port separator (`:`) found in the input.
    #[error("missing port separator")]
    MissingPort,
}
