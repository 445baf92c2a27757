//! `enode://` address descriptors

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

/// URL scheme of an advertised node descriptor.
pub const ENODE_SCHEME: &str = "enode";

/// Public routing identifier of a node: the uncompressed secp256k1 public
/// key without its leading `0x04` tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; 64]);

impl NodeId {
    pub const LEN: usize = 64;

    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = hex::encode(self.0);
        write!(f, "NodeId({}..)", &full[..16])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnodeParseError {
    #[error("missing `enode://` scheme")]
    Scheme,
    #[error("missing '@' between node id and address")]
    MissingAddress,
    #[error("node id must be {expected} hex characters, got {actual}")]
    IdLength { expected: usize, actual: usize },
    #[error("node id is not valid hex: {0}")]
    IdHex(String),
    #[error("invalid socket address {0:?}")]
    Address(String),
}

/// Connection descriptor a node advertises to its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enode {
    pub id: NodeId,
    pub addr: SocketAddr,
}

impl Enode {
    pub fn new(id: NodeId, ip: IpAddr, port: u16) -> Self {
        Self {
            id,
            addr: SocketAddr::new(ip, port),
        }
    }
}

impl fmt::Display for Enode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}@{}", ENODE_SCHEME, self.id, self.addr)
    }
}

impl FromStr for Enode {
    type Err = EnodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(ENODE_SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or(EnodeParseError::Scheme)?;
        let (id_hex, addr) = rest
            .split_once('@')
            .ok_or(EnodeParseError::MissingAddress)?;

        if id_hex.len() != NodeId::LEN * 2 {
            return Err(EnodeParseError::IdLength {
                expected: NodeId::LEN * 2,
                actual: id_hex.len(),
            });
        }
        let mut id = [0u8; 64];
        hex::decode_to_slice(id_hex, &mut id)
            .map_err(|e| EnodeParseError::IdHex(e.to_string()))?;

        // Discovery query parameters (`?discport=`) carry nothing we advertise
        let addr = addr.split_once('?').map_or(addr, |(a, _)| a);
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|_| EnodeParseError::Address(addr.to_string()))?;

        Ok(Self {
            id: NodeId(id),
            addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn sample_id() -> NodeId {
        let mut bytes = [0u8; 64];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        NodeId::from_bytes(bytes)
    }

    #[test]
    fn test_display_ipv4() {
        let enode = Enode::new(sample_id(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)), 30303);
        let rendered = enode.to_string();
        assert!(rendered.starts_with("enode://000102030405"));
        assert!(rendered.ends_with("3e3f@10.0.0.7:30303"));
        assert_eq!(rendered.len(), "enode://".len() + 128 + "@10.0.0.7:30303".len());
    }

    #[test]
    fn test_display_ipv6_is_bracketed() {
        let enode = Enode::new(sample_id(), IpAddr::V6(Ipv6Addr::LOCALHOST), 30303);
        assert!(enode.to_string().ends_with("@[::1]:30303"));
    }

    #[test]
    fn test_parse_display_output() {
        let enode = Enode::new(sample_id(), IpAddr::V4(Ipv4Addr::LOCALHOST), 30301);
        let parsed: Enode = enode.to_string().parse().unwrap();
        assert_eq!(parsed, enode);
    }

    #[test]
    fn test_parse_ignores_discport() {
        let raw = format!("enode://{}@1.1.1.1:30303?discport=30301", sample_id());
        let parsed: Enode = raw.parse().unwrap();
        assert_eq!(parsed.addr.port(), 30303);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "http://x@1.1.1.1:1".parse::<Enode>(),
            Err(EnodeParseError::Scheme)
        );
        assert_eq!(
            "enode://abcd".parse::<Enode>(),
            Err(EnodeParseError::MissingAddress)
        );
        assert!(matches!(
            "enode://a@1.1.1.1:30303".parse::<Enode>(),
            Err(EnodeParseError::IdLength { actual: 1, .. })
        ));
        let bad_addr = format!("enode://{}@nowhere", sample_id());
        assert!(matches!(
            bad_addr.parse::<Enode>(),
            Err(EnodeParseError::Address(_))
        ));
    }
}
