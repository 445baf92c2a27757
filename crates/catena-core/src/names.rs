//! Cluster namespace and key layout
//!
//! Every registration lives at `ethereum/<cluster>/enode/<node>`. Names are
//! validated so that one cluster's prefix can never match another cluster's
//! keys.

use std::fmt;
use thiserror::Error;

/// First key segment shared by every catena cluster.
pub const ECOSYSTEM_PREFIX: &str = "ethereum";

/// Key segment under which node descriptors are stored.
pub const ENODE_SEGMENT: &str = "enode";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("{kind} name must not be empty")]
    Empty { kind: &'static str },
    #[error("{kind} name {name:?} must not contain '/'")]
    Separator { kind: &'static str, name: String },
    #[error("{kind} name {name:?} is reserved")]
    Reserved { kind: &'static str, name: String },
    #[error("{kind} name {name:?} contains whitespace or control characters")]
    InvalidCharacter { kind: &'static str, name: String },
}

fn validate(kind: &'static str, name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty { kind });
    }
    if name.contains('/') {
        return Err(NameError::Separator {
            kind,
            name: name.to_string(),
        });
    }
    if name == "." || name == ".." {
        return Err(NameError::Reserved {
            kind,
            name: name.to_string(),
        });
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(NameError::InvalidCharacter {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Human-readable cluster (chain) name identifying a discovery namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterName(String);

impl ClusterName {
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate("cluster", &name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix covering every registration in this cluster, trailing `/` included.
    pub fn prefix(&self) -> String {
        format!("{}/{}/{}/", ECOSYSTEM_PREFIX, self.0, ENODE_SEGMENT)
    }

    /// Key of a single node's registration in this cluster.
    pub fn node_key(&self, node: &NodeName) -> String {
        format!("{}{}", self.prefix(), node.as_str())
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-node identity inside a cluster, typically the hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName(String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate("node", &name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let cluster = ClusterName::new("catena").unwrap();
        let node = NodeName::new("geth-0").unwrap();
        assert_eq!(cluster.prefix(), "ethereum/catena/enode/");
        assert_eq!(cluster.node_key(&node), "ethereum/catena/enode/geth-0");
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert_eq!(
            ClusterName::new(""),
            Err(NameError::Empty { kind: "cluster" })
        );
        assert!(matches!(
            ClusterName::new("a/b"),
            Err(NameError::Separator { .. })
        ));
        assert!(matches!(
            NodeName::new(".."),
            Err(NameError::Reserved { .. })
        ));
        assert!(matches!(
            NodeName::new("host 1"),
            Err(NameError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn test_prefixes_do_not_overlap() {
        // "cat" is a string prefix of "catena", the key prefixes must still be disjoint
        let names = ["catena", "cat", "other", "catena-2"];
        let node = NodeName::new("n1").unwrap();

        for a in names {
            for b in names {
                if a == b {
                    continue;
                }
                let a = ClusterName::new(a).unwrap();
                let b = ClusterName::new(b).unwrap();
                assert!(
                    !b.node_key(&node).starts_with(&a.prefix()),
                    "{} leaks into {}",
                    b,
                    a
                );
            }
        }
    }
}
