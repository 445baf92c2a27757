//! Core shared types for catena peer discovery
//!
//! This crate contains the pieces every catena process agrees on:
//! the etcd key layout for a cluster, the `enode://` address descriptor
//! a node advertises, and the derivation of a node's public identifier
//! from its node key file.

mod enode;
mod identity;
mod names;

pub use enode::{Enode, EnodeParseError, NodeId, ENODE_SCHEME};
pub use identity::{load_node_id, node_id_from_hex, IdentityError};
pub use names::{ClusterName, NameError, NodeName, ECOSYSTEM_PREFIX, ENODE_SEGMENT};
