//! Node identity derivation
//!
//! A node key file holds a hex-encoded secp256k1 private key (the format
//! geth writes to `<datadir>/geth/nodekey`). The advertised node id is the
//! matching public key.

use crate::enode::NodeId;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to read node key {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("node key must be 64 hex characters, got {0}")]
    Length(usize),
    #[error("node key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("node key is not a valid secp256k1 secret: {0}")]
    Key(#[from] secp256k1::Error),
}

/// Load the node key at `path` and derive the node id it advertises.
pub fn load_node_id(path: impl AsRef<Path>) -> Result<NodeId, IdentityError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| IdentityError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    node_id_from_hex(&raw)
}

/// Derive a node id from the hex text of a private key. Surrounding
/// whitespace is ignored.
pub fn node_id_from_hex(key_hex: &str) -> Result<NodeId, IdentityError> {
    let key_hex = key_hex.trim();
    if key_hex.len() != 64 {
        return Err(IdentityError::Length(key_hex.len()));
    }

    let mut secret = [0u8; 32];
    hex::decode_to_slice(key_hex, &mut secret)?;
    let secret = SecretKey::from_slice(&secret)?;

    let secp = Secp256k1::signing_only();
    let public = PublicKey::from_secret_key(&secp, &secret).serialize_uncompressed();

    let mut id = [0u8; 64];
    id.copy_from_slice(&public[1..]);
    Ok(NodeId::from_bytes(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Secret key 1 maps to the curve generator point G
    const ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const GENERATOR: &str = concat!(
        "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
    );

    #[test]
    fn test_generator_vector() {
        let id = node_id_from_hex(ONE).unwrap();
        assert_eq!(id.to_string(), GENERATOR);
    }

    #[test]
    fn test_load_from_file_with_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", ONE).unwrap();

        let id = load_node_id(file.path()).unwrap();
        assert_eq!(id.to_string(), GENERATOR);
    }

    #[test]
    fn test_missing_file() {
        let err = load_node_id("/nonexistent/catena/nodekey").unwrap_err();
        assert!(matches!(err, IdentityError::Read { .. }));
    }

    #[test]
    fn test_malformed_keys() {
        assert!(matches!(
            node_id_from_hex("abcd"),
            Err(IdentityError::Length(4))
        ));
        let not_hex = "zz".repeat(32);
        assert!(matches!(node_id_from_hex(&not_hex), Err(IdentityError::Hex(_))));
        // Zero is outside the valid scalar range
        let zero = "0".repeat(64);
        assert!(matches!(node_id_from_hex(&zero), Err(IdentityError::Key(_))));
    }
}
