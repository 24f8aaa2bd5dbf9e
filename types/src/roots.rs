//! Commitment roots computed by the backend for display and audit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::TypesError;

/// A 32-byte Merkle root (`nf_root` or `cmx_root`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommitmentRoot([u8; 32]);

impl CommitmentRoot {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TypesError::InvalidRoot(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| TypesError::InvalidRoot(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CommitmentRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for CommitmentRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CommitmentRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The pair of roots the backend derives after a download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRoots {
    pub nf_root: Option<CommitmentRoot>,
    pub cmx_root: Option<CommitmentRoot>,
}

impl CommitmentRoots {
    pub fn is_empty(&self) -> bool {
        self.nf_root.is_none() && self.cmx_root.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_of_wrong_length_is_rejected() {
        assert!(CommitmentRoot::from_hex("abcd").is_err());
        assert!(CommitmentRoot::from_hex("zz").is_err());
    }

    #[test]
    fn hex_is_lowercase_and_stable() {
        let root = CommitmentRoot::from_hex(&"AB".repeat(32)).unwrap();
        assert_eq!(root.to_hex(), "ab".repeat(32));
        assert_eq!(root.as_bytes()[0], 0xab);
    }
}
