//! The rendered configuration document and its content hash.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 of a document's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash arbitrary bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

/// Configuration handed to the simulator process.
///
/// Only [`Renderer`](crate::Renderer) constructs documents, so every document
/// in circulation passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    content: String,
    hash: ContentHash,
}

impl ConfigDocument {
    pub(crate) fn new(content: String) -> Self {
        let hash = ContentHash::of(content.as_bytes());
        Self { content, hash }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    #[must_use]
    pub const fn hash(&self) -> ContentHash {
        self.hash
    }
}
