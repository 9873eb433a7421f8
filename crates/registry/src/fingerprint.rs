//! Content fingerprints.

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> String {
	hex::encode(Sha256::digest(bytes.as_ref()))
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn hash_file(path: &Path) -> io::Result<String> {
	fs::read(path).map(hash_bytes)
}
