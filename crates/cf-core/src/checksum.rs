//! Checksums of rendered SQL, the basis of drift detection.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of rendered SQL.
///
/// `\r\n` is hashed as `\n` so a checkout with different line endings does
/// not read as drift. Every other byte counts, whitespace included.
pub fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    let mut lines = sql.split("\r\n");
    if let Some(first) = lines.next() {
        hasher.update(first.as_bytes());
    }
    for line in lines {
        hasher.update(b"\n");
        hasher.update(line.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}
