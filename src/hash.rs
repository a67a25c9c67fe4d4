//! BLAKE3 hashing utilities for manifest staleness detection

use blake3::Hasher;

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Hash a sequence of canonical records into a prefixed digest.
///
/// Records are fed in the order given with null separators between fields
/// and newline separators between records, so callers control ordering.
/// The manifest sorts its dependency set before calling this, which makes
/// the resulting hash independent of declaration order.
pub fn hash_records<I, F, S>(records: I) -> String
where
    I: IntoIterator<Item = F>,
    F: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Hasher::new();
    for record in records {
        for field in record {
            hasher.update(field.as_ref().as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"\n");
    }
    format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())
}

/// Verify a hash matches the expected value
///
/// Normalizes both sides so a bare digest compares equal to a prefixed one.
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    let normalize = |h: &str| {
        if h.starts_with(HASH_PREFIX) {
            h.to_string()
        } else {
            format!("{}{}", HASH_PREFIX, h)
        }
    };

    normalize(expected) == normalize(actual)
}
