use crate::record::Record;
use sha2::{Digest, Sha256};

const SEPARATOR: &str = ";";

/// Order-independent SHA-256 digest of the ids in `results`, as lowercase hex.
///
/// Ids are sorted ascending and joined with `;` before hashing, so the empty
/// result hashes the empty string. Ids must be unique within one result.
pub fn fingerprint(results: &[Record]) -> String {
    let mut ids = results.iter().map(|record| record.id).collect::<Vec<_>>();
    ids.sort_unstable();
    debug_assert!(
        ids.windows(2).all(|pair| pair[0] != pair[1]),
        "duplicate id in query result"
    );

    let serialized = ids
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    hex::encode(Sha256::digest(serialized.as_bytes()))
}
