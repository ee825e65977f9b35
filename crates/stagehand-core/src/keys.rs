//! Object key derivation for staged and finalized uploads.
//!
//! Staging keys: `{prefix}/{purpose}/{owner_id}/{session_id}/{file_id}`
//! Final keys:   `{prefix}/{purpose}/{owner_id}/{file_id}`
//!
//! An empty prefix (or one made only of separators) yields keys that start
//! directly with the purpose segment. Both backends rely on these layouts, so
//! keys are only ever built here.

use uuid::Uuid;

pub const KEY_SEPARATOR: char = '/';

/// Trim surrounding separators and append exactly one when anything is left.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches(KEY_SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}{}", trimmed, KEY_SEPARATOR)
    }
}

/// Key under which a file is staged while its session is open.
pub fn staging_key(
    prefix: &str,
    purpose: &str,
    owner_id: Uuid,
    session_id: Uuid,
    file_id: Uuid,
) -> String {
    format!(
        "{}{}/{}/{}/{}",
        normalize_prefix(prefix),
        purpose,
        owner_id,
        session_id,
        file_id
    )
}

/// Key a file is relocated to on acceptance. Omits the session segment.
pub fn final_key(prefix: &str, purpose: &str, owner_id: Uuid, file_id: Uuid) -> String {
    format!(
        "{}{}/{}/{}",
        normalize_prefix(prefix),
        purpose,
        owner_id,
        file_id
    )
}
