//! Identifier generation for conversations and messages.
//!
//! Both stores generate ids app-side as UUIDv7 so that ids sort in creation
//! order, which the history query uses as a tie-breaker on equal timestamps.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Length of the hyphenated `8-4-4-4-12` form.
const HYPHENATED_LEN: usize = 36;

/// Parse a client-supplied identifier.
///
/// Only the hyphenated `8-4-4-4-12` form is accepted. The simple, braced and
/// `urn:uuid:` forms are rejected so the id echoed back is the one received.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    if raw.len() != HYPHENATED_LEN {
        return None;
    }
    Uuid::try_parse(raw).ok()
}
