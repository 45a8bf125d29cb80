//! Query normalization
//!
//! Validates and prepares incoming query text. Normalization is
//! intentionally minimal: trim whitespace and reject empty input. No
//! language-specific preprocessing happens here.

use crate::types::{Query, RagError, RagResult};
use tracing::debug;
use uuid::Uuid;

/// Validate raw query text and produce an immutable [`Query`].
///
/// Fails with [`RagError::InvalidQuery`] when the input is empty after
/// trimming. Has no side effects.
pub fn normalize(raw: &str) -> RagResult<Query> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(RagError::InvalidQuery(
            "query must not be empty".to_string(),
        ));
    }

    let query = Query {
        id: Uuid::new_v4(),
        raw: raw.to_string(),
        text: text.to_string(),
    };

    debug!(query_id = %query.id, chars = query.text.len(), "Normalized query");

    Ok(query)
}
