//! Stored short URL mapping.

use serde::{Deserialize, Serialize};

/// A short id to original URL mapping owned by one user.
///
/// Records are never physically removed; a bulk delete only flips
/// `is_deleted`, after which redirects answer `410 Gone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub short_id: String,
    pub original_url: String,
    pub owner_id: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl UrlRecord {
    pub fn new(
        short_id: impl Into<String>,
        original_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            short_id: short_id.into(),
            original_url: original_url.into(),
            owner_id: owner_id.into(),
            is_deleted: false,
        }
    }
}
