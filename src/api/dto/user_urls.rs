//! DTOs for the user link endpoints.

use serde::{Deserialize, Serialize};

/// One live link owned by the caller.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUrlItem {
    pub short_url: String,
    pub original_url: String,
}

impl From<(String, String)> for UserUrlItem {
    fn from((short_url, original_url): (String, String)) -> Self {
        Self {
            short_url,
            original_url,
        }
    }
}
