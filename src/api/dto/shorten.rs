//! DTOs for link shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten one URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

/// Short URL for the request, new or pre-existing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One URL of a batch shorten request.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchShortenItem {
    /// Opaque client key echoed back in the matching result.
    pub correlation_id: String,
    pub original_url: String,
}

/// Short URL for one batch item.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchShortenResult {
    pub correlation_id: String,
    pub short_url: String,
}
