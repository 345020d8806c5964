//! Short id generation.

use base64::Engine as _;

/// Length of random bytes before base64 encoding.
const SHORT_ID_BYTES: usize = 9;

/// Generates a cryptographically secure random short id.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding, producing a 12-character id.
///
/// # Errors
///
/// Returns the `getrandom` error if the system random source fails.
pub fn generate_short_id() -> Result<String, getrandom::Error> {
    let mut buffer = [0u8; SHORT_ID_BYTES];

    getrandom::fill(&mut buffer)?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}
