//! Signed identity cookies.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies the identity cookie that ties requests to a user.
///
/// The cookie value is `<user_id>.<signature>`, where the signature is the
/// hex-encoded HMAC-SHA256 of the user id keyed by the server secret. A client
/// without the secret cannot forge another user's id.
pub struct AuthService {
    secret: String,
    cookie_name: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `secret` - HMAC key; cookies signed with another key are rejected
    /// - `cookie_name` - name of the identity cookie
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key length")
    }

    /// Returns the cookie value for `user_id`.
    pub fn sign(&self, user_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        format!("{user_id}.{}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Creates a fresh user id and its signed cookie value.
    pub fn issue(&self) -> (String, String) {
        let user_id = Uuid::new_v4().to_string();
        let value = self.sign(&user_id);
        (user_id, value)
    }

    /// Returns the user id carried by `value` if its signature is valid.
    ///
    /// The comparison runs in constant time.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (user_id, signature) = value.rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(user_id.to_string())
    }

    /// Builds a `Set-Cookie` header value carrying `value`.
    pub fn set_cookie(&self, value: &str) -> String {
        format!("{}={value}; Path=/; HttpOnly; SameSite=Lax", self.cookie_name)
    }
}
