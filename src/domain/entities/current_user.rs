//! Request-scoped caller identity.

/// The user a request acts for, resolved from the identity cookie.
///
/// Inserted into request extensions by [`crate::api::middleware::auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

impl CurrentUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
