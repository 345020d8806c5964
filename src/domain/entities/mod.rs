//! Core domain entities.
//!
//! - [`UrlRecord`] - a stored short URL mapping
//! - [`CurrentUser`] - the identity a request acts for

pub mod current_user;
pub mod url_record;

pub use current_user::CurrentUser;
pub use url_record::UrlRecord;
