//! Authentication state trait.

use super::cookie::CookieSettings;
use crate::db::Database;
use crate::jwt::JwtConfig;

/// Trait for state types that provide what the access token extractor needs.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn db(&self) -> &Database;
    fn cookies(&self) -> &CookieSettings;
}
