//! Cookie-based JWT session handling.
//!
//! The token issuer produces an access/refresh pair; the relay moves both
//! tokens into cookies and strips them from response bodies. Access tokens
//! are stateless; refresh tokens carry a JTI so rotated tokens can be
//! blacklisted.

mod cookie;
mod errors;
mod extractors;
mod ip;
mod issuer;
pub mod password;
pub mod relay;
mod state;

pub use cookie::{
    CookieSettings, DEFAULT_ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, SameSite, get_cookie,
};
pub use errors::{AuthError, ResultExt};
pub use extractors::Auth;
pub use ip::extract_client_ip;
pub use issuer::{Credentials, JwtIssuer, RefreshedTokens, RotationPolicy, TokenIssuer, TokenPair};
pub use state::HasAuthBackend;
