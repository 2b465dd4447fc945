//! Cookie attributes and parsing for the token cookies.

use axum::http::header;

/// Cookie name for the refresh token. Not configurable.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Default cookie name for the access token.
pub const DEFAULT_ACCESS_COOKIE_NAME: &str = "access_token";

/// `SameSite` attribute applied to both token cookies.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes for the access and refresh cookies, shared by every endpoint that sets them.
///
/// `http_only` only applies to the access cookie. The refresh cookie is always HttpOnly.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub access_cookie_name: String,
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
    /// `Max-Age` for the access cookie, normally the access token lifetime
    pub access_max_age: Option<u64>,
    /// `Max-Age` for the refresh cookie, normally the refresh token lifetime
    pub refresh_max_age: Option<u64>,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            access_cookie_name: DEFAULT_ACCESS_COOKIE_NAME.to_string(),
            http_only: true,
            same_site: SameSite::Lax,
            secure: false,
            access_max_age: None,
            refresh_max_age: None,
        }
    }
}

impl CookieSettings {
    /// Check that the access cookie name is a usable cookie token.
    pub fn validate(&self) -> Result<(), String> {
        let name = &self.access_cookie_name;
        if name.is_empty() {
            return Err("Access cookie name cannot be empty".to_string());
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(format!("Access cookie name contains invalid characters: {}", name));
        }
        if name == REFRESH_COOKIE_NAME {
            return Err(format!(
                "Access cookie name must differ from '{}'",
                REFRESH_COOKIE_NAME
            ));
        }
        Ok(())
    }

    /// Set-Cookie value carrying a new access token.
    pub fn access_cookie(&self, token: &str) -> String {
        self.build(
            &self.access_cookie_name,
            token,
            self.http_only,
            self.access_max_age,
        )
    }

    /// Set-Cookie value carrying a new refresh token. Always HttpOnly.
    pub fn refresh_cookie(&self, token: &str) -> String {
        self.build(REFRESH_COOKIE_NAME, token, true, self.refresh_max_age)
    }

    /// Set-Cookie value that deletes the access cookie.
    pub fn clear_access_cookie(&self) -> String {
        self.build_expired(&self.access_cookie_name, self.http_only)
    }

    /// Set-Cookie value that deletes the refresh cookie.
    pub fn clear_refresh_cookie(&self) -> String {
        self.build_expired(REFRESH_COOKIE_NAME, true)
    }

    fn build(&self, name: &str, value: &str, http_only: bool, max_age: Option<u64>) -> String {
        let mut cookie = format!("{}={}", name, value);
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.same_site.as_str());
        cookie.push_str("; Path=/");
        if let Some(max_age) = max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn build_expired(&self, name: &str, http_only: bool) -> String {
        let mut cookie = self.build(name, "", http_only, Some(0));
        cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        cookie
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}
