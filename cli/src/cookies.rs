//! Minimal cookie jar for carrying the session between CLI invocations.
//!
//! The jar is seeded from `--session-cookie` (a `Cookie` header value) and
//! updated from every `Set-Cookie` response header. Paths and domains are
//! ignored: one jar talks to one API. Expired cookies are dropped.

#[cfg(test)]
#[path = "cookies_test.rs"]
mod cookies_test;

use cookie::Cookie;
use cookie::time::{Duration, OffsetDateTime};

/// Cookie holding the double-submit CSRF token for access-token requests.
pub const CSRF_ACCESS_COOKIE: &str = "csrf_access_token";
/// Cookie holding the double-submit CSRF token for `/auth/refresh`.
pub const CSRF_REFRESH_COOKIE: &str = "csrf_refresh_token";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse a `Cookie` header value (`a=1; b=2`). Malformed pairs are skipped.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::default();
        for cookie in Cookie::split_parse(header).flatten() {
            jar.set(cookie.name(), cookie.value_trimmed());
        }
        jar
    }

    /// Apply one `Set-Cookie` header.
    pub fn absorb(&mut self, set_cookie: &str) {
        self.absorb_at(set_cookie, OffsetDateTime::now_utc());
    }

    /// [`CookieJar::absorb`] against an explicit clock. An empty value, a
    /// non-positive `Max-Age` or an `Expires` at or before `now` removes the
    /// cookie.
    pub fn absorb_at(&mut self, set_cookie: &str, now: OffsetDateTime) {
        let Ok(cookie) = Cookie::parse(set_cookie) else {
            tracing::debug!(set_cookie, "ignoring unparsable Set-Cookie");
            return;
        };
        let value = cookie.value_trimmed();
        if value.is_empty() || is_expired(&cookie, now) {
            self.pairs.retain(|(n, _)| n != cookie.name());
        } else {
            self.set(cookie.name(), value);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as a `Cookie` header value, or `None` when empty.
    #[must_use]
    pub fn header(&self) -> Option<String> {
        if self.pairs.is_empty() {
            return None;
        }
        let rendered: Vec<String> = self.pairs.iter().map(|(n, v)| format!("{n}={v}")).collect();
        Some(rendered.join("; "))
    }

    fn set(&mut self, name: &str, value: &str) {
        match self.pairs.iter_mut().find(|(n, _)| n == name) {
            Some(pair) => value.clone_into(&mut pair.1),
            None => self.pairs.push((name.to_owned(), value.to_owned())),
        }
    }
}

fn is_expired(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    cookie.max_age().is_some_and(|age| age <= Duration::ZERO) || cookie.expires_datetime().is_some_and(|at| at <= now)
}
