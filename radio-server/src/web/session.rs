//! Cookie sessions.
//!
//! The session is a signed cookie holding the user id. Nothing else is
//! stored server-side.

use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies, Key, SignedCookies};
use tracing::debug;

use crate::domain::User;
use crate::store::StoreError;

use super::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The signed session cookie of one request.
pub struct Session<'a> {
    cookies: SignedCookies<'a>,
}

impl<'a> Session<'a> {
    pub fn new(cookies: &Cookies, key: &'a Key) -> Self {
        Self {
            cookies: cookies.signed(key),
        }
    }

    /// The logged-in user id, if the cookie is present and verifies.
    pub fn user_id(&self) -> Option<i64> {
        self.cookies
            .get(SESSION_COOKIE)
            .and_then(|c| c.value().parse().ok())
    }

    pub fn start(&self, user_id: i64) {
        let cookie = Cookie::build((SESSION_COOKIE, user_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        self.cookies.add(cookie);
    }

    pub fn clear(&self) {
        self.cookies
            .remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    }
}

/// The user behind the request's session.
///
/// A session for a user that no longer exists counts as anonymous.
pub async fn current_user(state: &AppState, cookies: &Cookies) -> Result<Option<User>, StoreError> {
    let session = Session::new(cookies, &state.session_key);

    let Some(user_id) = session.user_id() else {
        return Ok(None);
    };

    let user = state.store.user_by_id(user_id).await?;
    if user.is_none() {
        debug!(user_id, "session for unknown user");
    }
    Ok(user)
}

/// A local redirect target, or `/`.
///
/// Only absolute paths on this site are honoured; anything else, including
/// protocol-relative `//host` URLs, falls back to the index. Targets must be
/// printable ASCII without backslashes, since browsers strip tabs and
/// newlines and treat `\\` as `/`.
pub fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(t) if is_local_path(t) => t,
        _ => "/",
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && target.bytes().all(|b| b.is_ascii_graphic() && b != b'\\')
}

/// Append a query parameter to a local path.
pub fn with_query(path: &str, key: &str, value: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={value}")
}
