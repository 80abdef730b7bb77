// Session cookie policy
// Decision: Cookie lifetime (2h / 30d) is independent of token validity
// (15m); the cookie is a transport and remember-me mechanism, and protected
// requests always re-validate token expiry

use axum_extra::extract::cookie::{Cookie, SameSite};

/// Cookie carrying the signed token.
pub const TOKEN_COOKIE: &str = "token";

/// Cookie lifetime without remember-me.
const SESSION_MAX_AGE: time::Duration = time::Duration::hours(2);

/// Cookie lifetime with remember-me.
const REMEMBER_ME_MAX_AGE: time::Duration = time::Duration::days(30);

/// Build the session cookie for an issued token.
///
/// `httpOnly` and `secure` are relaxed only in dev mode. `SameSite=None`
/// supports cross-origin delivery; the token is always returned in the
/// response body as well, so callers may use either channel.
pub fn session_cookie(token: String, remember_me: bool, dev_mode: bool) -> Cookie<'static> {
    let max_age = if remember_me {
        REMEMBER_ME_MAX_AGE
    } else {
        SESSION_MAX_AGE
    };

    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(!dev_mode)
        .secure(!dev_mode)
        .same_site(SameSite::None)
        .max_age(max_age)
        .build()
}

/// Build the removal cookie used at logout.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE).path("/").build()
}
