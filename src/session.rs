use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{FromRequest, Outcome, Request};
use tracing::debug;

use crate::config::AppConfig;

pub const USER_COOKIE: &str = "user_id";

/// The user whose map this client is looking at.
///
/// Stored per client in a private cookie, so two browsers can look at different
/// family members at the same time. Falls back to the configured default user
/// when the client never picked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(i64);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn from_cookies(cookies: &CookieJar<'_>, default_user_id: i64) -> Self {
        let id = cookies
            .get_private(USER_COOKIE)
            .and_then(|cookie| cookie.value().parse::<i64>().ok())
            .unwrap_or(default_user_id);

        Self(id)
    }

    pub fn switch_to(cookies: &CookieJar<'_>, user_id: i64) -> Self {
        debug!(user_id, "Switching current user");
        cookies.add_private(
            Cookie::build((USER_COOKIE, user_id.to_string()))
                .same_site(SameSite::Lax)
                .http_only(true),
        );

        Self(user_id)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let default_user_id = request
            .rocket()
            .state::<AppConfig>()
            .map(|config| config.default_user_id)
            .unwrap_or(AppConfig::default().default_user_id);

        Outcome::Success(CurrentUser::from_cookies(request.cookies(), default_user_id))
    }
}
