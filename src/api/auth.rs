use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};
use serde::Serialize;

use crate::{
    error::Result,
    model::{
        auth::{AuthToken, Authenticated, AuthenticatedUser, IdentityProvider, Role, AUTH_TOKEN_COOKIE},
        mongodb::{Coll, Id},
        user::{Credentials, Registration, User, UserProfile},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout, who_am_i]
}

/// Session description returned by register/login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    id: String,
    name: String,
    email: String,
    role: Role,
}

impl From<AuthenticatedUser> for Session {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.subject,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[post("/auth/register", data = "<registration>", format = "json")]
async fn register(
    registration: Json<Registration>,
    provider: &State<Box<dyn IdentityProvider>>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
) -> Result<Json<Session>> {
    let user = provider.register(registration.0).await?;

    let token = AuthToken::new(&user);
    cookies.add(token.into_cookie(config));

    Ok(Json(user.into()))
}

#[post("/auth/login", data = "<credentials>", format = "json")]
async fn login(
    credentials: Json<Credentials>,
    provider: &State<Box<dyn IdentityProvider>>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
) -> Result<Json<Session>> {
    let user = provider.login(credentials.0).await?;

    let token = AuthToken::new(&user);
    cookies.add(token.into_cookie(config));

    Ok(Json(user.into()))
}

#[delete("/auth")]
fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
}

/// The caller as the token sees them, with the stored profile attached
/// when the subject is a persisted user (demo subjects have none).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoAmI {
    id: String,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<UserProfile>,
}

#[get("/auth/me")]
async fn who_am_i(token: AuthToken<Authenticated>, users: Coll<User>) -> Result<Json<WhoAmI>> {
    let profile = match token.subject().parse::<Id>() {
        Ok(user_id) => users
            .find_one(user_id.as_doc(), None)
            .await?
            .map(UserProfile::from),
        Err(_) => None,
    };

    Ok(Json(WhoAmI {
        id: token.subject().to_string(),
        role: token.role(),
        profile,
    }))
}
