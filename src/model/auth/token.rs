use std::fmt::Display;
use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};
use time;

use crate::Config;

use super::AuthenticatedUser;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Canonical user roles. The identity boundary resolves every caller to
/// exactly one of these; nothing downstream reconciles any other flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Student => "student",
                Self::Admin => "admin",
            }
        )
    }
}

/// The role requirement a token guard enforces.
pub trait Rights {
    fn permits(role: Role) -> bool;
}

/// Guard marker: any authenticated caller, whatever their role.
pub struct Authenticated;

/// Guard marker: admins only.
pub struct Admin;

impl Rights for Authenticated {
    fn permits(_role: Role) -> bool {
        true
    }
}

impl Rights for Admin {
    fn permits(role: Role) -> bool {
        role == Role::Admin
    }
}

/// An authentication token representing a specific subject with a specific role.
///
/// The type parameter records the rights requirement this token has been
/// checked against; it does not affect the serialized form.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct AuthToken<K> {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "rol")]
    role: Role,
    #[serde(skip)]
    phantom: PhantomData<K>,
}

impl<K> AuthToken<K> {
    /// The subject identifier: a user document ID in hex, or a synthetic
    /// `demo_` identifier when the ephemeral provider is active.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl AuthToken<Authenticated> {
    /// Mint a token for a freshly authenticated user.
    pub fn new(user: &AuthenticatedUser) -> Self {
        Self {
            subject: user.subject.clone(),
            role: user.role,
            phantom: PhantomData,
        }
    }

    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap(); // Infallible.

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(time::Duration::seconds(config.auth_ttl().num_seconds()))
            .same_site(SameSite::Strict)
            .finish()
    }
}

impl<K> AuthToken<K> {
    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<K>>| claims.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<K> {
    #[serde(flatten, bound = "")]
    token: AuthToken<K>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, K> FromRequest<'r> for AuthToken<K>
where
    K: Rights,
{
    type Error = ();

    /// Get an AuthToken from the cookie and verify that its role satisfies
    /// the guard's rights requirement: no token is 401, wrong role is 403.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = req.guard::<&State<Config>>().await.unwrap(); // Valid as `Config` is always managed

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => return request::Outcome::Failure((Status::Unauthorized, ())),
        };
        let token: Self = match Self::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(_) => return request::Outcome::Failure((Status::Unauthorized, ())),
        };

        if K::permits(token.role) {
            request::Outcome::Success(token)
        } else {
            request::Outcome::Failure((Status::Forbidden, ()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights() {
        assert!(Authenticated::permits(Role::Student));
        assert!(Authenticated::permits(Role::Admin));
        assert!(!Admin::permits(Role::Student));
        assert!(Admin::permits(Role::Admin));
    }

    #[test]
    fn claims_round_trip() {
        let user = AuthenticatedUser::demo_example();
        let token = AuthToken::new(&user);
        let claims = Claims {
            token,
            expire_at: Utc::now() + chrono::Duration::hours(1),
        };

        let secret = b"test-secret";
        let encoded = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        let decoded: TokenData<Claims<Authenticated>> = jsonwebtoken::decode(
            &encoded,
            &DecodingKey::from_secret(secret),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.token.subject(), user.subject);
        assert_eq!(decoded.claims.token.role(), user.role);
    }
}
