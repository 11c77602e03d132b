use argon2::Config as ArgonConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{auth::Role, mongodb::Id},
};

/// Core user data, as stored in the database.
///
/// Field names serialize in camelCase to match the JSON the web client
/// already speaks.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCore {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    pub year: String,
    pub student_id: String,
    pub role: Role,
    /// Clubs this user has joined.
    pub joined_clubs: Vec<Id>,
    /// Elections this user has voted in. Best-effort backreference; the
    /// authoritative voter record is the election's own `voters` list.
    pub voted_elections: Vec<Id>,
    pub created_at: DateTime<Utc>,
}

impl UserCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create a UserCore is via
        // `Registration::into_user`, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl std::ops::Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// A registration request. Never stored directly, since the password is
/// in plaintext.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub year: String,
    pub student_id: String,
}

impl Registration {
    /// Convert this registration into a new [`UserCore`] by hashing the
    /// password. New accounts always start as students; admins are seeded
    /// or promoted out-of-band.
    pub fn into_user(self) -> Result<UserCore> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
            ("department", &self.department),
            ("year", &self.year),
            ("studentId", &self.student_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("Field '{field}' is required")));
            }
        }

        Ok(UserCore {
            name: self.name,
            email: self.email,
            password_hash: hash_password(&self.password),
            department: self.department,
            year: self.year,
            student_id: self.student_id,
            role: Role::Student,
            joined_clubs: Vec::new(),
            voted_elections: Vec::new(),
            created_at: Utc::now(),
        })
    }
}

/// Raw login credentials, received from a user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Argon2-hash a password with a random salt.
pub fn hash_password(password: &str) -> String {
    // 16 bytes of salt is the recommended size for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &ArgonConfig::default())
        .unwrap() // Safe because the default `Config` is valid.
}

/// A user profile as returned to clients: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub year: String,
    pub student_id: String,
    pub role: Role,
    pub joined_clubs: Vec<Id>,
    pub voted_elections: Vec<Id>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.user.name,
            email: user.user.email,
            department: user.user.department,
            year: user.user.year,
            student_id: user.user.student_id,
            role: user.user.role,
            joined_clubs: user.user.joined_clubs,
            voted_elections: user.user.voted_elections,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Registration {
        pub fn example() -> Self {
            Self {
                name: "Abebe Bekele".into(),
                email: "abebe@dbu.edu.et".into(),
                password: "hunter2hunter2".into(),
                department: "Software Engineering".into(),
                year: "3rd Year".into(),
                student_id: "DBU1401234".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_hashes_and_verifies() {
        let registration = Registration::example();
        let password = registration.password.clone();
        let user = registration.into_user().unwrap();

        assert_ne!(user.password_hash, password);
        assert!(user.verify_password(&password));
        assert!(!user.verify_password("wrong-password"));
        assert_eq!(user.role, Role::Student);
        assert!(user.voted_elections.is_empty());
    }

    #[test]
    fn registration_rejects_blank_fields() {
        let mut registration = Registration::example();
        registration.student_id = "  ".into();
        assert!(matches!(
            registration.into_user(),
            Err(Error::Validation(_))
        ));
    }
}
