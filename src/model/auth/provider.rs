use mongodb::{bson::doc, Database};

use crate::{
    error::{Error, Result},
    model::{
        mongodb::Coll,
        user::{Credentials, NewUser, Registration, User},
    },
};

use super::Role;

/// A caller resolved at the identity boundary: exactly one subject
/// identifier and one canonical role.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Issues identities from credentials.
///
/// Selected once at launch via the `demo_mode` config flag; the rest of the
/// application never knows which implementation is active.
#[rocket::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, registration: Registration) -> Result<AuthenticatedUser>;
    async fn login(&self, credentials: Credentials) -> Result<AuthenticatedUser>;
}

/// The production provider: accounts live in the `users` collection.
pub struct StoreIdentityProvider {
    users: Coll<User>,
    new_users: Coll<NewUser>,
}

impl StoreIdentityProvider {
    pub fn new(db: &Database) -> Self {
        Self {
            users: Coll::from_db(db),
            new_users: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn register(&self, registration: Registration) -> Result<AuthenticatedUser> {
        let taken = doc! {
            "$or": [
                { "email": &registration.email },
                { "studentId": &registration.student_id },
            ],
        };
        if self.users.find_one(taken, None).await?.is_some() {
            return Err(Error::Validation(
                "An account with this email or student ID already exists".to_string(),
            ));
        }

        let user = registration.into_user()?;
        let new_id = self
            .new_users
            .insert_one(&user, None)
            .await?
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB.
            .to_hex();

        Ok(AuthenticatedUser {
            subject: new_id,
            name: user.name,
            email: user.email,
            role: user.role,
        })
    }

    async fn login(&self, credentials: Credentials) -> Result<AuthenticatedUser> {
        let with_email = doc! { "email": &credentials.email };
        let user = self
            .users
            .find_one(with_email, None)
            .await?
            .filter(|user| user.verify_password(&credentials.password))
            .ok_or_else(|| Error::Unauthorized("Invalid email or password".to_string()))?;

        Ok(AuthenticatedUser {
            subject: user.id.to_string(),
            name: user.user.name,
            email: user.user.email,
            role: user.user.role,
        })
    }
}

/// The ephemeral provider for demos and offline development: accepts any
/// credentials and mints synthetic `demo_` subjects that are never persisted.
/// The Election Engine skips voter-profile backreferences for these subjects.
pub struct DemoIdentityProvider {
    admin_email: String,
}

impl DemoIdentityProvider {
    pub fn new(admin_email: String) -> Self {
        Self { admin_email }
    }

    fn mint(&self, name: String, email: String) -> AuthenticatedUser {
        let role = if email == self.admin_email {
            Role::Admin
        } else {
            Role::Student
        };
        AuthenticatedUser {
            subject: format!("demo_{:08x}", rand::random::<u32>()),
            name,
            email,
            role,
        }
    }
}

#[rocket::async_trait]
impl IdentityProvider for DemoIdentityProvider {
    async fn register(&self, registration: Registration) -> Result<AuthenticatedUser> {
        Ok(self.mint(registration.name, registration.email))
    }

    async fn login(&self, credentials: Credentials) -> Result<AuthenticatedUser> {
        let name = credentials
            .email
            .split('@')
            .next()
            .unwrap_or("Demo Student")
            .to_string();
        Ok(self.mint(name, credentials.email))
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AuthenticatedUser {
        pub fn demo_example() -> Self {
            Self {
                subject: "demo_deadbeef".to_string(),
                name: "Demo Student".to_string(),
                email: "demo@dbu.edu.et".to_string(),
                role: Role::Student,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn demo_provider_mints_synthetic_subjects() {
        // This test actually enters backend code, so enable logging.
        log4rs_test_utils::test_logging::init_logging_once_for(["union_backend"], None, None);

        let provider = DemoIdentityProvider::new("admin@dbu.edu.et".to_string());

        let student = provider
            .login(Credentials {
                email: "someone@dbu.edu.et".to_string(),
                password: "anything".to_string(),
            })
            .await
            .unwrap();
        assert!(student.subject.starts_with("demo_"));
        assert_eq!(student.role, Role::Student);

        let admin = provider
            .login(Credentials {
                email: "admin@dbu.edu.et".to_string(),
                password: "anything".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
