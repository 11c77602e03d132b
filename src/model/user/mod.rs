mod user_core;

pub use user_core::{hash_password, Credentials, NewUser, Registration, User, UserCore, UserProfile};

use mongodb::bson::doc;

use crate::{
    error::Result,
    model::{auth::Role, mongodb::Coll},
    Config,
};

/// Ensure there is at least one admin account, seeding one from the
/// configured credentials if necessary.
///
/// This operation is idempotent.
pub async fn ensure_admin_exists(users: &Coll<NewUser>, config: &Config) -> Result<()> {
    let admin_filter = doc! { "role": "admin" };
    if users.find_one(admin_filter, None).await?.is_some() {
        return Ok(());
    }

    info!("No admin account found, seeding one from config");
    let admin = UserCore {
        name: "System Administrator".to_string(),
        email: config.admin_email().to_string(),
        password_hash: hash_password(config.admin_password()),
        department: "Student Union".to_string(),
        year: "Staff".to_string(),
        student_id: "ADMIN-001".to_string(),
        role: Role::Admin,
        joined_clubs: Vec::new(),
        voted_elections: Vec::new(),
        created_at: chrono::Utc::now(),
    };
    users.insert_one(admin, None).await?;
    Ok(())
}
