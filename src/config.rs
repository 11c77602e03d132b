use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    auth::{DemoIdentityProvider, IdentityProvider, StoreIdentityProvider},
    mongodb::{ensure_indexes_exist, Coll},
    user::ensure_admin_exists,
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    default_eligible_voters: u32,
    demo_mode: bool,
    admin_email: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Electorate size assumed for turnout display when an election
    /// does not declare its own.
    pub fn default_eligible_voters(&self) -> u32 {
        self.default_eligible_voters
    }

    /// Whether the ephemeral demo identity provider is active.
    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    /// Email of the seeded admin account (and of the demo admin).
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Password of the seeded admin account.
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state, along with the identity provider selected by
/// `demo_mode`.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config. `ConfigFairing` runs first, so the application
        // config is already managed.
        let db_config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let config = rocket
            .state::<Config>()
            .expect("ConfigFairing must be attached before DatabaseFairing");

        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }

        // Ensure there is at least one admin account to manage the portal.
        let users = Coll::from_db(&db);
        if let Err(e) = ensure_admin_exists(&users, config).await {
            error!("Failed to seed admin account: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Select the identity provider.
        let provider: Box<dyn IdentityProvider> = if config.demo_mode() {
            warn!("Demo mode active: identities are ephemeral and never persisted");
            Box::new(DemoIdentityProvider::new(config.admin_email().to_string()))
        } else {
            Box::new(StoreIdentityProvider::new(&db))
        };

        // Manage the state.
        rocket = rocket.manage(client).manage(db).manage(provider);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "student_union".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
