#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use rocket::{Build, Rocket};

use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// Build the rocket instance: all routes and catchers mounted under `/api`,
/// config loaded, database connected, logging attached.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/api", api::routes())
        .register("/api", api::catchers())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(LoggerFairing)
}
