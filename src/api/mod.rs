use rocket::Route;
use serde::Serialize;

mod auth;
mod catchers;
mod clubs;
mod complaints;
mod elections;
mod posts;
mod stats;

pub use catchers::catchers;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(elections::routes());
    routes.extend(clubs::routes());
    routes.extend(complaints::routes());
    routes.extend(posts::routes());
    routes.extend(stats::routes());
    routes
}

/// Plain confirmation body for endpoints with nothing else to return.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
