use rocket::{serde::json::Json, Catcher, Request};
use serde::Serialize;

/// JSON body for errors that never reach a handler (failed guards,
/// unmatched routes, panics). Handler errors produce their own bodies via
/// the [`crate::error::Error`] responder; these catchers keep the rest of
/// the surface JSON too.
#[derive(Serialize)]
pub struct ErrorMessage {
    message: &'static str,
}

pub fn catchers() -> Vec<Catcher> {
    rocket::catchers![unauthorized, forbidden, not_found, unprocessable, internal_error]
}

#[catch(401)]
fn unauthorized(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        message: "Authentication required",
    })
}

#[catch(403)]
fn forbidden(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        message: "Admin access required",
    })
}

#[catch(404)]
fn not_found(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        message: "The requested resource was not found",
    })
}

#[catch(422)]
fn unprocessable(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        message: "Malformed request body",
    })
}

#[catch(500)]
fn internal_error(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        message: "Internal server error",
    })
}
