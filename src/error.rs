use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while handling a portal request.
///
/// Each variant maps to exactly one HTTP status; the variant's display
/// message becomes the `message` field of the JSON error body.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input; the caller must fix the request.
    #[error("{0}")]
    Validation(String),
    /// No valid credentials were presented.
    #[error("{0}")]
    Unauthorized(String),
    /// The caller is authenticated but lacks the required role.
    #[error("Admin access required")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    /// The operation is not permitted in the election's current
    /// temporal or status state.
    #[error("{0}")]
    InvalidState(String),
    /// The voter has already cast a vote in this election. Kept separate
    /// from `Validation` so clients can render the specific message.
    #[error("You have already voted in this election")]
    DuplicateVote,
    /// Deletion blocked by the live-votes guard.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] describing the given entity.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::InvalidState(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Forbidden => Status::Forbidden,
            Self::NotFound(_) => Status::NotFound,
            Self::DuplicateVote | Self::Conflict(_) => Status::Conflict,
            Self::Db(_) => Status::InternalServerError,
        }
    }
}

/// JSON body carried by every error response.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        // Store failures are logged in full but never detailed to the caller.
        let message = match &self {
            Self::Db(err) => {
                error!("Database error: {err}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let mut response = Json(ErrorBody { message }).respond_to(req)?;
        response.set_status(status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            Error::Validation("bad".into()).status(),
            Status::BadRequest
        );
        assert_eq!(Error::Forbidden.status(), Status::Forbidden);
        assert_eq!(Error::not_found("Election").status(), Status::NotFound);
        assert_eq!(
            Error::InvalidState("not active".into()).status(),
            Status::BadRequest
        );
        assert_eq!(Error::DuplicateVote.status(), Status::Conflict);
        assert_eq!(Error::Conflict("votes".into()).status(), Status::Conflict);
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = Error::not_found("Election 42");
        assert_eq!(err.to_string(), "Election 42 not found");
    }
}
