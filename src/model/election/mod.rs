mod db;
pub(crate) mod election_core;
mod results;
mod spec;

pub use db::{vote_filter, vote_update, Election, NewElection};
pub use election_core::{Candidate, ElectionCore, ElectionStatus};
pub use results::ElectionResults;
pub use spec::{CandidateSpec, ElectionSpec, MIN_CANDIDATES};
