use chrono::{DateTime, Utc};
use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Statuses in the election lifecycle.
///
/// This is an administrative label: admins may set any status at any time,
/// and whether a vote is accepted is decided by the time window alone, never
/// by this field. The two can therefore disagree (e.g. an election marked
/// `Pending` whose window has opened still accepts votes). That matches the
/// deployed behaviour the web client expects, so it stays, smell and all.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionStatus {
    /// Scheduled, window not yet open.
    Pending,
    /// Voting window open.
    Ongoing,
    /// Voting over; results may be announced.
    Completed,
}

impl From<ElectionStatus> for Bson {
    fn from(status: ElectionStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// A candidate within one election. Candidates are owned by their election
/// and never shared across elections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Unique within the election, assigned at creation.
    pub id: String,
    pub name: String,
    pub department: String,
    pub year: String,
    pub student_id: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Opaque image reference (a URL); file storage is someone else's job.
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Campaign planks, in the order the candidate declared them.
    #[serde(default)]
    pub platform: Vec<String>,
    /// Monotonically non-decreasing for the life of the election.
    pub votes: u32,
}

/// Core election data, as stored in the database.
///
/// Invariant: `total_votes == sum(candidate.votes) == voters.len()`. Every
/// mutation that touches one of the three touches all of them atomically
/// (see [`super::db`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionCore {
    pub title: String,
    pub description: String,
    pub status: ElectionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_votes: u32,
    /// Capacity used for turnout display only; not enforced as a cap.
    pub eligible_voters: u32,
    /// Declaration order, which also breaks result ties.
    pub candidates: Vec<Candidate>,
    /// Subject identifiers that have voted. Strings rather than ObjectIds so
    /// that synthetic demo identities fit alongside persisted users.
    pub voters: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ElectionCore {
    /// Is the voting window open at `now`? This check, not `status`, is
    /// what gates a vote.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// Has this subject already voted?
    pub fn has_voted(&self, subject: &str) -> bool {
        self.voters.iter().any(|voter| voter == subject)
    }

    /// Look up a candidate by ID.
    pub fn candidate(&self, candidate_id: &str) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|candidate| candidate.id == candidate_id)
    }

    /// Check all vote preconditions in order, each with its own failure mode:
    /// window, duplicate voter, candidate existence. (Existence of the
    /// election itself is the caller's lookup.)
    pub fn check_vote(&self, candidate_id: &str, subject: &str, now: DateTime<Utc>) -> Result<()> {
        if !self.is_active(now) {
            return Err(Error::InvalidState(
                "Election is not currently active".to_string(),
            ));
        }
        if self.has_voted(subject) {
            return Err(Error::DuplicateVote);
        }
        if self.candidate(candidate_id).is_none() {
            return Err(Error::not_found(format!("Candidate {candidate_id}")));
        }
        Ok(())
    }

    /// May this election be deleted? Refused while ongoing with live votes,
    /// so announced-but-unofficial results cannot be destroyed mid-election.
    pub fn check_delete(&self) -> Result<()> {
        if self.status == ElectionStatus::Ongoing && self.total_votes > 0 {
            return Err(Error::Conflict(
                "Cannot delete an ongoing election with votes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;
    use chrono::Duration;

    pub fn candidate(id: &str, name: &str, votes: u32) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            department: "Software Engineering".to_string(),
            year: "4th Year".to_string(),
            student_id: format!("DBU140{id}"),
            bio: None,
            profile_image: None,
            platform: vec!["Better cafeteria hours".to_string()],
            votes,
        }
    }

    impl ElectionCore {
        /// An election whose window is currently open.
        pub fn current_example() -> Self {
            let now = Utc::now();
            Self {
                title: "Student Union President 2026".to_string(),
                description: "Annual presidential election".to_string(),
                status: ElectionStatus::Ongoing,
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(1),
                total_votes: 0,
                eligible_voters: 12547,
                candidates: vec![candidate("c1", "Hana Girma", 0), candidate("c2", "Dawit Tesfaye", 0)],
                voters: Vec::new(),
                created_by: "admin".to_string(),
                created_at: now - Duration::days(2),
            }
        }

        /// An election whose window has already closed.
        pub fn past_example() -> Self {
            let now = Utc::now();
            Self {
                end_date: now - Duration::days(1),
                start_date: now - Duration::days(3),
                ..Self::current_example()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::examples::candidate;
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_window_gates_votes_regardless_of_status() {
        let mut election = ElectionCore::past_example();
        // Status says Ongoing, but the window has closed: the vote must fail.
        election.status = ElectionStatus::Ongoing;
        assert!(matches!(
            election.check_vote("c1", "voter-1", Utc::now()),
            Err(Error::InvalidState(_))
        ));

        // Conversely a lagging Pending status does not block an open window.
        let mut election = ElectionCore::current_example();
        election.status = ElectionStatus::Pending;
        assert!(election.check_vote("c1", "voter-1", Utc::now()).is_ok());
    }

    #[test]
    fn vote_before_window_opens_is_rejected() {
        let mut election = ElectionCore::current_example();
        election.start_date = Utc::now() + Duration::hours(1);
        assert!(matches!(
            election.check_vote("c1", "voter-1", Utc::now()),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn duplicate_voter_is_rejected() {
        let mut election = ElectionCore::current_example();
        election.voters.push("voter-1".to_string());
        election.total_votes = 1;
        election.candidates[0].votes = 1;

        assert!(matches!(
            election.check_vote("c2", "voter-1", Utc::now()),
            Err(Error::DuplicateVote)
        ));
        // A different voter is still fine.
        assert!(election.check_vote("c2", "voter-2", Utc::now()).is_ok());
    }

    #[test]
    fn unknown_candidate_is_rejected() {
        let election = ElectionCore::current_example();
        assert!(matches!(
            election.check_vote("c99", "voter-1", Utc::now()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn delete_guard() {
        let mut election = ElectionCore::current_example();
        election.candidates = vec![candidate("c1", "Hana Girma", 3), candidate("c2", "Dawit Tesfaye", 2)];
        election.total_votes = 5;
        assert!(matches!(election.check_delete(), Err(Error::Conflict(_))));

        // Completed elections can be deleted even with votes.
        election.status = ElectionStatus::Completed;
        assert!(election.check_delete().is_ok());

        // As can pending ones without votes.
        let mut election = ElectionCore::current_example();
        election.status = ElectionStatus::Pending;
        assert!(election.check_delete().is_ok());
    }
}
