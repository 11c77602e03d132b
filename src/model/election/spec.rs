use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Candidate, ElectionCore, ElectionStatus};

/// Minimum number of candidates for a meaningful election.
pub const MIN_CANDIDATES: usize = 2;

/// An election specification, as submitted by an admin to create an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Defaults to the configured campus-wide electorate size.
    #[serde(default)]
    pub eligible_voters: Option<u32>,
    pub candidates: Vec<CandidateSpec>,
}

/// A candidate draft within an [`ElectionSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    pub name: String,
    pub department: String,
    pub year: String,
    pub student_id: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub platform: Vec<String>,
}

impl ElectionSpec {
    /// Validate the spec and convert it into a new election.
    ///
    /// Candidates get fresh unique IDs and zeroed counters, in declaration
    /// order. The initial status is `Ongoing` if the window has already
    /// opened at `now`, otherwise `Pending`.
    pub fn into_election(
        self,
        created_by: String,
        default_eligible_voters: u32,
        now: DateTime<Utc>,
    ) -> Result<ElectionCore> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(Error::Validation(
                "Title and description are required".to_string(),
            ));
        }
        if self.start_date >= self.end_date {
            return Err(Error::Validation(
                "Start date must be before end date".to_string(),
            ));
        }
        if self.candidates.len() < MIN_CANDIDATES {
            return Err(Error::Validation(format!(
                "At least {MIN_CANDIDATES} candidates are required"
            )));
        }
        for candidate in &self.candidates {
            for (field, value) in [
                ("name", &candidate.name),
                ("department", &candidate.department),
                ("year", &candidate.year),
                ("studentId", &candidate.student_id),
            ] {
                if value.trim().is_empty() {
                    return Err(Error::Validation(format!(
                        "Candidate field '{field}' is required"
                    )));
                }
            }
        }

        let status = if self.start_date <= now {
            ElectionStatus::Ongoing
        } else {
            ElectionStatus::Pending
        };

        let candidates = self
            .candidates
            .into_iter()
            .map(|draft| Candidate {
                id: ObjectId::new().to_hex(),
                name: draft.name,
                department: draft.department,
                year: draft.year,
                student_id: draft.student_id,
                bio: draft.bio,
                profile_image: draft.profile_image,
                platform: draft.platform,
                votes: 0,
            })
            .collect();

        Ok(ElectionCore {
            title: self.title,
            description: self.description,
            status,
            start_date: self.start_date,
            end_date: self.end_date,
            total_votes: 0,
            eligible_voters: self.eligible_voters.unwrap_or(default_eligible_voters),
            candidates,
            voters: Vec::new(),
            created_by,
            created_at: now,
        })
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;
    use chrono::Duration;

    impl CandidateSpec {
        pub fn example(name: &str) -> Self {
            Self {
                name: name.to_string(),
                department: "Law".to_string(),
                year: "2nd Year".to_string(),
                student_id: "DBU1405678".to_string(),
                bio: Some("Debate club veteran".to_string()),
                profile_image: None,
                platform: vec!["Transparent budgets".to_string()],
            }
        }
    }

    impl ElectionSpec {
        /// A spec whose window is already open.
        pub fn current_example() -> Self {
            let now = Utc::now();
            Self {
                title: "Sports Secretary 2026".to_string(),
                description: "Vote for the next sports secretary".to_string(),
                start_date: now - Duration::hours(1),
                end_date: now + Duration::days(7),
                eligible_voters: None,
                candidates: vec![
                    CandidateSpec::example("Hana Girma"),
                    CandidateSpec::example("Dawit Tesfaye"),
                ],
            }
        }

        /// A spec whose window opens in the future.
        pub fn future_example() -> Self {
            let now = Utc::now();
            Self {
                start_date: now + Duration::days(1),
                end_date: now + Duration::days(8),
                ..Self::current_example()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_ELIGIBLE: u32 = 12547;

    #[test]
    fn two_candidates_suffice_one_does_not() {
        let spec = ElectionSpec::current_example();
        assert_eq!(spec.candidates.len(), 2);
        assert!(spec
            .clone()
            .into_election("admin".into(), DEFAULT_ELIGIBLE, Utc::now())
            .is_ok());

        let mut spec = spec;
        spec.candidates.truncate(1);
        assert!(matches!(
            spec.into_election("admin".into(), DEFAULT_ELIGIBLE, Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn window_must_be_ordered() {
        let mut spec = ElectionSpec::current_example();
        std::mem::swap(&mut spec.start_date, &mut spec.end_date);
        assert!(matches!(
            spec.into_election("admin".into(), DEFAULT_ELIGIBLE, Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut spec = ElectionSpec::current_example();
        spec.title = "   ".to_string();
        assert!(matches!(
            spec.into_election("admin".into(), DEFAULT_ELIGIBLE, Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn initial_status_follows_the_window() {
        let now = Utc::now();
        let ongoing = ElectionSpec::current_example()
            .into_election("admin".into(), DEFAULT_ELIGIBLE, now)
            .unwrap();
        assert_eq!(ongoing.status, ElectionStatus::Ongoing);

        let pending = ElectionSpec::future_example()
            .into_election("admin".into(), DEFAULT_ELIGIBLE, now)
            .unwrap();
        assert_eq!(pending.status, ElectionStatus::Pending);
    }

    #[test]
    fn candidates_start_zeroed_with_unique_ids_in_declaration_order() {
        let election = ElectionSpec::current_example()
            .into_election("admin".into(), DEFAULT_ELIGIBLE, Utc::now())
            .unwrap();

        assert_eq!(election.total_votes, 0);
        assert!(election.voters.is_empty());
        assert_eq!(election.candidates[0].name, "Hana Girma");
        assert_eq!(election.candidates[1].name, "Dawit Tesfaye");
        assert!(election.candidates.iter().all(|c| c.votes == 0));
        assert_ne!(election.candidates[0].id, election.candidates[1].id);
        assert_eq!(election.eligible_voters, DEFAULT_ELIGIBLE);
    }
}
