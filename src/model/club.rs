use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::mongodb::Id,
};

/// States of a club join request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<JoinRequestStatus> for Bson {
    fn from(status: JoinRequestStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// A request to join a club, held on the club document until an admin
/// decides it. Only approval adds the requester to `members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Unique within the club, assigned at submission.
    pub id: String,
    /// Subject identifier of the requester.
    pub subject: String,
    pub department: String,
    pub year: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: JoinRequestStatus,
    pub requested_at: DateTime<Utc>,
}

/// Core club data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubCore {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Subject identifiers of current members.
    pub members: Vec<String>,
    /// Join requests awaiting or past an admin decision.
    #[serde(default)]
    pub join_requests: Vec<JoinRequest>,
    pub created_at: DateTime<Utc>,
}

impl ClubCore {
    pub fn is_member(&self, subject: &str) -> bool {
        self.members.iter().any(|member| member == subject)
    }

    /// Does this subject have a request still awaiting a decision?
    pub fn has_pending_request(&self, subject: &str) -> bool {
        self.join_requests
            .iter()
            .any(|request| request.subject == subject && request.status == JoinRequestStatus::Pending)
    }

    /// Look up a join request by ID.
    pub fn join_request(&self, request_id: &str) -> Option<&JoinRequest> {
        self.join_requests
            .iter()
            .find(|request| request.id == request_id)
    }

    /// May this subject submit a join request? Members and subjects with a
    /// pending request are refused, each with its own message.
    pub fn check_join(&self, subject: &str) -> Result<()> {
        if self.is_member(subject) {
            return Err(Error::Conflict(
                "You are already a member of this club".to_string(),
            ));
        }
        if self.has_pending_request(subject) {
            return Err(Error::Conflict(
                "You already have a pending join request".to_string(),
            ));
        }
        Ok(())
    }
}

/// A club without an ID.
pub type NewClub = ClubCore;

/// A club from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub club: ClubCore,
}

impl Deref for Club {
    type Target = ClubCore;

    fn deref(&self) -> &Self::Target {
        &self.club
    }
}

/// A new-club request from an admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClubSpec {
    pub name: String,
    pub description: String,
    pub category: String,
}

impl ClubSpec {
    pub fn into_club(self, now: DateTime<Utc>) -> Result<ClubCore> {
        if self.name.trim().is_empty() || self.description.trim().is_empty() {
            return Err(Error::Validation(
                "Club name and description are required".to_string(),
            ));
        }
        Ok(ClubCore {
            name: self.name,
            description: self.description,
            category: self.category,
            members: Vec::new(),
            join_requests: Vec::new(),
            created_at: now,
        })
    }
}

/// A join-request submission from a student.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinRequestSpec {
    pub department: String,
    pub year: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl JoinRequestSpec {
    /// Validate the submission and convert it into a pending request.
    pub fn into_request(self, subject: String, now: DateTime<Utc>) -> Result<JoinRequest> {
        if self.department.trim().is_empty() || self.year.trim().is_empty() {
            return Err(Error::Validation(
                "Department and year are required".to_string(),
            ));
        }
        Ok(JoinRequest {
            id: ObjectId::new().to_hex(),
            subject,
            department: self.department,
            year: self.year,
            reason: self.reason,
            status: JoinRequestStatus::Pending,
            requested_at: now,
        })
    }
}

/// An admin's decision on a join request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinRequestDecision {
    pub status: JoinRequestStatus,
}

impl JoinRequestDecision {
    /// A decision must actually decide: `pending` is not an outcome.
    pub fn validate(&self) -> Result<JoinRequestStatus> {
        if self.status == JoinRequestStatus::Pending {
            return Err(Error::Validation(
                "A join request can only be approved or rejected".to_string(),
            ));
        }
        Ok(self.status)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ClubCore {
        pub fn example() -> Self {
            ClubSpec {
                name: "Chess Club".to_string(),
                description: "Weekly blitz nights".to_string(),
                category: "Games".to_string(),
            }
            .into_club(Utc::now())
            .unwrap()
        }
    }

    impl JoinRequestSpec {
        pub fn example() -> Self {
            Self {
                department: "Software Engineering".to_string(),
                year: "3rd Year".to_string(),
                reason: Some("I play 1500 blitz".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_validation() {
        let club = ClubCore::example();
        assert!(club.members.is_empty());
        assert!(club.join_requests.is_empty());

        let blank = ClubSpec {
            name: " ".to_string(),
            description: "d".to_string(),
            category: "c".to_string(),
        };
        assert!(blank.into_club(Utc::now()).is_err());
    }

    #[test]
    fn joining_records_a_pending_request_not_a_member() {
        let mut club = ClubCore::example();
        let request = JoinRequestSpec::example()
            .into_request("voter-1".to_string(), Utc::now())
            .unwrap();
        assert_eq!(request.status, JoinRequestStatus::Pending);

        club.join_requests.push(request);
        // The request alone grants nothing.
        assert!(!club.is_member("voter-1"));
        assert!(club.has_pending_request("voter-1"));
    }

    #[test]
    fn duplicate_pending_request_is_refused() {
        let mut club = ClubCore::example();
        assert!(club.check_join("voter-1").is_ok());

        let request = JoinRequestSpec::example()
            .into_request("voter-1".to_string(), Utc::now())
            .unwrap();
        club.join_requests.push(request);
        assert!(matches!(club.check_join("voter-1"), Err(Error::Conflict(_))));

        // A decided request no longer blocks a fresh submission.
        club.join_requests[0].status = JoinRequestStatus::Rejected;
        assert!(club.check_join("voter-1").is_ok());
    }

    #[test]
    fn members_cannot_request_again() {
        let mut club = ClubCore::example();
        club.members.push("voter-1".to_string());
        assert!(matches!(club.check_join("voter-1"), Err(Error::Conflict(_))));
    }

    #[test]
    fn blank_department_is_rejected() {
        let mut spec = JoinRequestSpec::example();
        spec.department = "  ".to_string();
        assert!(matches!(
            spec.into_request("voter-1".to_string(), Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn decision_must_not_be_pending() {
        let decision = JoinRequestDecision {
            status: JoinRequestStatus::Pending,
        };
        assert!(matches!(decision.validate(), Err(Error::Validation(_))));

        let decision = JoinRequestDecision {
            status: JoinRequestStatus::Approved,
        };
        assert_eq!(decision.validate().unwrap(), JoinRequestStatus::Approved);
    }
}
