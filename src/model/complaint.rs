use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::mongodb::Id,
};

/// Handling states of a complaint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
}

impl From<ComplaintStatus> for Bson {
    fn from(status: ComplaintStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// Core complaint data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintCore {
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: ComplaintStatus,
    /// Subject identifier of the submitter.
    pub submitted_by: String,
    /// The union's reply, once an admin has handled the complaint.
    #[serde(default)]
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A complaint without an ID.
pub type NewComplaint = ComplaintCore;

/// A complaint from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub complaint: ComplaintCore,
}

impl Deref for Complaint {
    type Target = ComplaintCore;

    fn deref(&self) -> &Self::Target {
        &self.complaint
    }
}

/// A new-complaint request from a student.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplaintSpec {
    pub title: String,
    pub description: String,
    pub category: String,
}

impl ComplaintSpec {
    pub fn into_complaint(self, submitted_by: String, now: DateTime<Utc>) -> Result<ComplaintCore> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(Error::Validation(
                "Complaint title and description are required".to_string(),
            ));
        }
        Ok(ComplaintCore {
            title: self.title,
            description: self.description,
            category: self.category,
            status: ComplaintStatus::Pending,
            submitted_by,
            response: None,
            created_at: now,
        })
    }
}

/// An admin's update to a complaint: a new status, an optional response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplaintUpdate {
    pub status: ComplaintStatus,
    #[serde(default)]
    pub response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_complaints_start_pending() {
        let spec = ComplaintSpec {
            title: "Broken projector".to_string(),
            description: "Room B12 projector has been dead for a week".to_string(),
            category: "Facilities".to_string(),
        };
        let complaint = spec
            .into_complaint("voter-1".to_string(), Utc::now())
            .unwrap();
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert!(complaint.response.is_none());
    }
}
