use std::ops::{Deref, DerefMut};

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

use super::ElectionCore;

/// An election without an ID, ready for insertion.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Filter for the guarded vote update: matches the election only if this
/// subject has not voted yet and the candidate exists. Combined with
/// [`vote_update`] in a single `find_one_and_update`, the whole vote is one
/// atomic document operation. Two racing votes can never both match, so the
/// tally invariant holds under arbitrary interleaving and no partial update
/// is ever observable.
pub fn vote_filter(election_id: Id, candidate_id: &str, subject: &str) -> Document {
    doc! {
        "_id": *election_id,
        "voters": { "$ne": subject },
        "candidates.id": candidate_id,
    }
}

/// Update for the guarded vote: increments the matched candidate's count and
/// the total, and records the voter, together.
pub fn vote_update(subject: &str) -> Document {
    doc! {
        "$inc": {
            "candidates.$.votes": 1,
            "totalVotes": 1,
        },
        "$push": { "voters": subject },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_filter_excludes_prior_voters_and_names_the_candidate() {
        let id = Id::new();
        let filter = vote_filter(id, "c1", "voter-1");

        assert_eq!(filter.get_object_id("_id").unwrap(), *id);
        // The membership guard is what makes the read-check-then-increment
        // race impossible: a second vote by the same subject matches nothing.
        assert_eq!(
            filter.get_document("voters").unwrap(),
            &doc! { "$ne": "voter-1" }
        );
        assert_eq!(filter.get_str("candidates.id").unwrap(), "c1");
    }

    #[test]
    fn vote_update_moves_all_three_fields_together() {
        let update = vote_update("voter-1");

        let inc = update.get_document("$inc").unwrap();
        assert_eq!(inc.get_i32("candidates.$.votes").unwrap(), 1);
        assert_eq!(inc.get_i32("totalVotes").unwrap(), 1);
        assert_eq!(
            update.get_document("$push").unwrap(),
            &doc! { "voters": "voter-1" }
        );
    }
}
