use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Candidate, ElectionCore, ElectionStatus};

/// Announced results: candidates sorted by votes, the winner, and the total.
///
/// Pure computation over stored state; calling it repeatedly is free of
/// side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub winner: Candidate,
    /// All candidates, most votes first. The sort is stable, so candidates
    /// tied on votes keep their declaration order and the first declared of
    /// the tied leaders wins.
    pub results: Vec<Candidate>,
    pub total_votes: u32,
}

impl ElectionResults {
    /// Compute the results of a completed election.
    ///
    /// Fails unless the election has been marked `Completed`; announcing
    /// mid-election is an admin mistake, not a tally request.
    pub fn compute(election: &ElectionCore) -> Result<Self> {
        if election.status != ElectionStatus::Completed {
            return Err(Error::InvalidState(
                "Election must be completed before announcing results".to_string(),
            ));
        }

        let mut results = election.candidates.clone();
        // `sort_by` is stable: ties keep declaration order.
        results.sort_by(|a, b| b.votes.cmp(&a.votes));

        let winner = results
            .first()
            .cloned()
            .ok_or_else(|| Error::InvalidState("Election has no candidates".to_string()))?;

        Ok(Self {
            winner,
            results,
            total_votes: election.total_votes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::election::election_core::examples::candidate;

    fn completed_election(candidates: Vec<Candidate>) -> ElectionCore {
        let total = candidates.iter().map(|c| c.votes).sum();
        let mut election = ElectionCore::past_example();
        election.status = ElectionStatus::Completed;
        election.total_votes = total;
        election.candidates = candidates;
        election
    }

    #[test]
    fn ties_break_by_declaration_order() {
        // B declared before C; both lead with 15.
        let election = completed_election(vec![
            candidate("a", "A", 10),
            candidate("b", "B", 15),
            candidate("c", "C", 15),
        ]);

        let results = ElectionResults::compute(&election).unwrap();
        assert_eq!(results.winner.id, "b");
        let order: Vec<&str> = results.results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(results.total_votes, 40);
    }

    #[test]
    fn refuses_uncompleted_elections() {
        let mut election =
            completed_election(vec![candidate("a", "A", 1), candidate("b", "B", 0)]);
        election.status = ElectionStatus::Ongoing;
        assert!(matches!(
            ElectionResults::compute(&election),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn computing_twice_gives_the_same_answer() {
        let election = completed_election(vec![candidate("a", "A", 3), candidate("b", "B", 7)]);
        let first = ElectionResults::compute(&election).unwrap();
        let second = ElectionResults::compute(&election).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.winner.id, "b");
    }
}
