use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};
use serde::Serialize;

use crate::{
    error::Result,
    model::{
        club::Club,
        complaint::{Complaint, ComplaintStatus},
        election::{Election, ElectionStatus},
        mongodb::Coll,
        post::Post,
        user::User,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_stats]
}

/// Dashboard statistics. Computed from current stored state on every
/// request; nothing here is cached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    users: u64,
    clubs: u64,
    posts: u64,
    elections: ElectionStats,
    complaints: ComplaintStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ElectionStats {
    total: u64,
    pending: u64,
    ongoing: u64,
    completed: u64,
    /// Sum of `totalVotes` across all elections.
    votes_cast: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComplaintStats {
    total: u64,
    pending: u64,
    in_progress: u64,
    resolved: u64,
}

#[get("/stats")]
async fn get_stats(
    users: Coll<User>,
    clubs: Coll<Club>,
    posts: Coll<Post>,
    elections: Coll<Election>,
    complaints: Coll<Complaint>,
) -> Result<Json<Stats>> {
    let all_elections: Vec<Election> = elections.find(None, None).await?.try_collect().await?;
    let by_status = |status: ElectionStatus| {
        all_elections
            .iter()
            .filter(|election| election.status == status)
            .count() as u64
    };
    let election_stats = ElectionStats {
        total: all_elections.len() as u64,
        pending: by_status(ElectionStatus::Pending),
        ongoing: by_status(ElectionStatus::Ongoing),
        completed: by_status(ElectionStatus::Completed),
        votes_cast: all_elections
            .iter()
            .map(|election| u64::from(election.total_votes))
            .sum(),
    };

    let complaint_stats = ComplaintStats {
        total: complaints.count_documents(None, None).await?,
        pending: complaints
            .count_documents(doc! { "status": ComplaintStatus::Pending }, None)
            .await?,
        in_progress: complaints
            .count_documents(doc! { "status": ComplaintStatus::InProgress }, None)
            .await?,
        resolved: complaints
            .count_documents(doc! { "status": ComplaintStatus::Resolved }, None)
            .await?,
    };

    Ok(Json(Stats {
        users: users.count_documents(None, None).await?,
        clubs: clubs.count_documents(None, None).await?,
        posts: posts.count_documents(None, None).await?,
        elections: election_stats,
        complaints: complaint_stats,
    }))
}
