use chrono::Utc;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        auth::{Admin, AuthToken, Authenticated},
        election::{
            vote_filter, vote_update, Election, ElectionResults, ElectionSpec, ElectionStatus,
            NewElection,
        },
        mongodb::{Coll, Id},
        user::User,
    },
    Config,
};

use super::Message;

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        get_elections,
        get_election,
        vote,
        set_status,
        announce_results,
        delete_election,
    ]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AuthToken<Admin>,
    spec: Json<ElectionSpec>,
    new_elections: Coll<NewElection>,
    elections: Coll<Election>,
    config: &State<Config>,
) -> Result<Json<Election>> {
    let election = spec.0.into_election(
        token.subject().to_string(),
        config.default_eligible_voters(),
        Utc::now(),
    )?;

    let new_id: Id = new_elections
        .insert_one(&election, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB.
        .into();
    let election = elections.find_one(new_id.as_doc(), None).await?.unwrap();

    Ok(Json(election))
}

#[get("/elections")]
async fn get_elections(elections: Coll<Election>) -> Result<Json<Vec<Election>>> {
    let newest_first = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let all: Vec<Election> = elections.find(None, newest_first).await?.try_collect().await?;
    Ok(Json(all))
}

#[get("/elections/<election_id>")]
async fn get_election(election_id: Id, elections: Coll<Election>) -> Result<Json<Election>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    Ok(Json(election))
}

/// The ballot a voter submits: just the candidate they pick.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    candidate_id: String,
}

#[post("/elections/<election_id>/vote", data = "<ballot>", format = "json")]
async fn vote(
    token: AuthToken<Authenticated>,
    election_id: Id,
    ballot: Json<VoteRequest>,
    elections: Coll<Election>,
    users: Coll<User>,
) -> Result<Json<Message>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

    // Precondition checks against our snapshot, in order: time window,
    // duplicate voter, candidate existence.
    let subject = token.subject();
    election.check_vote(&ballot.candidate_id, subject, Utc::now())?;

    // The real enforcement. The filter re-asserts voter absence and
    // candidate existence, and the update moves the candidate count, the
    // total, and the voter list in one atomic document operation.
    let updated = elections
        .find_one_and_update(
            vote_filter(election_id, &ballot.candidate_id, subject),
            vote_update(subject),
            None,
        )
        .await?;
    if updated.is_none() {
        // A concurrent vote by the same subject won the race between our
        // snapshot check and the guarded update.
        return Err(Error::DuplicateVote);
    }

    // Best-effort backreference on the voter's own profile. Synthetic
    // demo/admin subjects are not persisted users and are skipped; a store
    // failure here must not fail the already-committed vote.
    if let Ok(user_id) = subject.parse::<Id>() {
        let backref = doc! { "$addToSet": { "votedElections": *election_id } };
        if let Err(err) = users.update_one(user_id.as_doc(), backref, None).await {
            warn!("Failed to record vote backreference for user {user_id}: {err}");
        }
    }

    Ok(Json(Message::new("Vote cast successfully")))
}

/// An admin's status override. Any of the three statuses may be set at any
/// time; the voting window stays authoritative for vote acceptance.
#[derive(Debug, Deserialize, Serialize)]
struct StatusUpdate {
    status: ElectionStatus,
}

#[patch("/elections/<election_id>/status", data = "<update>", format = "json")]
async fn set_status(
    _token: AuthToken<Admin>,
    election_id: Id,
    update: Json<StatusUpdate>,
    elections: Coll<Election>,
) -> Result<Json<Election>> {
    let set_status = doc! { "$set": { "status": update.0.status } };
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let election = elections
        .find_one_and_update(election_id.as_doc(), set_status, options)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    Ok(Json(election))
}

#[post("/elections/<election_id>/announce")]
async fn announce_results(
    _token: AuthToken<Admin>,
    election_id: Id,
    elections: Coll<Election>,
) -> Result<Json<ElectionResults>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

    // Pure read-and-sort; announcing repeatedly is harmless.
    let results = ElectionResults::compute(&election)?;
    Ok(Json(results))
}

#[delete("/elections/<election_id>")]
async fn delete_election(
    _token: AuthToken<Admin>,
    election_id: Id,
    elections: Coll<Election>,
) -> Result<Json<Message>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;

    // Live-votes guard: never destroy an ongoing count.
    election.check_delete()?;

    elections.delete_one(election_id.as_doc(), None).await?;
    info!("Deleted election {election_id} ('{}')", election.title);
    Ok(Json(Message::new("Election deleted successfully")))
}
