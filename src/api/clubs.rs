use chrono::Utc;
use mongodb::{
    bson::{doc, to_bson},
    options::FindOptions,
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        auth::{Admin, AuthToken, Authenticated},
        club::{Club, ClubSpec, JoinRequestDecision, JoinRequestSpec, JoinRequestStatus, NewClub},
        mongodb::{Coll, Id},
        user::User,
    },
};

use super::Message;

pub fn routes() -> Vec<Route> {
    routes![
        get_clubs,
        create_club,
        request_to_join,
        decide_join_request,
        leave_club,
    ]
}

#[get("/clubs")]
async fn get_clubs(clubs: Coll<Club>) -> Result<Json<Vec<Club>>> {
    let by_name = FindOptions::builder().sort(doc! { "name": 1 }).build();
    let all: Vec<Club> = clubs.find(None, by_name).await?.try_collect().await?;
    Ok(Json(all))
}

#[post("/clubs", data = "<spec>", format = "json")]
async fn create_club(
    _token: AuthToken<Admin>,
    spec: Json<ClubSpec>,
    new_clubs: Coll<NewClub>,
    clubs: Coll<Club>,
) -> Result<Json<Club>> {
    let with_name = doc! { "name": &spec.name };
    if clubs.find_one(with_name, None).await?.is_some() {
        return Err(Error::Validation(format!(
            "A club named '{}' already exists",
            spec.name
        )));
    }

    let club = spec.0.into_club(Utc::now())?;
    let new_id: Id = new_clubs
        .insert_one(&club, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB.
        .into();
    let club = clubs.find_one(new_id.as_doc(), None).await?.unwrap();
    Ok(Json(club))
}

/// Submit a join request. Membership is only granted once an admin approves
/// the request via [`decide_join_request`].
#[post("/clubs/<club_id>/join", data = "<spec>", format = "json")]
async fn request_to_join(
    token: AuthToken<Authenticated>,
    club_id: Id,
    spec: Json<JoinRequestSpec>,
    clubs: Coll<Club>,
) -> Result<Json<Message>> {
    let subject = token.subject();

    // Snapshot check to classify refusals up front.
    let club = clubs
        .find_one(club_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Club {club_id}")))?;
    club.check_join(subject)?;

    let request = spec.0.into_request(subject.to_string(), Utc::now())?;

    // Guarded push: matches only if the subject is still neither a member
    // nor a pending requester, so two racing submissions cannot both land.
    let can_request = doc! {
        "_id": *club_id,
        "members": { "$ne": subject },
        "joinRequests": {
            "$not": { "$elemMatch": { "subject": subject, "status": "pending" } },
        },
    };
    let push_request = doc! {
        // Valid because `JoinRequest` serialisation doesn't fail.
        "$push": { "joinRequests": to_bson(&request).unwrap() },
    };
    let result = clubs.update_one(can_request, push_request, None).await?;
    if result.matched_count == 0 {
        // We lost a race with another submission from the same subject.
        return Err(Error::Conflict(
            "You already have a pending join request".to_string(),
        ));
    }

    Ok(Json(Message::new("Join request submitted")))
}

/// Approve or reject a pending join request. Approval adds the requester
/// to the member list.
#[patch(
    "/clubs/<club_id>/join-requests/<request_id>",
    data = "<decision>",
    format = "json"
)]
async fn decide_join_request(
    _token: AuthToken<Admin>,
    club_id: Id,
    request_id: String,
    decision: Json<JoinRequestDecision>,
    clubs: Coll<Club>,
    users: Coll<User>,
) -> Result<Json<Message>> {
    let status = decision.validate()?;

    let club = clubs
        .find_one(club_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Club {club_id}")))?;
    let request = club
        .join_request(&request_id)
        .ok_or_else(|| Error::not_found(format!("Join request {request_id}")))?;
    if request.status != JoinRequestStatus::Pending {
        return Err(Error::Conflict(
            "This join request has already been decided".to_string(),
        ));
    }
    let requester = request.subject.clone();

    // Guarded positional update: matches only while the request is still
    // pending, so a request can be decided at most once.
    let still_pending = doc! {
        "_id": *club_id,
        "joinRequests": { "$elemMatch": { "id": &request_id, "status": "pending" } },
    };
    let apply_decision = if status == JoinRequestStatus::Approved {
        doc! {
            "$set": { "joinRequests.$.status": status },
            "$addToSet": { "members": &requester },
        }
    } else {
        doc! { "$set": { "joinRequests.$.status": status } }
    };
    let result = clubs.update_one(still_pending, apply_decision, None).await?;
    if result.matched_count == 0 {
        return Err(Error::Conflict(
            "This join request has already been decided".to_string(),
        ));
    }

    // Best-effort backreference for persisted users.
    if status == JoinRequestStatus::Approved {
        if let Ok(user_id) = requester.parse::<Id>() {
            let backref = doc! { "$addToSet": { "joinedClubs": *club_id } };
            if let Err(err) = users.update_one(user_id.as_doc(), backref, None).await {
                warn!("Failed to record club membership for user {user_id}: {err}");
            }
        }
    }

    let message = match status {
        JoinRequestStatus::Approved => "Join request approved",
        _ => "Join request rejected",
    };
    Ok(Json(Message::new(message)))
}

#[post("/clubs/<club_id>/leave")]
async fn leave_club(
    token: AuthToken<Authenticated>,
    club_id: Id,
    clubs: Coll<Club>,
    users: Coll<User>,
) -> Result<Json<Message>> {
    let subject = token.subject();

    let remove_member = doc! { "$pull": { "members": subject } };
    let result = clubs
        .update_one(club_id.as_doc(), remove_member, None)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Club {club_id}")));
    }

    if let Ok(user_id) = subject.parse::<Id>() {
        let backref = doc! { "$pull": { "joinedClubs": *club_id } };
        if let Err(err) = users.update_one(user_id.as_doc(), backref, None).await {
            warn!("Failed to remove club membership for user {user_id}: {err}");
        }
    }

    Ok(Json(Message::new("Left club successfully")))
}
