use chrono::Utc;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        auth::{Admin, AuthToken, Authenticated},
        complaint::{Complaint, ComplaintSpec, ComplaintUpdate, NewComplaint},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        submit_complaint,
        get_complaints,
        get_my_complaints,
        update_complaint,
    ]
}

#[post("/complaints", data = "<spec>", format = "json")]
async fn submit_complaint(
    token: AuthToken<Authenticated>,
    spec: Json<ComplaintSpec>,
    new_complaints: Coll<NewComplaint>,
    complaints: Coll<Complaint>,
) -> Result<Json<Complaint>> {
    let complaint = spec
        .0
        .into_complaint(token.subject().to_string(), Utc::now())?;
    let new_id: Id = new_complaints
        .insert_one(&complaint, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB.
        .into();
    let complaint = complaints.find_one(new_id.as_doc(), None).await?.unwrap();
    Ok(Json(complaint))
}

#[get("/complaints")]
async fn get_complaints(
    _token: AuthToken<Admin>,
    complaints: Coll<Complaint>,
) -> Result<Json<Vec<Complaint>>> {
    let newest_first = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let all: Vec<Complaint> = complaints
        .find(None, newest_first)
        .await?
        .try_collect()
        .await?;
    Ok(Json(all))
}

#[get("/complaints/mine")]
async fn get_my_complaints(
    token: AuthToken<Authenticated>,
    complaints: Coll<Complaint>,
) -> Result<Json<Vec<Complaint>>> {
    let mine = doc! { "submittedBy": token.subject() };
    let newest_first = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let own: Vec<Complaint> = complaints
        .find(mine, newest_first)
        .await?
        .try_collect()
        .await?;
    Ok(Json(own))
}

#[patch("/complaints/<complaint_id>", data = "<update>", format = "json")]
async fn update_complaint(
    _token: AuthToken<Admin>,
    complaint_id: Id,
    update: Json<ComplaintUpdate>,
    complaints: Coll<Complaint>,
) -> Result<Json<Complaint>> {
    let mut set = doc! { "status": update.0.status };
    if let Some(response) = update.0.response {
        set.insert("response", response);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let complaint = complaints
        .find_one_and_update(complaint_id.as_doc(), doc! { "$set": set }, options)
        .await?
        .ok_or_else(|| Error::not_found(format!("Complaint {complaint_id}")))?;
    Ok(Json(complaint))
}
