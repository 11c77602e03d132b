use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        auth::{Admin, AuthToken},
        mongodb::{Coll, Id},
        post::{NewPost, Post, PostSpec},
    },
};

use super::Message;

pub fn routes() -> Vec<Route> {
    routes![get_posts, create_post, delete_post]
}

#[get("/posts")]
async fn get_posts(posts: Coll<Post>) -> Result<Json<Vec<Post>>> {
    let newest_first = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
    let all: Vec<Post> = posts.find(None, newest_first).await?.try_collect().await?;
    Ok(Json(all))
}

#[post("/posts", data = "<spec>", format = "json")]
async fn create_post(
    token: AuthToken<Admin>,
    spec: Json<PostSpec>,
    new_posts: Coll<NewPost>,
    posts: Coll<Post>,
) -> Result<Json<Post>> {
    let post = spec.0.into_post(token.subject().to_string(), Utc::now())?;
    let new_id: Id = new_posts
        .insert_one(&post, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB.
        .into();
    let post = posts.find_one(new_id.as_doc(), None).await?.unwrap();
    Ok(Json(post))
}

#[delete("/posts/<post_id>")]
async fn delete_post(
    _token: AuthToken<Admin>,
    post_id: Id,
    posts: Coll<Post>,
) -> Result<Json<Message>> {
    let result = posts.delete_one(post_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Post {post_id}")));
    }
    Ok(Json(Message::new("Post deleted successfully")))
}
