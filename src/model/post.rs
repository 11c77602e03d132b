use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::mongodb::Id,
};

/// Core announcement data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCore {
    pub title: String,
    pub content: String,
    pub category: String,
    /// Subject identifier of the posting admin.
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A post without an ID.
pub type NewPost = PostCore;

/// A post from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub post: PostCore,
}

impl Deref for Post {
    type Target = PostCore;

    fn deref(&self) -> &Self::Target {
        &self.post
    }
}

/// A new-announcement request from an admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostSpec {
    pub title: String,
    pub content: String,
    pub category: String,
}

impl PostSpec {
    pub fn into_post(self, author: String, now: DateTime<Utc>) -> Result<PostCore> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(Error::Validation(
                "Post title and content are required".to_string(),
            ));
        }
        Ok(PostCore {
            title: self.title,
            content: self.content,
            category: self.category,
            author,
            created_at: now,
        })
    }
}
