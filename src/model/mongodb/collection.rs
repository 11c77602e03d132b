use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::{
    club::{Club, NewClub},
    complaint::{Complaint, NewComplaint},
    election::{Election, NewElection},
    post::{NewPost, Post},
    user::{NewUser, User},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// User collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}
impl MongoCollection for NewUser {
    const NAME: &'static str = USERS;
}

// Election collections
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}
impl MongoCollection for NewElection {
    const NAME: &'static str = ELECTIONS;
}

// Club collections
const CLUBS: &str = "clubs";
impl MongoCollection for Club {
    const NAME: &'static str = CLUBS;
}
impl MongoCollection for NewClub {
    const NAME: &'static str = CLUBS;
}

// Complaint collections
const COMPLAINTS: &str = "complaints";
impl MongoCollection for Complaint {
    const NAME: &'static str = COMPLAINTS;
}
impl MongoCollection for NewComplaint {
    const NAME: &'static str = COMPLAINTS;
}

// Post collections
const POSTS: &str = "posts";
impl MongoCollection for Post {
    const NAME: &'static str = POSTS;
}
impl MongoCollection for NewPost {
    const NAME: &'static str = POSTS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // User collection: emails and student IDs double as login identifiers.
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique.clone())
        .build();
    let student_id_index = IndexModel::builder()
        .keys(doc! {"studentId": 1})
        .options(unique.clone())
        .build();
    Coll::<User>::from_db(db)
        .create_indexes([email_index, student_id_index], None)
        .await?;

    // Club collection.
    let club_index = IndexModel::builder()
        .keys(doc! {"name": 1})
        .options(unique)
        .build();
    Coll::<Club>::from_db(db)
        .create_index(club_index, None)
        .await?;

    Ok(())
}
