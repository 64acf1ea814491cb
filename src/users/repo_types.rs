use bson::{oid::ObjectId, Bson, DateTime};
use serde::{Deserialize, Serialize};

/// User document in the `users` collection. Fields keep whatever JSON value
/// the client registered with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: Bson,
    pub email: Bson,
    pub password: Bson, // plaintext, compared verbatim on login
    pub image: Bson,
    pub created_at: DateTime,
}

impl User {
    pub fn new(name: Bson, email: Bson, password: Bson, image: Bson) -> Self {
        Self {
            id: ObjectId::new(),
            name,
            email,
            password,
            image,
            created_at: DateTime::now(),
        }
    }
}
