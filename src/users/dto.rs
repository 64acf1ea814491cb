use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::input::to_wire;
use crate::users::repo_types::User;

/// Request body for `/register`. Fields are loose so that a missing one is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
    pub image: Option<Value>,
}

/// Request body for `/login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// User record as returned to the client, password included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Value,
    pub email: Value,
    pub password: Value,
    pub image: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_hex(),
            name: to_wire(u.name),
            email: to_wire(u.email),
            password: to_wire(u.password),
            image: to_wire(u.image),
            created_at: u.created_at.to_time_0_3(),
        }
    }
}

/// Response of `/register` and `/login`.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserResponse,
}
