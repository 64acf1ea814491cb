use async_trait::async_trait;
use bson::{oid::ObjectId, Bson};
use mongodb::error::{ErrorKind, WriteFailure};

use crate::{products::repo_types::Product, users::repo_types::User};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        let duplicate = matches!(
            e.kind.as_ref(),
            ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
        );
        if duplicate {
            StoreError::Duplicate
        } else {
            StoreError::Backend(e.into())
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations behind the HTTP routes.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &Bson) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::Duplicate`] when the email is already taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Newest first, at most `limit` items.
    async fn latest_products(&self, limit: i64) -> StoreResult<Vec<Product>>;
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn find_product(&self, id: ObjectId) -> StoreResult<Option<Product>>;
    /// Newest first.
    async fn products_by_user_email(&self, email: &str) -> StoreResult<Vec<Product>>;
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    /// Returns the number of removed documents (0 or 1).
    async fn delete_product(&self, id: ObjectId) -> StoreResult<u64>;

    async fn close(&self) {}
}
