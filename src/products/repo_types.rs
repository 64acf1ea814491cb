use bson::{oid::ObjectId, Bson, DateTime};
use serde::{Deserialize, Serialize};

/// Product document in the `products` collection. Text fields keep whatever
/// JSON value the client posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: Bson,
    pub image: Bson,
    pub description: Bson,
    pub rating: f64,
    pub price: f64,
    pub category: Bson,
    pub user_email: Bson, // creator, not enforced against `users`
    pub created_at: DateTime,
}

/// Validated fields of a product about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: Bson,
    pub image: Bson,
    pub description: Bson,
    pub rating: f64,
    pub price: f64,
    pub category: Bson,
    pub user_email: Bson,
}

impl From<NewProduct> for Product {
    fn from(p: NewProduct) -> Self {
        Self {
            id: ObjectId::new(),
            name: p.name,
            image: p.image,
            description: p.description,
            rating: p.rating,
            price: p.price,
            category: p.category,
            user_email: p.user_email,
            created_at: DateTime::now(),
        }
    }
}
