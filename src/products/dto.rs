use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::input::{coerce_number, present, to_stored, to_wire};
use crate::products::repo_types::{NewProduct, Product};

/// Request body for `POST /products`. Values are kept loose so that the
/// presence check and numeric coercion see exactly what the client sent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<Value>,
    pub image: Option<Value>,
    pub description: Option<Value>,
    pub rating: Option<Value>,
    pub price: Option<Value>,
    pub category: Option<Value>,
    pub user_email: Option<Value>,
}

impl CreateProductRequest {
    /// `None` when any field is absent or falsy.
    pub fn validate(self) -> Option<NewProduct> {
        let stored = |v: Option<Value>| present(v).map(|v| to_stored(&v));
        let number = |v: Option<Value>| present(v).map(|v| coerce_number(&v));

        Some(NewProduct {
            name: stored(self.name)?,
            image: stored(self.image)?,
            description: stored(self.description)?,
            rating: number(self.rating)?,
            price: number(self.price)?,
            category: stored(self.category)?,
            user_email: stored(self.user_email)?,
        })
    }
}

/// Product as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Value,
    pub image: Value,
    pub description: Value,
    pub rating: f64,
    pub price: f64,
    pub category: Value,
    pub user_email: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_hex(),
            name: to_wire(p.name),
            image: to_wire(p.image),
            description: to_wire(p.description),
            rating: p.rating,
            price: p.price,
            category: to_wire(p.category),
            user_email: to_wire(p.user_email),
            created_at: p.created_at.to_time_0_3(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProductResponse {
    pub message: &'static str,
    pub product_id: String,
}
