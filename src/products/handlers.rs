use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use bson::oid::ObjectId;
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, MessageBody, Result},
    products::{
        dto::{CreateProductRequest, CreatedProductResponse, ProductResponse},
        repo_types::Product,
    },
    state::AppState,
};

/// Size of the "latest products" strip.
const LATEST_LIMIT: i64 = 6;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/latest/products", get(latest_products))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/user/:email", get(products_by_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", delete(delete_product))
}

fn parse_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id).with_context(|| format!("invalid product id {id:?}"))?)
}

fn respond(products: Vec<Product>) -> Json<Vec<ProductResponse>> {
    Json(products.into_iter().map(ProductResponse::from).collect())
}

#[instrument(skip(state))]
pub async fn latest_products(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = state.store.latest_products(LATEST_LIMIT).await?;
    Ok(respond(products))
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = state.store.list_products().await?;
    Ok(respond(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id = parse_id(&id)?;
    match state.store.find_product(id).await? {
        Some(p) => Ok(Json(p.into())),
        None => Err(AppError::NotFound("Product not found".into())),
    }
}

#[instrument(skip(state))]
pub async fn products_by_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = state.store.products_by_user_email(&email).await?;
    Ok(respond(products))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedProductResponse>)> {
    let required = || AppError::BadRequest("All fields are required".into());

    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "product body rejected");
        required()
    })?;
    let Some(new_product) = payload.validate() else {
        warn!("product with missing fields");
        return Err(required());
    };

    let product = Product::from(new_product);
    state.store.insert_product(&product).await?;

    info!(product_id = %product.id, user_email = %product.user_email, "product created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedProductResponse {
            message: "Product added successfully",
            product_id: product.id.to_hex(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>> {
    let id = parse_id(&id)?;
    if state.store.delete_product(id).await? == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    info!(product_id = %id, "product deleted");
    Ok(Json(MessageBody::new("Product deleted successfully")))
}

#[cfg(test)]
mod product_tests {
    use std::{collections::HashSet, sync::Arc};

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};
    use tower::ServiceExt;

    use crate::{
        app::build_app,
        state::AppState,
        storage::memory::{BrokenStore, MemoryStore},
    };

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    async fn create(app: &Router, body: Value) -> (StatusCode, Value) {
        let req = Request::post("/products")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, req).await
    }

    fn lamp(owner: &str) -> Value {
        json!({
            "name": "Desk lamp",
            "image": "https://img.example.com/lamp.png",
            "description": "Warm light",
            "rating": "4.5",
            "price": 29.99,
            "category": "home",
            "userEmail": owner
        })
    }

    fn setup() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (build_app(AppState::fake(store.clone())), store)
    }

    fn created_at(v: &Value) -> OffsetDateTime {
        OffsetDateTime::parse(v["createdAt"].as_str().unwrap(), &Rfc3339).unwrap()
    }

    #[tokio::test]
    async fn create_returns_fresh_ids() {
        let (app, store) = setup();
        let mut ids = HashSet::new();
        for _ in 0..5 {
            let (status, body) = create(&app, lamp("a@example.com")).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["message"], "Product added successfully");
            assert!(ids.insert(body["productId"].as_str().unwrap().to_string()));
        }
        assert_eq!(store.product_count(), 5);
    }

    #[tokio::test]
    async fn create_coerces_numbers() {
        let (app, _) = setup();
        let (_, created) = create(&app, lamp("a@example.com")).await;
        let id = created["productId"].as_str().unwrap();

        let (status, body) = get(&app, &format!("/products/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_id"], id);
        assert_eq!(body["rating"], 4.5);
        assert_eq!(body["price"], 29.99);
        assert_eq!(body["userEmail"], "a@example.com");
    }

    #[tokio::test]
    async fn create_keeps_non_string_values() {
        let (app, store) = setup();
        let mut body = lamp("a@example.com");
        body["name"] = json!(7);
        body["category"] = json!(true);
        body["description"] = json!(["warm", "dimmable"]);

        let (status, created) = create(&app, body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.product_count(), 1);

        let id = created["productId"].as_str().unwrap();
        let (_, product) = get(&app, &format!("/products/{id}")).await;
        assert_eq!(product["name"], 7);
        assert_eq!(product["category"], true);
        assert_eq!(product["description"], json!(["warm", "dimmable"]));
    }

    #[tokio::test]
    async fn create_missing_field_creates_nothing() {
        for field in [
            "name",
            "image",
            "description",
            "rating",
            "price",
            "category",
            "userEmail",
        ] {
            let (app, store) = setup();
            let mut body = lamp("a@example.com");
            body.as_object_mut().unwrap().remove(field);

            let (status, res) = create(&app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "without {field}");
            assert_eq!(res["message"], "All fields are required");
            assert_eq!(store.product_count(), 0);
        }
    }

    #[tokio::test]
    async fn latest_is_capped_and_newest_first() {
        let (app, _) = setup();
        for _ in 0..8 {
            create(&app, lamp("a@example.com")).await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (status, body) = get(&app, "/latest/products").await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 6);
        for pair in items.windows(2) {
            assert!(created_at(&pair[0]) >= created_at(&pair[1]));
        }

        let (_, all) = get(&app, "/products").await;
        assert_eq!(all.as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn products_by_user_filters_exactly() {
        let (app, _) = setup();
        for owner in ["a@example.com", "b@example.com", "a@example.com", "A@example.com"] {
            create(&app, lamp(owner)).await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (status, body) = get(&app, "/products/user/a@example.com").await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|p| p["userEmail"] == "a@example.com"));
        assert!(created_at(&items[0]) >= created_at(&items[1]));

        let (_, none) = get(&app, "/products/user/nobody@example.com").await;
        assert!(none.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (app, store) = setup();
        let (_, created) = create(&app, lamp("a@example.com")).await;
        let uri = format!("/products/{}", created["productId"].as_str().unwrap());

        let (status, body) = delete(&app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product deleted successfully");
        assert_eq!(store.product_count(), 0);

        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");

        let (status, _) = delete(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_server_error() {
        let (app, _) = setup();
        let (status, body) = get(&app, "/products/not-an-id").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");

        let (status, _) = delete(&app, "/products/123").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // "user" is taken as a product id, not the by-owner listing
        let (status, _) = get(&app, "/products/user").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn storage_failure_is_generic_500() {
        let app = build_app(AppState::fake(Arc::new(BrokenStore)));
        for uri in ["/latest/products", "/products", "/products/user/a@example.com"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["message"], "Server error");
        }
        let (status, _) = create(&app, lamp("a@example.com")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
