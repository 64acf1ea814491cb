use anyhow::Context;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson};
use futures::TryStreamExt;
use mongodb::{
    options::{ClientOptions, Credential, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};
use tracing::{info, warn};

use crate::{
    config::DbConfig,
    products::repo_types::Product,
    storage::{Store, StoreResult},
    users::repo_types::User,
};

/// MongoDB-backed [`Store`]. Holds one pooled client for the process lifetime.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    users: Collection<User>,
    products: Collection<Product>,
}

impl MongoStore {
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(&cfg.uri)
            .await
            .context("parse mongodb connection string")?;
        apply_client_settings(&mut options, cfg);
        let client = Client::with_options(options).context("build mongodb client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("ping mongodb")?;
        info!(db = %cfg.name, "connected to mongodb");

        let db = client.database(&cfg.name);
        let store = Self {
            users: db.collection("users"),
            products: db.collection("products"),
            client,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> anyhow::Result<()> {
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await
            .context("create users.email unique index")?;
        self.products
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userEmail": 1, "createdAt": -1 })
                    .build(),
            )
            .await
            .context("create products.userEmail index")?;
        Ok(())
    }
}

/// Pins the stable API and attaches credentials given outside the URI.
fn apply_client_settings(options: &mut ClientOptions, cfg: &DbConfig) {
    if let (Some(user), Some(password)) = (&cfg.user, &cfg.password) {
        options.credential = Some(
            Credential::builder()
                .username(user.clone())
                .password(password.clone())
                .build(),
        );
    }
    options.server_api = Some(
        ServerApi::builder()
            .version(ServerApiVersion::V1)
            .strict(true)
            .deprecation_errors(true)
            .build(),
    );
}

#[async_trait]
impl Store for MongoStore {
    async fn find_user_by_email(&self, email: &Bson) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email.clone() }).await?)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users.insert_one(user).await?;
        Ok(())
    }

    async fn latest_products(&self, limit: i64) -> StoreResult<Vec<Product>> {
        let cursor = self
            .products
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let cursor = self.products.find(doc! {}).await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    async fn find_product(&self, id: ObjectId) -> StoreResult<Option<Product>> {
        Ok(self.products.find_one(doc! { "_id": id }).await?)
    }

    async fn products_by_user_email(&self, email: &str) -> StoreResult<Vec<Product>> {
        let cursor = self
            .products
            .find(doc! { "userEmail": email })
            .sort(doc! { "createdAt": -1 })
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.products.insert_one(product).await?;
        Ok(())
    }

    async fn delete_product(&self, id: ObjectId) -> StoreResult<u64> {
        let result = self.products.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }

    async fn close(&self) {
        info!("closing mongodb client");
        // shutdown waits for outstanding sessions and cursors to be dropped
        let client = self.client.clone();
        let shutdown = async move { client.shutdown().await };
        if tokio::time::timeout(std::time::Duration::from_secs(5), shutdown)
            .await
            .is_err()
        {
            warn!("mongodb client shutdown timed out");
        }
    }
}
