use crate::config::AppConfig;
use crate::db::MongoStore;
use crate::storage::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(MongoStore::connect(&config.db).await?) as Arc<dyn Store>;
        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake(store: Arc<dyn Store>) -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "MONGODB_URI" => Some("mongodb://localhost:27017".into()),
            "DB_NAME" => Some("test".into()),
            _ => None,
        })
        .expect("static test config is valid");
        Self::from_parts(store, Arc::new(config))
    }
}
