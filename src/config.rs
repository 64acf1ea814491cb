use anyhow::{bail, Context};
use serde::Deserialize;

const DEFAULT_DB_HOST: &str = "cluster0.bfqzn.mongodb.net";
const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,https://ejp-nextjs-emartbd-client.vercel.app";

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    /// Full connection string (`mongodb://` or `mongodb+srv://`).
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let user = var("DB_USER");
        let password = var("DB_ACCESS");
        let uri = match var("MONGODB_URI") {
            Some(uri) => uri,
            None => {
                if user.is_none() || password.is_none() {
                    bail!("DB_USER and DB_ACCESS must be set when MONGODB_URI is not");
                }
                let host = var("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.into());
                format!("mongodb+srv://{host}/?retryWrites=true&w=majority&appName=Cluster0")
            }
        };
        let name = var("DB_NAME").context("DB_NAME must be set")?;

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {p}"))?,
            None => 3030,
        };

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            db: DbConfig {
                uri,
                user,
                password,
                name,
            },
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_origins,
        })
    }
}
