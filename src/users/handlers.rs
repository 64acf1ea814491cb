use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, Result},
    input::{present, to_stored},
    state::AppState,
    storage::StoreError,
    users::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        repo_types::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let missing = || AppError::BadRequest("Some fields are missing".into());

    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "register body rejected");
        missing()
    })?;
    let (Some(name), Some(email), Some(password), Some(image)) = (
        present(payload.name),
        present(payload.email),
        present(payload.password),
        present(payload.image),
    ) else {
        warn!("register with missing fields");
        return Err(missing());
    };
    let email = to_stored(&email);

    let exists = || AppError::BadRequest("User already exists".into());
    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(exists());
    }

    let user = User::new(to_stored(&name), email, to_stored(&password), to_stored(&image));
    match state.store.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate) => {
            warn!(email = %user.email, "email registered concurrently");
            return Err(exists());
        }
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        message: "Registered successfully",
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    // an unreadable body carries no email, so it falls through to "not found"
    let payload = payload.map(|Json(p)| p).unwrap_or_else(|e| {
        warn!(error = %e, "login body rejected");
        LoginRequest::default()
    });

    let user = match present(payload.email).map(|e| to_stored(&e)) {
        Some(email) => state.store.find_user_by_email(&email).await?,
        None => None,
    };
    let Some(user) = user else {
        warn!("login unknown email");
        return Err(AppError::NotFound("User not found".into()));
    };

    if payload.password.as_ref().map(to_stored).as_ref() != Some(&user.password) {
        warn!(user_id = %user.id, "login wrong password");
        return Err(AppError::Unauthorized("Wrong password".into()));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login success",
        user: user.into(),
    }))
}
