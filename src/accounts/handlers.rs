use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRef, Path, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    accounts::{
        dto::{
            Credentials, LoggedInResponse, MessageResponse, MsgResponse, PublicUser,
            TokenResponse, ValidCredentials,
        },
        repo_types::NewUser,
    },
    auth::{AuthUser, JwtKeys},
    error::AppError,
    state::AppState,
    store::StoreError,
};

const HELLO_MESSAGE: &str = "Hello! I'm a message that came from the backend, check the network tab on the google inspector and you will see the GET request";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello).post(hello))
        .route("/user", get(list_users))
        .route("/user/:user_id", delete(delete_user))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/paginaprivada", get(private_page))
}

pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: HELLO_MESSAGE.into(),
    })
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.store.list_all().await.map_err(|e| {
        error!(error = %e, "list_all failed");
        AppError::internal("Error listing users", e)
    })?;

    if users.is_empty() {
        warn!("no users found");
        return Err(AppError::NotFound("No users found".into()));
    }

    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let ValidCredentials { email, password } = parse_credentials(payload)?;

    let user = match state.store.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthorized("Incorrect email".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AppError::internal("Error looking up user", e));
        }
    };

    if user.password != password {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&email).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        AppError::internal("Error issuing token", e)
    })?;

    info!(user_id = user.id, email = %email, "user logged in");
    Ok(Json(TokenResponse { access_token }))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<MsgResponse>, AppError> {
    let ValidCredentials { email, password } = parse_credentials(payload)?;

    match state.store.find_by_email(&email).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AppError::internal("Error looking up user", e));
        }
    }

    // The unique constraint still catches a concurrent signup that passed the check above.
    let user = match state.store.create(NewUser { email, password }).await {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!("email registered concurrently");
            return Err(AppError::Conflict("Email already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(AppError::internal("Error creating user", e));
        }
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Json(MsgResponse {
        msg: "User created successfully".into(),
    }))
}

#[instrument(skip(state, path))]
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = parse_user_id(path)?;

    let found = state.store.find_by_id(user_id).await.map_err(|e| {
        error!(error = %e, user_id, "find_by_id failed");
        AppError::internal("Error deleting user", e)
    })?;

    if found.is_none() {
        warn!(user_id, "user not found");
        return Err(AppError::NotFound("User not found".into()));
    }

    match state.store.delete(user_id).await {
        Ok(true) => {
            info!(user_id, "user deleted");
            Ok(Json(MessageResponse {
                message: "User deleted successfully".into(),
            }))
        }
        Ok(false) => {
            warn!(user_id, "user vanished before delete");
            Err(AppError::NotFound("User not found".into()))
        }
        Err(e) => {
            error!(error = %e, user_id, "delete user failed; rolled back");
            Err(AppError::internal("Error deleting user", e))
        }
    }
}

#[instrument(skip_all)]
pub async fn private_page(AuthUser(identity): AuthUser) -> Json<LoggedInResponse> {
    Json(LoggedInResponse {
        logged_in_as: identity,
    })
}

/// Ids are `SERIAL`; anything outside `i32` cannot name a row.
fn parse_user_id(path: Result<Path<i64>, PathRejection>) -> Result<i32, AppError> {
    let Path(raw) = path.map_err(|e| {
        warn!(error = %e, "rejected user id");
        AppError::BadRequest("user_id must be an integer".into())
    })?;
    i32::try_from(raw).map_err(|_| {
        warn!(user_id = raw, "user id out of range");
        AppError::NotFound("User not found".into())
    })
}

fn parse_credentials(
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<ValidCredentials, AppError> {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "rejected request body");
        AppError::BadRequest(e.body_text())
    })?;
    body.validate()
}
