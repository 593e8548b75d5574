//! services/api/src/web/auth.rs
//!
//! Account endpoints for registration, login, logout and session lookup.
//! They drive the same account service the sign-in conversation uses.

use crate::{accounts::AccountService, web::state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use neiji_core::{
    domain::User,
    validation::{validate_email, validate_password},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub device_id: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub device_id: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub device_id: String,
}

/// The session record of a device, as returned by the API.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_premium: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_premium: user.is_premium,
        }
    }
}

type HandlerResult<T> = Result<T, (StatusCode, String)>;

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a free account for a device
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> HandlerResult<impl IntoResponse> {
    check_credentials(&req.email, &req.password)?;
    let accounts = load_accounts(&state, &req.device_id).await;

    let created = accounts
        .register(&req.email, &req.password, req.name.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to register device {}: {}", req.device_id, e);
            internal("Failed to create account")
        })?;
    if !created {
        return Err((StatusCode::BAD_REQUEST, "Invalid email or password".to_string()));
    }

    let user = current_user(&accounts).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /auth/login - Sign a device in
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 400, description = "Invalid email or password format"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HandlerResult<impl IntoResponse> {
    check_credentials(&req.email, &req.password)?;
    let accounts = load_accounts(&state, &req.device_id).await;

    let accepted = accounts.login(&req.email, &req.password).await.map_err(|e| {
        error!("Failed to log in device {}: {}", req.device_id, e);
        internal("Failed to create session")
    })?;
    if !accepted {
        return Err((StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()));
    }

    let user = current_user(&accounts).await?;
    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

/// POST /auth/logout - Clear a device's session record
#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Logout successful"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> HandlerResult<StatusCode> {
    let accounts = load_accounts(&state, &req.device_id).await;
    accounts.logout().await.map_err(|e| {
        error!("Failed to log out device {}: {}", req.device_id, e);
        internal("Failed to logout")
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/session/{device_id} - The signed-in user of a device
#[utoipa::path(
    get,
    path = "/auth/session/{device_id}",
    params(
        ("device_id" = String, Path, description = "The device whose session is requested.")
    ),
    responses(
        (status = 200, description = "The device is signed in", body = UserResponse),
        (status = 404, description = "No session for this device")
    )
)]
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> HandlerResult<Json<UserResponse>> {
    let accounts = load_accounts(&state, &device_id).await;
    match accounts.current_user().await {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err((StatusCode::NOT_FOUND, "No session for this device".to_string())),
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn check_credentials(email: &str, password: &str) -> HandlerResult<()> {
    validate_email(email).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    validate_password(password).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(())
}

async fn load_accounts(state: &AppState, device_id: &str) -> AccountService {
    info!("Account request for device {}", device_id);
    AccountService::load(
        state.sessions.clone(),
        device_id,
        state.config.timings.login_latency,
    )
    .await
}

async fn current_user(accounts: &AccountService) -> HandlerResult<User> {
    accounts
        .current_user()
        .await
        .ok_or_else(|| internal("Session was not recorded"))
}

fn internal(message: &str) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_keeps_the_record_fields() {
        let response = UserResponse::from(User {
            id: "1".into(),
            email: "user@example.com".into(),
            name: None,
            is_premium: false,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "user@example.com");
        assert_eq!(json["isPremium"], false);
    }

    #[test]
    fn malformed_credentials_are_a_bad_request() {
        let (status, message) = check_credentials("not-an-email", "goodPass1").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!message.is_empty());
        assert!(check_credentials("user@example.com", "goodPass1").is_ok());
    }
}
