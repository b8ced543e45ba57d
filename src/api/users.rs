//! User endpoints: registration, login, and credential updates.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, subject_claims, verify_password};
use crate::records::{User, ROLES};
use crate::store::{Op, Query, SqlValue};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub new_password: String,
    pub new_role: String,
}

/// Response for endpoints that hand out a token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_role(role: &str) -> Result<(), ApiError> {
    if !ROLES.contains(&role) {
        return Err(ApiError::validation(
            "Role must be either 'admin' or 'user'.",
        ));
    }
    Ok(())
}

fn validate_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Username and password are required."));
    }
    if username.chars().count() > 50 {
        return Err(ApiError::validation(
            "Username must be at most 50 characters.",
        ));
    }
    if password.chars().count() > 100 {
        return Err(ApiError::validation(
            "Password must be at most 100 characters.",
        ));
    }
    Ok(())
}

/// POST /api/users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_credentials(&req.username, &req.password)?;
    validate_role(&req.role)?;

    let password = hash_password(&req.password)
        .map_err(|err| ApiError::internal(format!("password hashing failed: {err}")))?;

    let user = User {
        username: req.username.clone(),
        password,
        role: req.role,
    };
    state.store.insert(&user).await?;

    let access_token = state.tokens.issue(subject_claims(&req.username))?;

    tracing::info!(username = %req.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "User registered successfully.".to_string(),
            access_token,
        }),
    ))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_credentials(&req.username, &req.password)?;

    let rows = state
        .store
        .select::<User>(Query::new().filter("username", Op::Eq, req.username.as_str()))
        .await?;

    let stored_hash = rows
        .first()
        .and_then(|row| row.get("password"))
        .and_then(|value| value.as_str())
        .ok_or_else(|| ApiError::unauthorized("Invalid username."))?;

    if !verify_password(&req.password, stored_hash) {
        return Err(ApiError::unauthorized("Invalid password."));
    }

    let access_token = state.tokens.issue(subject_claims(&req.username))?;

    tracing::info!(username = %req.username, "User logged in");

    Ok(Json(TokenResponse {
        message: "User logged in successfully.".to_string(),
        access_token,
    }))
}

/// PUT /api/users/update
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_credentials(&req.username, &req.new_password)?;
    validate_role(&req.new_role)?;

    let password = hash_password(&req.new_password)
        .map_err(|err| ApiError::internal(format!("password hashing failed: {err}")))?;

    let affected = state
        .store
        .update::<User>(
            &[("username", SqlValue::from(req.username.as_str()))],
            &[
                ("password", SqlValue::from(password)),
                ("role", SqlValue::from(req.new_role.as_str())),
            ],
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found("User not found."));
    }

    tracing::info!(username = %req.username, "User updated");

    Ok(Json(MessageResponse {
        message: format!("User {} updated successfully.", req.username),
    }))
}
