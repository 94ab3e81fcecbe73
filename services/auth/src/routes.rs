//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    AppState,
    error::AuthResult,
    middleware::{RefreshToken, refresh_token_middleware},
    models::{LoginCredentials, NewUser, User},
    service::IssuedSession,
    validation,
};

/// Response for register and login
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Response for token refresh
#[derive(Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request for email verification
#[derive(Deserialize)]
pub struct VerifyUserRequest {
    pub email: String,
    pub confirm_code: u32,
}

/// Request for a new confirmation code
#[derive(Deserialize)]
pub struct ConfirmationCodeRequest {
    pub email: String,
    pub full_name: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn(refresh_token_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify_user))
        .route("/auth/confirmation", post(create_confirmation_code))
        .merge(session_routes)
        .with_state(state)
}

fn token_response(state: &AppState, session: IssuedSession) -> TokenResponse {
    TokenResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.service.tokens().access_token_expiry(),
        user: session.user,
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Registration attempt for: {}", payload.email);

    validation::validate_email(&payload.email)?;
    validation::validate_full_name(&payload.full_name)?;
    validation::validate_password(&payload.password)?;

    let session = state
        .service
        .register(NewUser {
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(token_response(&state, session))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Login attempt for: {}", payload.email);

    validation::validate_email(&payload.email)?;
    validation::validate_login_password(&payload.password)?;

    let session = state
        .service
        .login(LoginCredentials {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::OK, Json(token_response(&state, session))))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(RefreshToken(token)): Extension<RefreshToken>,
) -> AuthResult<impl IntoResponse> {
    info!("Token refresh request");

    let access_token = state.service.refresh_token(&token).await?;

    let response = RefreshTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.service.tokens().access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(RefreshToken(token)): Extension<RefreshToken>,
) -> AuthResult<impl IntoResponse> {
    info!("Logout request");

    state.service.logout(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Email verification endpoint
pub async fn verify_user(
    State(state): State<AppState>,
    Json(payload): Json<VerifyUserRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Verification attempt for: {}", payload.email);

    validation::validate_email(&payload.email)?;

    state
        .service
        .verify_user(&payload.email, payload.confirm_code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Confirmation code resend endpoint
pub async fn create_confirmation_code(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmationCodeRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Confirmation code requested for: {}", payload.email);

    validation::validate_email(&payload.email)?;
    validation::validate_full_name(&payload.full_name)?;

    state
        .service
        .create_confirmation_code(&payload.email, &payload.full_name)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
