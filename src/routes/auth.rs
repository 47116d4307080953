/**
 * Authentication Routes
 * Signup with email verification, login, refresh-token rotation
 */
use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::password::{hash_password, verify_password};
use crate::db::models::User;
use crate::errors::ApiError;
use crate::routes::MessageResponse;
use crate::state::AppState;

const CREDENTIALS_ERROR: &str = "Could not validate credentials";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RequestEmailBody {
    pub email: String,
}

/// Public view of a user row; never exposes the password hash or the
/// stored refresh token.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub avatar: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user: UserResponse,
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Pull the bearer token out of the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()))
}

/// Resolve the requesting user from the bearer access token. Any failure
/// along the way collapses into the same 401 so callers cannot probe
/// which accounts exist.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = extract_bearer_token(headers)?;
    let email = state.tokens.validate_access_token(token)?;
    state
        .users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()))
}

/// Gravatar-style avatar URL derived from the lowercased email.
fn avatar_url(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{:x}?d=identicon",
        hasher.finalize()
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Username and password must not be empty".to_string(),
        ));
    }
    if !body.email.contains('@') {
        return Err(ApiError::UnprocessableEntity(
            "Invalid email address".to_string(),
        ));
    }

    if state.users.get_by_email(&body.email).await?.is_some() {
        return Err(ApiError::Conflict("Account already exists".to_string()));
    }

    let password_hash = hash_password(body.password).await?;
    let avatar = avatar_url(&body.email);
    let user = state
        .users
        .create(body.username.trim(), &body.email, &password_hash, &avatar)
        .await?;

    let token = state.tokens.issue_email_token(&user.email)?;
    state
        .mailer
        .send_verification(&user.email, &user.username, &token);

    tracing::info!(user_id = user.id, "new account created");

    let response = SignupResponse {
        user: UserResponse::from(&user),
        detail: "User successfully created. Check your email for confirmation.".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = state
        .users
        .get_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email".to_string()))?;

    if !user.confirmed {
        return Err(ApiError::Unauthorized("Email not confirmed".to_string()));
    }
    if !verify_password(body.password, user.password_hash.clone()).await {
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let access_token = state.tokens.issue_access_token(&user.email, None)?;
    let refresh_token = state.tokens.issue_refresh_token(&user.email, None)?;
    state
        .users
        .update_refresh_token(user.id, Some(&refresh_token))
        .await?;

    Ok(Json(TokenPair {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /api/auth/refresh_token
///
/// The presented token must match the one stored on the user row. A
/// mismatch means the token was already rotated or revoked; the stored
/// token is cleared so the whole family dies with it.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let email = state.tokens.validate_refresh_token(token)?;

    let user = state
        .users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(CREDENTIALS_ERROR.to_string()))?;

    if user.refresh_token.as_deref() != Some(token) {
        state.users.update_refresh_token(user.id, None).await?;
        tracing::warn!(user_id = user.id, "stale refresh token presented, revoking");
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    let access_token = state.tokens.issue_access_token(&user.email, None)?;
    let new_refresh = state.tokens.issue_refresh_token(&user.email, None)?;
    state
        .users
        .update_refresh_token(user.id, Some(&new_refresh))
        .await?;

    Ok(Json(TokenPair {
        access_token,
        refresh_token: new_refresh,
        token_type: "bearer".to_string(),
    }))
}

/// GET /api/auth/confirmed_email/{token}
pub async fn confirmed_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = state.tokens.resolve_email_from_token(&token)?;

    let user = state
        .users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Verification error".to_string()))?;

    if user.confirmed {
        return Ok(Json(MessageResponse {
            message: "Your email is already confirmed".to_string(),
        }));
    }

    state.users.confirm_email(&email).await?;
    tracing::info!(user_id = user.id, "email confirmed");
    Ok(Json(MessageResponse {
        message: "Email confirmed".to_string(),
    }))
}

/// POST /api/auth/request_email
///
/// Re-send the verification mail. The reply is the same whether or not
/// the address has an account.
pub async fn request_email(
    State(state): State<AppState>,
    Json(body): Json<RequestEmailBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(user) = state.users.get_by_email(&body.email).await? {
        if user.confirmed {
            return Ok(Json(MessageResponse {
                message: "Your email is already confirmed".to_string(),
            }));
        }
        let token = state.tokens.issue_email_token(&user.email)?;
        state
            .mailer
            .send_verification(&user.email, &user.username, &token);
    }
    Ok(Json(MessageResponse {
        message: "Check your email for confirmation.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db;
    use crate::routes::ErrorResponse;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use axum::Router;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = AppConfig::from_env();
        // Lazy pool on a port nothing listens on; tests below never reach
        // the database.
        let pool = db::lazy_pool("postgresql://127.0.0.1:1/contacts_test");
        AppState::new(config, pool)
    }

    fn test_app() -> Router {
        crate::create_app(test_state())
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9999))))
    }

    async fn error_detail(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice::<ErrorResponse>(&body).unwrap().detail
    }

    #[test]
    fn test_avatar_url_is_stable_and_case_insensitive() {
        let a = avatar_url("User@Example.com");
        let b = avatar_url("user@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");

        let mut bad = HeaderMap::new();
        bad.insert(AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert!(extract_bearer_token(&bad).is_err());
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_refresh_without_header_is_unauthorized() {
        let response = test_app()
            .oneshot(
                Request::get("/api/auth/refresh_token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_detail(response).await, CREDENTIALS_ERROR);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_scoped_token() {
        let state = test_state();
        let access = state
            .tokens
            .issue_access_token("user@example.com", None)
            .unwrap();
        let app = crate::create_app(state)
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9999))));

        let response = app
            .oneshot(
                Request::get("/api/auth/refresh_token")
                    .header(AUTHORIZATION, format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_detail(response).await, "Invalid scope for token");
    }

    #[tokio::test]
    async fn test_confirmed_email_with_garbage_token_is_422() {
        let response = test_app()
            .oneshot(
                Request::get("/api/auth/confirmed_email/not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error_detail(response).await,
            "Invalid token for email verification"
        );
    }
}
