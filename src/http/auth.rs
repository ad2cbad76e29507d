use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chefia_auth::{Auth, AuthError};

use super::{error::ApiError, AppState};

/// Identity attached to authenticated requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Resolves bearer tokens to users
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

#[async_trait]
impl TokenVerifier for Auth {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let user = self.get_user(token).await?;
        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}

fn bearer_token(request: &Request) -> Result<&str, ApiError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized("Missing authorization header"))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid authorization header format"))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthorized("Invalid authorization header format")),
    }
}

/// Reject requests without a valid bearer token; on success the
/// [`AuthUser`] is available as a request extension
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(e) => return e.into_response(),
    };

    let user = match state.verifier.verify(&token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Token verification failed");
            return ApiError::Unauthorized("Invalid or expired token").into_response();
        }
    };

    tracing::debug!(user_id = %user.id, "User authenticated");
    request.extensions_mut().insert(user);
    next.run(request).await
}
