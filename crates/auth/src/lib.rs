//! Supabase Auth (GoTrue) client
//!
//! Covers the two operations a backend needs from GoTrue: resolving the user
//! behind an access token, and deleting a user with the service role key.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error ({status}): {message}")]
    ApiError { status: StatusCode, message: String },

    /// The token was rejected (expired, revoked, malformed)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// User record as returned by GoTrue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

fn auth_url(base_url: &str, path: &str) -> String {
    format!("{}/auth/v1{}", base_url.trim_end_matches('/'), path)
}

async fn api_error(response: Response) -> AuthError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    AuthError::ApiError { status, message }
}

/// Client for user-facing GoTrue endpoints, authenticated with the anon key
#[derive(Debug, Clone)]
pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
}

impl Auth {
    pub fn new(url: &str, key: &str, http_client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            http_client,
        }
    }

    /// Resolve the user owning `access_token`.
    ///
    /// GoTrue validates the signature and expiry; a rejected token comes back
    /// as [`AuthError::Unauthorized`].
    pub async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty token".to_string()));
        }

        let response = self
            .http_client
            .get(auth_url(&self.url, "/user"))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<User>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = response.text().await.unwrap_or_default();
                log::debug!("GoTrue rejected access token: {}", message);
                Err(AuthError::Unauthorized(message))
            }
            _ => Err(api_error(response).await),
        }
    }
}

/// Client for the GoTrue admin API, authenticated with the service role key
#[derive(Debug, Clone)]
pub struct AdminAuth {
    url: String,
    service_role_key: String,
    http_client: Client,
}

impl AdminAuth {
    pub fn new(url: &str, service_role_key: &str, http_client: Client) -> Self {
        Self {
            url: url.to_string(),
            service_role_key: service_role_key.to_string(),
            http_client,
        }
    }

    /// Permanently delete a user
    pub async fn delete_user(&self, user_id: &str) -> Result<(), AuthError> {
        let url = auth_url(&self.url, &format!("/admin/users/{}", user_id));

        let response = self
            .http_client
            .delete(&url)
            .header("apikey", &self.service_role_key)
            .header(
                "Authorization",
                format!("Bearer {}", &self.service_role_key),
            )
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                log::info!("Deleted auth user {}", user_id);
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(AuthError::UserNotFound(user_id.to_string())),
            _ => Err(api_error(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "test_user_id",
                "email": "test@example.com",
                "role": "authenticated",
                "app_metadata": {},
                "user_metadata": {},
                "created_at": "2021-01-01T00:00:00Z"
            })))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon-key", Client::new());
        let user = auth.get_user("user-token").await.unwrap();

        assert_eq!(user.id, "test_user_id");
        assert_eq!(user.email, Some("test@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_get_user_rejected_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "msg": "invalid JWT"
            })))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(&mock_server.uri(), "anon-key", Client::new());
        let result = auth.get_user("expired").await;

        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_get_user_empty_token() {
        let auth = Auth::new("http://127.0.0.1:9", "anon-key", Client::new());
        let result = auth.get_user("  ").await;

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_admin_delete_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/user-1"))
            .and(header("authorization", "Bearer service-role"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let admin = AdminAuth::new(&mock_server.uri(), "service-role", Client::new());
        admin.delete_user("user-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_delete_missing_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let admin = AdminAuth::new(&mock_server.uri(), "service-role", Client::new());
        let result = admin.delete_user("ghost").await;

        assert!(matches!(result, Err(AuthError::UserNotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_admin_delete_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/auth/v1/admin/users/user-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let admin = AdminAuth::new(&mock_server.uri(), "service-role", Client::new());
        let result = admin.delete_user("user-1").await;

        match result {
            Err(AuthError::ApiError { status, message }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
