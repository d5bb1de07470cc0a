use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::providers::{LoginCoordinator, LoginStore, Session};

/// OAuth token response from the Rejestr mobile API.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// HTTP client for the Rejestr REST API.
///
/// Endpoint adapters share one client per account; the bearer token comes
/// from the [`Session`] the login coordinator produced, never from the
/// client itself.
pub struct RejestrClient {
    base_url: String,
    http: Client,
}

impl RejestrClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Create a client with a custom reqwest::Client (useful for testing).
    pub fn with_http_client(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an API endpoint and deserialize its JSON body.
    ///
    /// The `endpoint` is the relative path (e.g., "/api/oceny").
    pub async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(url = %url, "Fetching endpoint");

        let response = self
            .http
            .get(&url)
            .query(params)
            .bearer_auth(&session.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, endpoint = %endpoint, "Session rejected");
            return Err(SyncError::Auth(format!(
                "backend rejected the session for {endpoint} with status {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, endpoint = %endpoint, "API request failed");
            return Err(SyncError::Transport(format!(
                "request to {endpoint} failed with status {status}: {body}"
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            SyncError::Parse(format!("failed to deserialize response for {endpoint}: {e}"))
        })
    }
}

/// Client-credentials login flow against the Rejestr token endpoint.
pub struct RejestrLogin {
    token_url: String,
    http: Client,
}

impl RejestrLogin {
    pub fn new(base_url: &str) -> Self {
        Self {
            token_url: format!("{}/oauth/token", base_url.trim_end_matches('/')),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl LoginCoordinator for RejestrLogin {
    async fn authenticate(&self, store: &LoginStore) -> Result<Session> {
        let client_id = store
            .data_str("clientId")
            .ok_or_else(|| SyncError::Auth("login store has no clientId".into()))?;
        let client_secret = store
            .data_str("clientSecret")
            .ok_or_else(|| SyncError::Auth("login store has no clientSecret".into()))?;

        debug!(url = %self.token_url, "Authenticating with Rejestr");
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Authentication failed");
            return Err(SyncError::Auth(format!(
                "authentication failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Parse(format!("failed to parse token response: {e}")))?;
        debug!("Rejestr authentication successful");

        Ok(Session {
            token: token.access_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> Session {
        Session {
            token: "test-token".into(),
            expires_at: None,
        }
    }

    fn login_store(uri: &str) -> LoginStore {
        let mut data = serde_json::Map::new();
        data.insert("baseUrl".into(), uri.into());
        data.insert("clientId".into(), "client_id".into());
        data.insert("clientSecret".into(), "client_secret".into());
        LoginStore {
            id: 1,
            provider: "rejestr".into(),
            data,
        }
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(rename = "Data")]
        data: Vec<i64>,
    }

    #[tokio::test]
    async fn get_parses_typed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oceny"))
            .and(bearer_token("test-token"))
            .and(query_param("IdOkres", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"Data": [1, 2, 3]})),
            )
            .mount(&mock_server)
            .await;

        let client = RejestrClient::new(&mock_server.uri());
        let wrapper: Wrapper = client
            .get(&session(), "/api/oceny", &[("IdOkres", "1".to_string())])
            .await
            .unwrap();
        assert_eq!(wrapper.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oceny"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&mock_server)
            .await;

        let client = RejestrClient::new(&mock_server.uri());
        let err = client
            .get::<Wrapper>(&session(), "/api/oceny", &[])
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("rejected the session"));
    }

    #[tokio::test]
    async fn server_error_maps_to_transport_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oceny"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&mock_server)
            .await;

        let client = RejestrClient::new(&mock_server.uri());
        let err = client
            .get::<Wrapper>(&session(), "/api/oceny", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_body_maps_to_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oceny"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>przerwa techniczna</html>"))
            .mount(&mock_server)
            .await;

        let client = RejestrClient::new(&mock_server.uri());
        let err = client
            .get::<Wrapper>(&session(), "/api/oceny", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn authenticate_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "token-123",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&mock_server)
            .await;

        let login = RejestrLogin::new(&mock_server.uri());
        let session = login
            .authenticate(&login_store(&mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(session.token, "token-123");
        assert!(session.expires_at.is_some());
    }

    #[tokio::test]
    async fn authenticate_failure_is_fatal() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let login = RejestrLogin::new(&mock_server.uri());
        let err = login
            .authenticate(&login_store(&mock_server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("authentication failed"));
    }

    #[tokio::test]
    async fn authenticate_requires_credentials() {
        let login = RejestrLogin::new("http://localhost:1");
        let store = LoginStore {
            id: 1,
            provider: "rejestr".into(),
            data: serde_json::Map::new(),
        };
        let err = login.authenticate(&store).await.unwrap_err();
        assert!(err.to_string().contains("clientId"));
    }

    #[tokio::test]
    async fn token_response_without_expires() {
        let json = r#"{"access_token":"abc123","token_type":"Bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc123");
        assert_eq!(token.expires_in, None);
    }
}
