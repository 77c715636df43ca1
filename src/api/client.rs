use crate::api::models::{
    ErrorBody, ExecuteRequest, HealthResponse, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse, StatementOutcome, TablePreviewResponse, TablesResponse,
};
use crate::error::ApiError;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("sqlr-cli/", env!("CARGO_PKG_VERSION"));

/// Injected session-validity capability: yields the current bearer token,
/// if any. Implemented by the keyring-backed credential store.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Fixed token (or none), used for unauthenticated clients and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct RunnerClient {
    client: Client,
    pub base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl RunnerClient {
    // Create base client with default settings and no credentials
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        Self::with_token_provider(base_url, Arc::new(StaticToken(None)))
    }

    pub fn with_token_provider(
        base_url: String,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Transport {
                endpoint: "client_init".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(RunnerClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.token().is_some()
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }

        request
    }

    /// Authenticate against `/auth/login`; the caller is responsible for
    /// persisting the returned token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let endpoint = "/auth/login";
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .build_request(Method::POST, endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint))?;

        self.handle_response(response, endpoint).await
    }

    /// Create a new account via `/auth/register`.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let endpoint = "/auth/register";
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .build_request(Method::POST, endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint))?;

        self.handle_response(response, endpoint).await
    }

    /// Unauthenticated reachability probe.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let endpoint = "/health";

        let response = self
            .build_request(Method::GET, endpoint)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint))?;

        self.handle_response(response, endpoint).await
    }

    /// Submit one SQL statement to `/execute`.
    pub async fn execute(&self, query: &str) -> Result<StatementOutcome, ApiError> {
        let endpoint = "/execute";
        let body = ExecuteRequest {
            query: query.to_string(),
        };

        let response = self
            .build_request(Method::POST, endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint))?;

        self.handle_response(response, endpoint).await
    }

    /// Fetch the full table-name list from `/tables`.
    pub async fn list_tables(&self) -> Result<Vec<String>, ApiError> {
        let endpoint = "/tables";

        let response = self
            .build_request(Method::GET, endpoint)
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint))?;

        let body: TablesResponse = self.handle_response(response, endpoint).await?;
        Ok(body.tables)
    }

    /// Fetch column metadata and sample rows for one table.
    pub async fn table_preview(&self, table: &str) -> Result<TablePreviewResponse, ApiError> {
        let endpoint = format!("/table/{}", table);

        let response = self
            .build_request(Method::GET, &endpoint)
            .send()
            .await
            .map_err(|e| convert_request_error(e, &endpoint))?;

        self.handle_response(response, &endpoint).await
    }

    pub async fn handle_response<T>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            response.json::<T>().await.map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();

            match serde_json::from_str::<ErrorBody>(&error_text) {
                Ok(body) => match status.as_u16() {
                    401 | 403 => Err(ApiError::Unauthorized {
                        status: status.as_u16(),
                        endpoint: endpoint.to_string(),
                        server_message: body.error,
                    }),
                    _ => Err(ApiError::Service {
                        status: status.as_u16(),
                        endpoint: endpoint.to_string(),
                        message: body.error,
                    }),
                },
                Err(_) => Err(ApiError::Http {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    message: error_text,
                }),
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::core::session::DatabaseService for RunnerClient {
    async fn execute(&self, query: &str) -> Result<StatementOutcome, ApiError> {
        RunnerClient::execute(self, query).await
    }

    async fn list_tables(&self) -> Result<Vec<String>, ApiError> {
        RunnerClient::list_tables(self).await
    }

    async fn table_preview(&self, table: &str) -> Result<TablePreviewResponse, ApiError> {
        RunnerClient::table_preview(self, table).await
    }
}

fn convert_request_error(error: reqwest::Error, endpoint: &str) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            endpoint: endpoint.to_string(),
        }
    } else {
        ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RunnerClient::new("http://example.test".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RunnerClient::new("http://example.test/".to_string())
            .expect("client creation failed");
        assert_eq!(client.base_url, "http://example.test");
    }

    #[test]
    fn test_not_authenticated_without_token() {
        let client =
            RunnerClient::new("http://example.test".to_string()).expect("client creation failed");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_authenticated_with_token_provider() {
        let client = RunnerClient::with_token_provider(
            "http://example.test".to_string(),
            Arc::new(StaticToken(Some("jwt".to_string()))),
        )
        .expect("client creation failed");
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_build_request_without_token() {
        let client =
            RunnerClient::new("http://example.test".to_string()).expect("client creation failed");
        let request = client.build_request(Method::GET, "/tables");

        let built_request = request.build().expect("Failed to build request");

        assert_eq!(built_request.url().as_str(), "http://example.test/tables");
        assert_eq!(built_request.method(), Method::GET);
        assert!(built_request.headers().get("Authorization").is_none());
    }

    #[test]
    fn test_build_request_injects_bearer_token() {
        let client = RunnerClient::with_token_provider(
            "http://example.test".to_string(),
            Arc::new(StaticToken(Some("token_123".to_string()))),
        )
        .expect("client creation failed");

        let request = client.build_request(Method::POST, "/execute");
        let built_request = request.build().expect("Failed to build request");

        assert_eq!(
            built_request
                .headers()
                .get("Authorization")
                .unwrap()
                .to_str()
                .unwrap(),
            "Bearer token_123"
        );
    }
}
