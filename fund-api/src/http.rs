//! Shared HTTP plumbing
//!
//! Builds URLs under the configured base, attaches the bearer token and
//! maps transport and status failures onto [`FundError`].

use fund_core::{FundError, FundResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;

/// Authenticated JSON client for the Fund Terminal backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> FundResult<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            FundError::config(format!("Invalid API URL {}: {}", config.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(FundError::config(format!(
                "Invalid API URL {}: cannot hold a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FundError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// URL for `segments` under the base path; each segment is percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> FundResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FundError::config(format!("Invalid API URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` and decode the JSON body
    pub async fn get<T>(&self, segments: &[&str], query: &[(&str, String)]) -> FundResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("[FundApi] GET {}", url.path());
        self.execute(self.client.get(url).query(query)).await
    }

    /// `POST` a JSON body and decode the JSON response
    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> FundResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("[FundApi] POST {}", url.path());
        self.execute(self.client.post(url).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> FundResult<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| FundError::network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| FundError::parse(format!("Failed to parse response: {}", e)))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Map a non-2xx response onto the error taxonomy
fn error_for_status(status: StatusCode, body: String) -> FundError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FundError::auth(message),
        StatusCode::NOT_FOUND => FundError::not_found(message),
        _ => FundError::api(status.as_u16(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::default().with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let api = client("http://localhost:8000/api");
        let url = api.endpoint(&["funds", "AXIS/BLUE CHIP", "nav"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/funds/AXIS%2FBLUE%20CHIP/nav"
        );

        let trailing = client("http://localhost:8000/api/");
        assert_eq!(
            trailing.endpoint(&["portfolio", "summary"]).unwrap().path(),
            "/api/portfolio/summary"
        );
    }

    #[test]
    fn test_rejects_unusable_base() {
        let err = ApiClient::new(&ApiConfig::default().with_base_url("mailto:ops@example.com"))
            .unwrap_err();
        assert!(matches!(err, FundError::Config(_)));
        assert!(ApiClient::new(&ApiConfig::default().with_base_url("::nope")).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, String::new()),
            FundError::Auth(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "nope".into()),
            FundError::Auth(_)
        ));
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, String::new()),
            FundError::not_found("Not Found")
        );
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, "upstream down".into()),
            FundError::api(502, "upstream down")
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let api = ApiClient::new(&ApiConfig::default().with_token("")).unwrap();
        assert!(!api.is_authenticated());
    }
}
