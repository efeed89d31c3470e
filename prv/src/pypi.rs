use crate::registry::RegistryLookup;
use async_trait::async_trait;
use req_verify_core::RegistryError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// Client for querying the PyPI JSON API
#[derive(Debug, Clone)]
pub struct PyPiClient {
    client: reqwest::Client,
    base_url: String,
}

/// PyPI JSON API response structure; only the release keys are used
#[derive(Debug, Deserialize)]
struct PyPiResponse {
    /// Keys stay in response order
    releases: serde_json::Map<String, serde_json::Value>,
}

impl PyPiClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("pip-req-verify/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: DEFAULT_INDEX_URL.to_string(),
        }
    }

    pub fn with_index_url(mut self, url: &str) -> Self {
        // Remove trailing slash if present
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl RegistryLookup for PyPiClient {
    async fn get_available_versions(&self, package: &str) -> Result<Vec<String>, RegistryError> {
        let url = format!("{}/{}/json", self.base_url, package);
        debug!(%url, "fetching package metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::Http {
                package: package.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                package: package.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RegistryError::Http {
                package: package.to_string(),
                message: format!("request failed with status: {status}"),
            });
        }

        let data: PyPiResponse = response.json().await.map_err(|e| RegistryError::Malformed {
            package: package.to_string(),
            message: e.to_string(),
        })?;

        Ok(data.releases.into_iter().map(|(version, _)| version).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PyPiClient {
        PyPiClient::new(Duration::from_secs(5)).with_index_url(&server.uri())
    }

    #[tokio::test]
    async fn test_get_available_versions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/requests/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "info": { "name": "requests" },
                "releases": {
                    "2.31.0": [{ "yanked": false }],
                    "2.0.0": [],
                    "1.0.0": [{ "yanked": true }]
                }
            })))
            .mount(&server)
            .await;

        let versions = client_for(&server)
            .get_available_versions("requests")
            .await
            .unwrap();

        assert_eq!(versions, ["2.31.0", "2.0.0", "1.0.0"]);
    }

    #[tokio::test]
    async fn test_versions_keep_registry_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg/json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"releases":{"2.0.0":[],"10.0.0":[],"1.0.0":[]}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let versions = client_for(&server)
            .get_available_versions("pkg")
            .await
            .unwrap();
        assert_eq!(versions, ["2.0.0", "10.0.0", "1.0.0"]);

        let declaration = req_verify_core::PackageDeclaration::named(
            "pkg",
            std::collections::BTreeSet::new(),
            vec![">=1.0".to_string()],
            None,
        );
        let outcome = req_verify_core::verify(declaration, &versions);
        assert!(outcome.verified);
        assert_eq!(outcome.diagnostics, ["version '2.0.0' satisfies '>=1.0'"]);
    }

    #[tokio::test]
    async fn test_get_available_versions_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/this-package-does-not-exist/json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .get_available_versions("this-package-does-not-exist")
            .await;

        assert_eq!(
            result,
            Err(RegistryError::NotFound {
                package: "this-package-does-not-exist".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_missing_releases_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flask/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "info": {} })),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).get_available_versions("flask").await;
        assert!(matches!(result, Err(RegistryError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_server_error_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client_for(&server).get_available_versions("flask").await;
        match result {
            Err(RegistryError::Http { message, .. }) => assert!(message.contains("503")),
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_index_url() {
        let client = PyPiClient::new(Duration::from_secs(1)).with_index_url("https://pypi.org/pypi/");
        assert_eq!(client.base_url, "https://pypi.org/pypi");
    }
}
