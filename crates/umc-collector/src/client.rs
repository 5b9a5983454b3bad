use base64::Engine as _;
use reqwest::header::AUTHORIZATION;

use crate::config::ServerConfig;
use crate::error::CollectError;

/// HTTP access to one polled target: base URL assembly plus the optional
/// Authorization header, over a shared connection pool.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base: String,
    auth: Option<String>,
}

impl ServiceClient {
    pub fn new(http: reqwest::Client, config: &ServerConfig) -> Self {
        let mut root = config.context_root.clone();
        if !root.starts_with('/') {
            root.insert(0, '/');
        }
        if !root.ends_with('/') {
            root.push('/');
        }
        Self {
            http,
            base: format!("http://{}:{}{}", config.host, config.port, root),
            auth: config.auth.clone(),
        }
    }

    /// Builds a GET request for `path` relative to the configured context
    /// root.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base, path.trim_start_matches('/'));
        let mut request = self.http.get(url);
        if let Some(auth) = &self.auth {
            request = request.header(AUTHORIZATION, auth.as_str());
        }
        request
    }

    /// GETs `path` and parses the response body as JSON. Any non-success
    /// status is an error.
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, CollectError> {
        let response = self.get(path).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::UnexpectedStatus(status));
        }
        Ok(response.json().await?)
    }

    #[cfg(test)]
    pub(crate) fn base(&self) -> &str {
        &self.base
    }
}

/// Builds a Basic Authorization header value.
pub fn basic(username: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalizes_context_root() {
        let http = reqwest::Client::new();

        let plain = ServiceClient::new(http.clone(), &ServerConfig::default());
        assert_eq!(plain.base(), "http://localhost:80/");

        let nested = ServiceClient::new(
            http.clone(),
            &ServerConfig {
                host: "repo.example.org".into(),
                port: 8081,
                context_root: "artifactory".into(),
                ..ServerConfig::default()
            },
        );
        assert_eq!(nested.base(), "http://repo.example.org:8081/artifactory/");
    }

    #[test]
    fn test_basic_auth_header() {
        // "admin:password" in RFC 4648 base64.
        assert_eq!(basic("admin", "password"), "Basic YWRtaW46cGFzc3dvcmQ=");
    }
}
