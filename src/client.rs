use std::time::Duration;

use reqwest::{
    Client, RequestBuilder,
    header::{HeaderName, HeaderValue},
};
use url::Url;

use crate::{OAuthError, Scope, TokenResponse};

pub const DEFAULT_AUTHORIZATION_PATH: &str = "/oauth/authorize";
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";
pub const DEFAULT_REVOKE_PATH: &str = "/oauth2/revoke";

const DEFAULT_SCOPE_SEPARATOR: &str = " ";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub site: String,
    pub redirect_uri: String,
    pub authorization_path: String,
    pub token_path: String,
    pub revoke_path: String,
    pub scope_separator: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        site: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            site: site.into(),
            redirect_uri: redirect_uri.into(),
            authorization_path: DEFAULT_AUTHORIZATION_PATH.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            revoke_path: DEFAULT_REVOKE_PATH.to_string(),
            scope_separator: DEFAULT_SCOPE_SEPARATOR.to_string(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_authorization_path(mut self, path: impl Into<String>) -> Self {
        self.authorization_path = path.into();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_revoke_path(mut self, path: impl Into<String>) -> Self {
        self.revoke_path = path.into();
        self
    }

    pub fn with_scope_separator(mut self, separator: impl Into<String>) -> Self {
        self.scope_separator = separator.into();
        self
    }

    /// Header applied to every token-endpoint request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn validate(&self) -> Result<(), OAuthError> {
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("site", &self.site),
            ("redirect_uri", &self.redirect_uri),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(OAuthError::MissingConfig { field });
            }
        }
        Url::parse(&self.site)?;
        Ok(())
    }
}

/// OAuth2 authorization-code grant client for a single provider.
///
/// Each operation is a one-shot request/response cycle; the client holds no
/// runtime state beyond its immutable configuration and is safe to share
/// across tasks. Retry and backoff are the caller's responsibility.
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    config: ClientConfig,
    http: Client,
}

impl OAuth2Client {
    /// Validates the configuration and builds the transport. Missing or
    /// empty required fields fail here, not at call time.
    pub fn new(config: ClientConfig) -> Result<Self, OAuthError> {
        config.validate()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { config, http })
    }

    /// Same as [`OAuth2Client::new`] but reuses a caller-built transport,
    /// for connection pooling or timeout/proxy policies set elsewhere.
    pub fn with_http_client(config: ClientConfig, http: Client) -> Result<Self, OAuthError> {
        config.validate()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL to redirect the user to for consent.
    ///
    /// The query always carries `redirect_uri`, `client_id`, and the joined
    /// `scope`; `extra` pairs are merged afterwards and a colliding key
    /// replaces the required value (last write wins). Pure construction,
    /// nothing is sent.
    pub fn authorize_url(
        &self,
        scope: impl Into<Scope>,
        extra: &[(&str, &str)],
    ) -> Result<String, OAuthError> {
        let scope = scope.into().join(&self.config.scope_separator);
        let mut params = vec![
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("scope".to_string(), scope),
        ];
        merge_params(&mut params, extra);

        let mut url = Url::parse(&format!(
            "{}{}",
            self.config.site, self.config.authorization_path
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for a token.
    pub async fn get_token(
        &self,
        code: &str,
        extra: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthError> {
        let params = self.token_exchange_params(code, extra);
        self.post(&self.config.token_path, params).await
    }

    /// Requests a refreshed token. The base client only supplies its
    /// credentials; callers pass `grant_type=refresh_token` and the token
    /// itself through `extra`.
    pub async fn refresh_token(&self, extra: &[(&str, &str)]) -> Result<TokenResponse, OAuthError> {
        let params = self.refresh_params(extra);
        self.post(&self.config.token_path, params).await
    }

    /// Revokes a token.
    pub async fn revoke_token(
        &self,
        token: &str,
        extra: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthError> {
        let params = self.revoke_params(token, extra);
        self.post(&self.config.revoke_path, params).await
    }

    fn token_exchange_params(&self, code: &str, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut params = vec![
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("client_id".to_string(), self.config.client_id.clone()),
            (
                "client_secret".to_string(),
                self.config.client_secret.clone(),
            ),
            ("code".to_string(), code.to_string()),
        ];
        merge_params(&mut params, extra);
        params
    }

    fn refresh_params(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut params = vec![
            ("client_id".to_string(), self.config.client_id.clone()),
            (
                "client_secret".to_string(),
                self.config.client_secret.clone(),
            ),
        ];
        merge_params(&mut params, extra);
        params
    }

    fn revoke_params(&self, token: &str, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut params = vec![("token".to_string(), token.to_string())];
        merge_params(&mut params, extra);
        params
    }

    async fn post(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<TokenResponse, OAuthError> {
        let url = format!("{}{}", self.config.site, path);
        let mut builder = self.http.post(&url);
        builder = apply_headers(builder, &self.config.headers)?;

        let response = builder.form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OAuthError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(TokenResponse::parse(&body))
    }
}

// Last write wins: an extra that collides with an existing key replaces its
// value instead of appending a duplicate pair.
fn merge_params(params: &mut Vec<(String, String)>, extra: &[(&str, &str)]) {
    for (key, value) in extra {
        if let Some((_, existing)) = params.iter_mut().find(|(param, _)| param.as_str() == *key) {
            *existing = (*value).to_string();
        } else {
            params.push(((*key).to_string(), (*value).to_string()));
        }
    }
}

fn apply_headers(
    mut builder: RequestBuilder,
    headers: &[(String, String)],
) -> Result<RequestBuilder, OAuthError> {
    for (name, value) in headers {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| OAuthError::InvalidHeader {
                name: name.clone(),
                value: value.clone(),
            })?;
        let value = HeaderValue::from_str(value).map_err(|_| OAuthError::InvalidHeader {
            name: name.to_string(),
            value: value.clone(),
        })?;
        builder = builder.header(name, value);
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(
            "abc",
            "s3cret",
            "https://example.com",
            "https://app/callback",
        )
    }

    fn client() -> OAuth2Client {
        OAuth2Client::new(config()).unwrap()
    }

    fn query_pairs(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .into_owned()
            .collect()
    }

    #[test]
    fn authorize_url_includes_required_params() {
        let url = client().authorize_url(["read", "write"], &[]).unwrap();

        assert!(url.starts_with("https://example.com/oauth/authorize?"));
        let pairs = query_pairs(&url);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get("client_id"), Some(&"abc".to_string()));
        assert_eq!(
            pairs.get("redirect_uri"),
            Some(&"https://app/callback".to_string())
        );
        assert_eq!(pairs.get("scope"), Some(&"read write".to_string()));
    }

    #[test]
    fn authorize_url_encodes_as_expected() {
        let url = client().authorize_url(["read", "write"], &[]).unwrap();
        assert_eq!(
            url,
            "https://example.com/oauth/authorize?\
             redirect_uri=https%3A%2F%2Fapp%2Fcallback&client_id=abc&scope=read+write"
        );
    }

    #[test]
    fn authorize_url_is_idempotent() {
        let client = client();
        let first = client
            .authorize_url("read write", &[("response_type", "code")])
            .unwrap();
        let second = client
            .authorize_url("read write", &[("response_type", "code")])
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn authorize_url_merges_extras() {
        let url = client()
            .authorize_url("read", &[("response_type", "code"), ("state", "xyz")])
            .unwrap();
        let pairs = query_pairs(&url);
        assert_eq!(pairs.get("response_type"), Some(&"code".to_string()));
        assert_eq!(pairs.get("state"), Some(&"xyz".to_string()));
        assert_eq!(pairs.get("scope"), Some(&"read".to_string()));
    }

    #[test]
    fn authorize_url_extras_override_without_duplicating() {
        let url = client()
            .authorize_url("read", &[("scope", "everything")])
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let scopes: Vec<_> = parsed
            .query_pairs()
            .filter(|(key, _)| key == "scope")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(scopes, vec!["everything"]);
    }

    #[test]
    fn authorize_url_honors_custom_separator() {
        let config = config().with_scope_separator(",");
        let client = OAuth2Client::new(config).unwrap();
        let url = client.authorize_url(["read", "write"], &[]).unwrap();
        assert_eq!(
            query_pairs(&url).get("scope"),
            Some(&"read,write".to_string())
        );
    }

    #[test]
    fn token_exchange_body_carries_credentials_and_code() {
        let params =
            client().token_exchange_params("authcode", &[("grant_type", "authorization_code")]);
        assert_eq!(
            params,
            vec![
                (
                    "redirect_uri".to_string(),
                    "https://app/callback".to_string()
                ),
                ("client_id".to_string(), "abc".to_string()),
                ("client_secret".to_string(), "s3cret".to_string()),
                ("code".to_string(), "authcode".to_string()),
                ("grant_type".to_string(), "authorization_code".to_string()),
            ]
        );
    }

    #[test]
    fn token_exchange_extras_may_override() {
        let params = client()
            .token_exchange_params("authcode", &[("redirect_uri", "urn:ietf:wg:oauth:2.0:oob")]);
        let redirects: Vec<_> = params
            .iter()
            .filter(|(key, _)| key == "redirect_uri")
            .collect();
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0].1, "urn:ietf:wg:oauth:2.0:oob");
    }

    #[test]
    fn refresh_body_carries_only_credentials_plus_extras() {
        let params = client().refresh_params(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", "rt-123"),
        ]);
        assert_eq!(
            params,
            vec![
                ("client_id".to_string(), "abc".to_string()),
                ("client_secret".to_string(), "s3cret".to_string()),
                ("grant_type".to_string(), "refresh_token".to_string()),
                ("refresh_token".to_string(), "rt-123".to_string()),
            ]
        );
    }

    #[test]
    fn revoke_body_carries_token() {
        let params = client().revoke_params("at-123", &[]);
        assert_eq!(params, vec![("token".to_string(), "at-123".to_string())]);
    }

    #[test]
    fn construction_rejects_empty_required_fields() {
        let missing_id = ClientConfig::new("", "s", "https://example.com", "https://app/cb");
        assert!(matches!(
            OAuth2Client::new(missing_id),
            Err(OAuthError::MissingConfig { field: "client_id" })
        ));

        let missing_redirect = ClientConfig::new("id", "s", "https://example.com", "");
        assert!(matches!(
            OAuth2Client::new(missing_redirect),
            Err(OAuthError::MissingConfig {
                field: "redirect_uri"
            })
        ));
    }

    #[test]
    fn construction_rejects_unparseable_site() {
        let config = ClientConfig::new("id", "s", "not a url", "https://app/cb");
        assert!(matches!(OAuth2Client::new(config), Err(OAuthError::Url(_))));
    }

    #[test]
    fn apply_headers_lands_on_built_request() {
        let builder = Client::new().post("https://example.com/oauth/token");
        let headers = vec![("X-Api-Version".to_string(), "2".to_string())];
        let request = apply_headers(builder, &headers).unwrap().build().unwrap();
        assert_eq!(
            request.headers().get("x-api-version").unwrap(),
            &HeaderValue::from_static("2")
        );
    }

    #[test]
    fn apply_headers_rejects_malformed_names() {
        let builder = Client::new().post("https://example.com/oauth/token");
        let headers = vec![("Bad\nName".to_string(), "value".to_string())];
        assert!(matches!(
            apply_headers(builder, &headers),
            Err(OAuthError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn with_header_is_carried_by_the_config() {
        let config = config().with_header("Accept", "application/json");
        assert_eq!(
            config.headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn with_timeout_is_carried_by_the_config() {
        let config = config().with_timeout(Duration::from_secs(10));
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert!(OAuth2Client::new(config).is_ok());
    }

    #[test]
    fn with_http_client_still_validates_config() {
        let missing_secret = ClientConfig::new("id", "", "https://example.com", "https://app/cb");
        assert!(matches!(
            OAuth2Client::with_http_client(missing_secret, Client::new()),
            Err(OAuthError::MissingConfig {
                field: "client_secret"
            })
        ));
        assert!(OAuth2Client::with_http_client(config(), Client::new()).is_ok());
    }

    #[test]
    fn custom_paths_flow_into_urls() {
        let config = config()
            .with_authorization_path("/authorize")
            .with_token_path("/token");
        let client = OAuth2Client::new(config).unwrap();
        let url = client.authorize_url("read", &[]).unwrap();
        assert!(url.starts_with("https://example.com/authorize?"));
    }
}
