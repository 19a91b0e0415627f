use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::OAuthError;

/// Requested permission scopes: a list joined with the provider's separator,
/// or a string the caller has already joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Joined(String),
    List(Vec<String>),
}

impl Scope {
    pub fn join(&self, separator: &str) -> String {
        match self {
            Scope::Joined(scope) => scope.clone(),
            Scope::List(items) => items.join(separator),
        }
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        Scope::Joined(scope.to_string())
    }
}

impl From<String> for Scope {
    fn from(scope: String) -> Self {
        Scope::Joined(scope)
    }
}

impl From<Vec<String>> for Scope {
    fn from(items: Vec<String>) -> Self {
        Scope::List(items)
    }
}

impl From<Vec<&str>> for Scope {
    fn from(items: Vec<&str>) -> Self {
        Scope::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Scope {
    fn from(items: &[&str]) -> Self {
        Scope::List(items.iter().map(|item| (*item).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Scope {
    fn from(items: [&str; N]) -> Self {
        Scope::List(items.iter().map(|item| (*item).to_string()).collect())
    }
}

/// Token-endpoint response body in whichever shape the provider returned.
///
/// Providers are supposed to answer with JSON, but real-world servers are
/// inconsistent and some respond with URL-encoded form data. Bodies that
/// fail JSON decoding are re-parsed as form data instead of rejected, so
/// callers must check which shape came back before interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenResponse {
    Json(serde_json::Value),
    Form(HashMap<String, Vec<String>>),
}

impl TokenResponse {
    pub(crate) fn parse(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => TokenResponse::Json(value),
            Err(_) => TokenResponse::Form(parse_form(body)),
        }
    }

    /// First string value for `key`, regardless of shape.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            TokenResponse::Json(value) => value.get(key)?.as_str(),
            TokenResponse::Form(map) => map.get(key)?.first().map(String::as_str),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.get("access_token")
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.get("refresh_token")
    }

    pub fn expires_in(&self) -> Option<u64> {
        match self {
            TokenResponse::Json(value) => match value.get("expires_in")? {
                serde_json::Value::Number(number) => number.as_u64(),
                serde_json::Value::String(text) => text.parse().ok(),
                _ => None,
            },
            TokenResponse::Form(map) => map.get("expires_in")?.first()?.parse().ok(),
        }
    }
}

fn parse_form(body: &str) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        // Valueless fields are dropped, so a body that is neither JSON nor
        // form data degrades to an empty map rather than one garbage key.
        if value.is_empty() {
            continue;
        }
        map.entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    map
}

/// Query parameters delivered to the redirect URI by the authorization
/// server.
#[derive(Debug, Clone)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

impl AuthorizationCallback {
    pub fn from_url(callback_url: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(callback_url)?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Self {
        let mut code = None;
        let mut error = None;
        let mut state = None;

        for (key, value) in pairs {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        Self { code, error, state }
    }

    /// The authorization code, or the failure the server reported instead.
    pub fn code(&self) -> Result<&str, OAuthError> {
        if let Some(error) = &self.error {
            return Err(OAuthError::AuthorizationDenied(error.clone()));
        }
        self.code
            .as_deref()
            .ok_or(OAuthError::MissingAuthorizationCode)
    }
}
