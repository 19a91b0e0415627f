use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("missing or empty configuration field: {field}")]
    MissingConfig { field: &'static str },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid header: {name}={value}")]
    InvalidHeader { name: String, value: String },

    #[error("missing authorization code in callback url")]
    MissingAuthorizationCode,

    #[error("authorization server returned error: {0}")]
    AuthorizationDenied(String),
}
