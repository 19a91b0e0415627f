//! OAuth 2.0 authorization-code grant helpers.
//!
//! A single [`OAuth2Client`] covers the four canonical operations of the
//! flow: building the consent URL, exchanging the callback code for a token,
//! refreshing, and revoking. Token-endpoint responses are decoded as JSON
//! when possible and fall back to URL-encoded form data otherwise, since
//! real-world providers disagree on the body encoding (see
//! [`TokenResponse`]). Provider presets are plain configuration values, see
//! [`providers`].

mod client;
mod error;
mod types;

pub mod providers;

pub use client::{
    ClientConfig, DEFAULT_AUTHORIZATION_PATH, DEFAULT_REVOKE_PATH, DEFAULT_TOKEN_PATH, OAuth2Client,
};
pub use error::OAuthError;
pub use types::{AuthorizationCallback, Scope, TokenResponse};
