use crate::ClientConfig;

const SITE: &str = "https://api.planningcenteronline.com";
const AUTHORIZATION_PATH: &str = "/oauth/authorize";
const TOKEN_PATH: &str = "/oauth/token";
const SCOPE_SEPARATOR: &str = " ";

/// Preconfigured [`ClientConfig`] for Planning Center Online.
///
/// Pure endpoint data; behavior is the plain authorization-code flow.
pub fn planning_center(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    redirect_uri: impl Into<String>,
) -> ClientConfig {
    ClientConfig::new(client_id, client_secret, SITE, redirect_uri)
        .with_authorization_path(AUTHORIZATION_PATH)
        .with_token_path(TOKEN_PATH)
        .with_scope_separator(SCOPE_SEPARATOR)
}
