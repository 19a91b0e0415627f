//! Demo web app for the Planning Center Online API.
//!
//! Register `http://localhost:5000/auth/callback` as a callback URI for your
//! application and export `PCO_CLIENT_ID` / `PCO_CLIENT_SECRET` before
//! running. The session store is a single in-process slot; this is example
//! glue, not a pattern for multi-user deployments.

use std::env;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
};
use tracing::{error, info};

use oauth2_connect::{AuthorizationCallback, OAuth2Client, providers};

const PEOPLE_URL: &str = "https://api.planningcenteronline.com/people/v2/people";
const REDIRECT_URI: &str = "http://localhost:5000/auth/callback";
const SCOPES: [&str; 4] = ["people", "services", "check_ins", "resources"];

#[derive(Clone)]
struct AppState {
    auth: OAuth2Client,
    session: Arc<Mutex<Option<String>>>,
    http: reqwest::Client,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pco_demo=debug".into()),
        )
        .init();

    let client_id = env::var("PCO_CLIENT_ID")?;
    let client_secret = env::var("PCO_CLIENT_SECRET")?;

    let config = providers::planning_center(client_id, client_secret, REDIRECT_URI);
    let auth = OAuth2Client::new(config)?;

    let state = AppState {
        auth,
        session: Arc::new(Mutex::new(None)),
        http: reqwest::Client::new(),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/pco/", get(pco_index))
        .route("/auth/callback", get(oauth_callback))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Redirect {
    Redirect::to("/pco/")
}

async fn pco_index(State(state): State<AppState>) -> Response {
    let token = state.session.lock().ok().and_then(|guard| guard.clone());
    let Some(token) = token else {
        return Redirect::to("/auth/callback").into_response();
    };

    match fetch_people(&state.http, &token).await {
        Ok(people) => Json(people).into_response(),
        Err(err) => {
            error!("people request failed: {err}");
            (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
        }
    }
}

async fn fetch_people(
    http: &reqwest::Client,
    token: &str,
) -> Result<serde_json::Value, reqwest::Error> {
    http.get(PEOPLE_URL)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

async fn oauth_callback(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let callback = AuthorizationCallback::from_query(&query.unwrap_or_default());

    if let Some(reason) = &callback.error {
        return (
            StatusCode::BAD_REQUEST,
            format!("authorization failed: {reason}"),
        )
            .into_response();
    }

    let Some(code) = callback.code.as_deref() else {
        // No code yet: send the user off to consent.
        return match state
            .auth
            .authorize_url(SCOPES, &[("response_type", "code")])
        {
            Ok(url) => Redirect::to(&url).into_response(),
            Err(err) => {
                error!("failed to build authorize url: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
    };

    let token = match state
        .auth
        .get_token(code, &[("grant_type", "authorization_code")])
        .await
    {
        Ok(token) => token,
        Err(err) => {
            error!("token exchange failed: {err}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let Some(access_token) = token.access_token() else {
        error!("token response had no access_token");
        return StatusCode::BAD_GATEWAY.into_response();
    };

    if let Ok(mut guard) = state.session.lock() {
        *guard = Some(access_token.to_string());
    }
    Redirect::to("/").into_response()
}
