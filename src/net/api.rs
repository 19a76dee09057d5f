//! Auth calls against the bench-hub API.
//!
//! ERROR HANDLING
//! ==============
//! `login` stores the credential only after the server accepted it.
//! `logout` is best effort on the wire but always signs the local session
//! out, so a dead server never traps the user in a signed-in console.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::error::RequestError;
use super::gateway::{ApiRequest, Gateway};
use super::types::{Envelope, LoginData, LoginRequest, User};

pub const LOGIN_ENDPOINT: &str = "/api/v1/auth/login";
pub const LOGOUT_ENDPOINT: &str = "/api/v1/auth/logout";
pub const PING_ENDPOINT: &str = "/api/v1/ping";
pub const HEALTH_ENDPOINT: &str = "/health";

/// Exchange username/password for a credential and store it in the
/// gateway's session. Returns the signed-in user when the server sent one.
///
/// # Errors
///
/// `Status` (401 for bad credentials), `Api` for a non-zero envelope code,
/// `Decode` when the payload lacks a token, plus any transport error.
pub async fn login(gateway: &Gateway, username: &str, password: &str) -> Result<Option<User>, RequestError> {
    let body = LoginRequest { username, password };
    let envelope: Envelope<LoginData> = gateway.post_json(LOGIN_ENDPOINT, &body).await?;
    let data = envelope.into_data()?.ok_or_else(|| missing_field("data"))?;
    if data.access_token.is_empty() {
        return Err(missing_field("access_token"));
    }

    gateway.session().set(data.access_token);
    tracing::info!(user = data.user.as_ref().map_or("", |u| u.username.as_str()), "signed in");
    Ok(data.user)
}

/// Tell the server we are leaving, then clear the local session whatever
/// the server said.
pub async fn logout(gateway: &Gateway) {
    if gateway.session().is_authenticated() {
        if let Err(e) = gateway.send(ApiRequest::post(LOGOUT_ENDPOINT)).await {
            tracing::warn!(error = %e, "logout request failed");
        }
    }
    gateway.session().clear();
    tracing::info!("signed out");
}

/// Public reachability check. Carries the credential when one is held, but
/// the server does not require it.
///
/// # Errors
///
/// Any gateway error, or `Api` for a non-zero envelope code.
pub async fn ping(gateway: &Gateway) -> Result<serde_json::Value, RequestError> {
    let envelope: Envelope<serde_json::Value> = gateway.get_json(PING_ENDPOINT).await?;
    Ok(envelope.into_data()?.unwrap_or_default())
}

/// Unauthenticated liveness check.
///
/// # Errors
///
/// Any gateway error, or `Api` for a non-zero envelope code.
pub async fn health(gateway: &Gateway) -> Result<(), RequestError> {
    let envelope: Envelope<serde_json::Value> = gateway.get_json(HEALTH_ENDPOINT).await?;
    envelope.into_data()?;
    Ok(())
}

fn missing_field(field: &'static str) -> RequestError {
    RequestError::Decode(<serde_json::Error as serde::de::Error>::missing_field(field))
}
