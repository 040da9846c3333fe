//! Login through the external identity provider.
//!
//! - Login: stores a random `state` in the session and redirects to the provider
//! - Callback: checks `state`, then stores the returned principal and delegation
//! - Logout: clears the identity and every cached read scoped to it

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use handmade_market_core::Principal;
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_identity, set_identity};
use crate::models::{Identity, session_keys};
use crate::state::AppState;

const STATE_LENGTH: usize = 32;

/// Generate a random alphanumeric string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

/// Only same-site absolute paths are accepted as a post-login target.
fn safe_return_to(raw: &str) -> Option<&str> {
    (raw.starts_with('/') && !raw.starts_with("//") && !raw.contains('\\')).then_some(raw)
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

/// Redirect to the identity provider.
///
/// # Route
///
/// `GET /auth/login`
#[instrument(skip(state, session, query))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let login_state = generate_random_string(STATE_LENGTH);
    session
        .insert(session_keys::LOGIN_STATE, &login_state)
        .await?;

    if let Some(return_to) = query.return_to.as_deref().and_then(safe_return_to) {
        session.insert(session_keys::RETURN_TO, return_to).await?;
    }

    let config = state.config();
    let mut url = config.identity.provider_url.clone();
    url.query_pairs_mut()
        .append_pair("redirect_uri", &format!("{}/auth/callback", config.base_url))
        .append_pair("state", &login_state);

    Ok(Redirect::to(url.as_str()).into_response())
}

/// Query parameters of the identity provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub principal: Option<String>,
    pub delegation: Option<String>,
    /// Set by the provider when the caller cancelled.
    pub error: Option<String>,
}

/// Finish login.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip(session, query))]
pub async fn callback(
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        tracing::warn!(error, "Identity provider returned an error");
        return Ok(Redirect::to("/").into_response());
    }

    let stored_state: Option<String> = session.remove(session_keys::LOGIN_STATE).await?;
    match (stored_state, query.state) {
        (Some(stored), Some(returned)) if stored == returned => {}
        _ => {
            tracing::warn!("Login state mismatch");
            return Err(AppError::BadRequest("Login expired, please try again".to_string()));
        }
    }

    let principal = query
        .principal
        .as_deref()
        .map(Principal::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid principal: {e}")))?
        .ok_or_else(|| AppError::BadRequest("Missing principal".to_string()))?;
    let delegation = query
        .delegation
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing delegation".to_string()))?;

    let return_to: Option<String> = session.remove(session_keys::RETURN_TO).await?;

    let identity = Identity::new(principal, delegation);
    set_identity(&session, &identity).await?;
    set_sentry_user(&identity.principal);
    tracing::info!(principal = %identity.principal, "Caller logged in");

    Ok(Redirect::to(return_to.as_deref().unwrap_or("/")).into_response())
}

/// Log out.
///
/// # Route
///
/// `POST /auth/logout`
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    if let Some(identity) = clear_identity(&session).await? {
        state.queries().clear_caller(&identity.principal).await;
        tracing::info!(principal = %identity.principal, "Caller logged out");
    }
    clear_sentry_user();

    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string() {
        let value = generate_random_string(STATE_LENGTH);
        assert_eq!(value.len(), STATE_LENGTH);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(value, generate_random_string(STATE_LENGTH));
    }

    #[test]
    fn test_safe_return_to() {
        assert_eq!(safe_return_to("/wishlist"), Some("/wishlist"));
        assert_eq!(safe_return_to("//evil.example"), None);
        assert_eq!(safe_return_to("https://evil.example"), None);
        assert_eq!(safe_return_to("/\\evil.example"), None);
    }
}
