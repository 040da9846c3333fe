//! Identity extractors.
//!
//! Read-only pages use [`OptionalIdentity`]; every mutating route requires
//! [`RequireIdentity`], which sends anonymous callers to the login flow.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{Identity, session_keys};

/// Login entry point.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires an authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn add_review(
///     RequireIdentity(identity): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Reviewing as {}", identity.principal)
/// }
/// ```
pub struct RequireIdentity(pub Identity);

/// Rejection for a request that needs an identity but has none.
pub enum AuthRejection {
    /// Redirect to the login page (plain browser requests).
    RedirectToLogin,
    /// Ask HTMX to navigate to the login page.
    HxRedirectToLogin,
    /// No session layer; should not happen with the full router.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HxRedirectToLogin => (
                StatusCode::OK,
                AppendHeaders([("HX-Redirect", LOGIN_PATH)]),
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(parts: &Parts) -> bool {
    parts.headers.contains_key("HX-Request")
}

async fn session_identity(session: &Session) -> Option<Identity> {
    session
        .get::<Identity>(session_keys::IDENTITY)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        match session_identity(session).await {
            Some(identity) => Ok(Self(identity)),
            None if is_htmx(parts) => Err(AuthRejection::HxRedirectToLogin),
            None => Err(AuthRejection::RedirectToLogin),
        }
    }
}

/// Extractor that optionally gets the current caller.
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = match parts.extensions.get::<Session>() {
            Some(session) => session_identity(session).await,
            None => None,
        };

        Ok(Self(identity))
    }
}

/// Store the caller identity in the session.
///
/// Cycles the session ID so a pre-login ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_identity(
    session: &Session,
    identity: &Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::IDENTITY, identity).await
}

/// Remove the caller identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_identity(
    session: &Session,
) -> Result<Option<Identity>, tower_sessions::session::Error> {
    session.remove::<Identity>(session_keys::IDENTITY).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, header};

    use super::*;

    #[test]
    fn test_htmx_rejection_sets_hx_redirect() {
        let response = AuthRejection::HxRedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("HX-Redirect").unwrap(), LOGIN_PATH);
    }

    #[test]
    fn test_plain_rejection_redirects() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), LOGIN_PATH);
    }

    #[test]
    fn test_is_htmx() {
        let (parts, ()) = Request::builder()
            .header("HX-Request", "true")
            .body(())
            .unwrap()
            .into_parts();
        assert!(is_htmx(&parts));

        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert!(!is_htmx(&parts));
    }
}
