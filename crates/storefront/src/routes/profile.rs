//! Profile setup for callers who have not created a profile yet.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use handmade_market_core::{Email, UserProfile};
use serde::Deserialize;
use tracing::instrument;

use super::fragment::{RefetchQuery, SkeletonTemplate, Toast, invalid_input, mutate};
use crate::middleware::{OptionalIdentity, RequireIdentity};
use crate::state::AppState;
use crate::sync::{Mutation, QueryState};

const SETUP_SRC: &str = "/fragments/profile-setup";

/// Profile setup form, or nothing (HTMX, loaded by the layout).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/profile_setup.html")]
pub struct ProfileSetupTemplate {
    pub show_form: bool,
}

impl ProfileSetupTemplate {
    const fn hidden() -> Self {
        Self { show_form: false }
    }
}

/// Render the setup form when the caller is signed in without a profile.
#[instrument(skip(state, identity))]
pub async fn setup(
    State(state): State<AppState>,
    Query(query): Query<RefetchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Response {
    let Some(identity) = identity else {
        return ProfileSetupTemplate::hidden().into_response();
    };

    match state
        .queries()
        .current_user_profile(Some(&identity), query.refetch)
        .await
    {
        QueryState::Success(None) => ProfileSetupTemplate { show_form: true }.into_response(),
        QueryState::Success(Some(_)) => ProfileSetupTemplate::hidden().into_response(),
        QueryState::Disabled => SkeletonTemplate::poll(SETUP_SRC, 0).into_response(),
        QueryState::Error(e) => {
            tracing::warn!(error = %e, "Profile read failed, skipping setup");
            ProfileSetupTemplate::hidden().into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    /// Validate the form into a profile.
    fn into_profile(self) -> Result<UserProfile, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name");
        }

        let email = match self.email.trim() {
            "" => None,
            raw => Some(
                Email::parse(raw)
                    .map_err(|_| "Please enter a valid email address")?
                    .into_inner(),
            ),
        };
        let bio = Some(self.bio.trim().to_string()).filter(|b| !b.is_empty());

        Ok(UserProfile {
            name: name.to_string(),
            bio,
            email,
        })
    }
}

/// Save the caller's profile and hide the setup form.
#[instrument(skip(state, identity, form), fields(caller = %identity.principal))]
pub async fn save(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<ProfileForm>,
) -> Response {
    let profile = match form.into_profile() {
        Ok(profile) => profile,
        Err(message) => return invalid_input(message),
    };

    if let Err(response) = mutate(&state, &identity, Mutation::SaveProfile(profile)).await {
        return response;
    }

    Toast::success("Profile saved!").with_body(ProfileSetupTemplate::hidden())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, bio: &str, email: &str) -> ProfileForm {
        ProfileForm {
            name: name.to_string(),
            bio: bio.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_profile_form_validation() {
        assert_eq!(form("  ", "", "").into_profile().unwrap_err(), "Please enter your name");
        assert_eq!(
            form("Ada", "", "not-an-email").into_profile().unwrap_err(),
            "Please enter a valid email address"
        );

        let profile = form(" Ada ", "  ", " ada@example.com ").into_profile().unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.bio, None);
        assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
    }
}
