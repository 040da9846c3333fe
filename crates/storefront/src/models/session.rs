//! Session-related types.

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the authenticated [`Identity`](crate::models::Identity).
    pub const IDENTITY: &str = "identity";

    /// Key for the login `state` parameter (CSRF protection).
    pub const LOGIN_STATE: &str = "login_state";

    /// Key for the page to return to after login.
    pub const RETURN_TO: &str = "return_to";
}
