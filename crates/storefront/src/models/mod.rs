//! Session-scoped models for the storefront.

pub mod identity;
pub mod session;

pub use identity::Identity;
pub use session::keys as session_keys;
