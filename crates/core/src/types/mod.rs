//! Core types for Handmade Market.
//!
//! Entities are immutable snapshots fetched from the backend. The storefront
//! never mutates identifiers; it only passes them back in requests.

pub mod bytes;
pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod principal;
pub mod profile;
pub mod review;
pub mod status;

pub use catalog::{Category, Product, Shop};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::CustomOrderRequest;
pub use price::Price;
pub use principal::{Principal, PrincipalError};
pub use profile::UserProfile;
pub use review::{Rating, RatingError, Review, average_rating};
pub use status::CustomOrderStatus;
