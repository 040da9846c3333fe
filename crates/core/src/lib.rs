//! Handmade Market Core - Shared domain types.
//!
//! This crate mirrors the records exposed by the marketplace backend:
//! products, shops, categories, reviews, custom order requests and user
//! profiles, plus the newtypes used to keep identifiers apart.
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. The storefront crate owns all remote access.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, principals, prices, ratings and entity records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
