//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the owner identified by a Bearer access token.

pub mod auth;
