//! HTTP client for the pension fund REST API.
//!
//! `ApiClient` wraps `reqwest` with the base URL, bearer-token handling and
//! response checking shared by every endpoint. `ApiError` classifies
//! non-success responses so callers can react to authorization failures
//! without string-matching.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginResponse, RefreshResponse};
pub use error::ApiError;
