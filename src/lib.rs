//! Client library for a municipal pension fund ("Fundo Previdenciário")
//! content API.
//!
//! The core of the crate is the authenticated-session lifecycle: login,
//! logout, token refresh and restoring a persisted session at startup,
//! plus the route-guard decision consumed by protected admin surfaces.
//! Public content endpoints (news, transparency documents) ride on the
//! same client.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
