//! Authentication: session lifecycle, persisted credentials, route guard.
//!
//! This module provides:
//! - `SessionManager`: login, logout, token refresh and session restore
//! - `SessionStore`: the persisted access/refresh token and cached profile
//! - `guard`: the allow/redirect decision for protected admin routes
//!
//! The persisted credential pair and cached profile are owned exclusively by
//! the session manager: written together on login, overwritten on refresh,
//! removed together on logout or invalidation.

pub mod guard;
pub mod session;
pub mod store;

pub use guard::{evaluate, GuardDecision, LOGIN_ROUTE};
pub use session::{AuthError, LoginOutcome, Session, SessionManager};
pub use store::SessionStore;
