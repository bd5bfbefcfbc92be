//! Route guard for protected admin views.
//!
//! The guard turns a session snapshot plus the requested location into an
//! explicit decision; the caller performs the actual navigation. While the
//! session restore is still in flight the guard makes no decision at all.

use super::session::Session;

/// Where unauthenticated visitors are sent
pub const LOGIN_ROUTE: &str = "/admin/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restore in flight; render a waiting indicator, navigate nowhere.
    Wait,
    /// Authenticated; render the protected content.
    Allow,
    /// Send the visitor to `LOGIN_ROUTE`, remembering where they wanted to
    /// go so a successful login can return there.
    RedirectToLogin { from: String },
}

pub fn evaluate(session: &Session, requested: &str) -> GuardDecision {
    if session.loading {
        return GuardDecision::Wait;
    }
    if !session.is_authenticated {
        return GuardDecision::RedirectToLogin {
            from: requested.to_string(),
        };
    }
    GuardDecision::Allow
}
