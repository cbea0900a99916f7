//! Authentication gate
//!
//! Wraps protected pages: while auth state is loading nothing renders, an
//! unauthenticated visitor is redirected to the login route, and pages that
//! need a role turn away users without it.

use std::sync::Arc;
use tracing::debug;

use crate::navigation::{Navigator, LOGIN_ROUTE};

/// Snapshot of the local authentication context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub role: Option<String>,
}

impl AuthContext {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn signed_in(role: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            role: Some(role.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Auth state not yet known; show a placeholder
    Loading,
    /// Render the protected content
    Render,
    /// Visitor was sent elsewhere
    Redirect(String),
    /// Authenticated but lacking the required role
    Forbidden,
}

pub struct AuthGate {
    navigator: Arc<dyn Navigator>,
    login_route: String,
    required_role: Option<String>,
}

impl AuthGate {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            login_route: LOGIN_ROUTE.to_string(),
            required_role: None,
        }
    }

    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Only users whose role matches (case-insensitive) may pass
    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.required_role = Some(role.into());
        self
    }

    pub fn evaluate(&self, ctx: &AuthContext) -> GateDecision {
        if ctx.is_loading {
            return GateDecision::Loading;
        }

        if !ctx.is_authenticated {
            debug!("Not authenticated, redirecting to {}", self.login_route);
            self.navigator.navigate(&self.login_route);
            return GateDecision::Redirect(self.login_route.clone());
        }

        if let Some(required) = &self.required_role {
            let allowed = ctx
                .role
                .as_deref()
                .is_some_and(|role| role.eq_ignore_ascii_case(required));
            if !allowed {
                return GateDecision::Forbidden;
            }
        }

        GateDecision::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::testing::RecordingNavigator;

    #[test]
    fn test_loading_renders_nothing_and_does_not_redirect() {
        let nav = Arc::new(RecordingNavigator::default());
        let gate = AuthGate::new(nav.clone());

        assert_eq!(gate.evaluate(&AuthContext::loading()), GateDecision::Loading);
        assert!(nav.visited().is_empty());
    }

    #[test]
    fn test_signed_out_redirects_to_login() {
        let nav = Arc::new(RecordingNavigator::default());
        let gate = AuthGate::new(nav.clone());

        assert_eq!(
            gate.evaluate(&AuthContext::signed_out()),
            GateDecision::Redirect("/login".to_string())
        );
        assert_eq!(nav.visited(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_signed_in_renders() {
        let nav = Arc::new(RecordingNavigator::default());
        let gate = AuthGate::new(nav.clone()).login_route("/signin");

        assert_eq!(gate.evaluate(&AuthContext::signed_in("user")), GateDecision::Render);
        assert!(nav.visited().is_empty());
    }

    #[test]
    fn test_admin_gate() {
        let nav = Arc::new(RecordingNavigator::default());
        let gate = AuthGate::new(nav.clone()).require_role("admin");

        assert_eq!(gate.evaluate(&AuthContext::signed_in("Admin")), GateDecision::Render);
        assert_eq!(gate.evaluate(&AuthContext::signed_in("user")), GateDecision::Forbidden);
        assert_eq!(
            gate.evaluate(&AuthContext {
                is_authenticated: true,
                is_loading: false,
                role: None,
            }),
            GateDecision::Forbidden
        );
        assert!(nav.visited().is_empty());
    }
}
