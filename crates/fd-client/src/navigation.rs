//! Navigation side effects

/// Where an authenticated user lands after login or sync
pub const LANDING_ROUTE: &str = "/dashboard";

/// Where unauthenticated users are sent
pub const LOGIN_ROUTE: &str = "/login";

/// Performs client-side route changes
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}
