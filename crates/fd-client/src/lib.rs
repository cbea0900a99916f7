//! fd-client: Client-side State for the flowdeck Builder
//!
//! The builder UI consumes several externally owned contexts (auth,
//! identity provider, collaboration, theme, language). Here each one is an
//! explicit interface handed to the component that needs it, so the
//! components can be driven directly in tests.
//!
//! - `auth`: gate that renders, waits or redirects based on auth state
//! - `identity`: one-shot reconciliation of an identity-provider login
//! - `sync_client`: HTTP implementation of the reconciliation call
//! - `presence`: cursor markers and node badges for online collaborators
//! - `theme`, `i18n`: theme toggle and language selection

pub mod auth;
pub mod error;
pub mod i18n;
pub mod identity;
pub mod navigation;
pub mod presence;
pub mod sync_client;
pub mod theme;

pub use auth::{AuthContext, AuthGate, GateDecision};
pub use error::{ClientError, Result};
pub use i18n::{Language, Localization};
pub use identity::{IdentitySyncBridge, ProviderUser, SyncPolicy, SyncRequest, SyncState};
pub use navigation::Navigator;
pub use presence::{CollaborationContext, Collaborator, PresenceOverlay};
pub use sync_client::HttpSyncClient;
pub use theme::{Theme, ThemeState};
