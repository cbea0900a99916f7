//! Identity-provider sync bridge
//!
//! Detects "signed in with the identity provider but unknown locally" and
//! reconciles the provider user into the application's own records with a
//! single remote call per transition.
//!
//! ```text
//!   Idle ──guard──▶ Syncing ──ok──▶ Synced ──▶ navigate(landing)
//!                      │
//!                      └──err──▶ Failed(message)
//!                                  │ cool-down elapsed and attempts left
//!                                  └──guard──▶ Syncing
//! ```
//!
//! Each attempt has a timeout and one bounded retry. After `max_attempts`
//! failed attempts the bridge stays `Failed` until the provider user
//! changes, local auth succeeds elsewhere, or `reset()` is called.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::navigation::{Navigator, LANDING_ROUTE};

/// Claim key used when the provider namespaces its role claim
pub const DEFAULT_ROLE_CLAIM: &str = "https://flowdeck.app/roles";
pub const DEFAULT_ROLE: &str = "user";
pub const DEFAULT_FIRST_NAME: &str = "Unknown";
pub const DEFAULT_LAST_NAME: &str = "User";

/// User profile as reported by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    /// Remaining claims, including any role claims
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl ProviderUser {
    /// Role from `claim_key` (string or first array element), then from a
    /// plain `roles` array.
    pub fn role(&self, claim_key: &str) -> Option<String> {
        fn first_str(value: &Value) -> Option<String> {
            match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Array(items) => items.iter().find_map(first_str),
                _ => None,
            }
        }

        self.claims
            .get(claim_key)
            .and_then(first_str)
            .or_else(|| self.claims.get("roles").and_then(first_str))
    }
}

/// Body of the reconciliation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub provider_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub email_verified: bool,
}

impl SyncRequest {
    pub fn from_provider_user(user: &ProviderUser, role_claim: &str) -> Self {
        fn non_empty(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
        }

        Self {
            provider_id: user.sub.clone(),
            email: user.email.clone().unwrap_or_default(),
            first_name: non_empty(&user.given_name)
                .unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
            last_name: non_empty(&user.family_name)
                .unwrap_or_else(|| DEFAULT_LAST_NAME.to_string()),
            role: user
                .role(role_claim)
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            email_verified: user.email_verified.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Identity provider session, owned elsewhere
pub trait IdentityProvider: Send + Sync {
    fn user(&self) -> Option<ProviderUser>;
    fn is_authenticated(&self) -> bool;
    fn token(&self) -> Option<String>;
}

/// The application's own auth state
pub trait LocalAuth: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// Performs the remote reconciliation
#[async_trait]
pub trait SyncClient: Send + Sync {
    async fn sync(&self, request: &SyncRequest, token: Option<&str>) -> Result<SyncResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
    Synced,
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct SyncPolicy {
    /// Deadline for a single call
    pub timeout: Duration,
    /// Extra calls made within one attempt after a failure
    pub retries_per_attempt: u32,
    /// Minimum wait after a failed attempt before the guard re-arms
    pub cooldown: Duration,
    /// Failed attempts tolerated for one provider user
    pub max_attempts: u32,
    pub role_claim: String,
    pub landing_route: String,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries_per_attempt: 1,
            cooldown: Duration::from_secs(30),
            max_attempts: 3,
            role_claim: DEFAULT_ROLE_CLAIM.to_string(),
            landing_route: LANDING_ROUTE.to_string(),
        }
    }
}

#[derive(Debug)]
struct BridgeInner {
    state: SyncState,
    subject: Option<String>,
    failed_attempts: u32,
    last_failure: Option<Instant>,
    /// Bumped whenever an in-flight outcome must no longer be applied
    generation: u64,
    /// Generation of the call currently running, if any
    in_flight: Option<u64>,
}

impl BridgeInner {
    fn new() -> Self {
        Self {
            state: SyncState::Idle,
            subject: None,
            failed_attempts: 0,
            last_failure: None,
            generation: 0,
            in_flight: None,
        }
    }

    /// Forget all history. A call still running becomes stale.
    fn clear(&mut self) {
        self.state = SyncState::Idle;
        self.subject = None;
        self.failed_attempts = 0;
        self.last_failure = None;
        self.in_flight = None;
        self.generation += 1;
    }
}

/// Releases the in-flight marker if an attempt is dropped before it
/// finishes, e.g. when the evaluating task is cancelled.
struct InFlight<'a> {
    bridge: &'a IdentitySyncBridge,
    generation: u64,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.bridge.lock();
        if inner.in_flight != Some(self.generation) {
            return;
        }
        debug!("Identity sync cancelled before completion");
        inner.in_flight = None;
        if inner.generation == self.generation {
            inner.state = SyncState::Idle;
        } else {
            inner.clear();
        }
    }
}

struct Attempt<'a> {
    request: SyncRequest,
    token: Option<String>,
    guard: InFlight<'a>,
}

pub struct IdentitySyncBridge {
    provider: Arc<dyn IdentityProvider>,
    local: Arc<dyn LocalAuth>,
    client: Arc<dyn SyncClient>,
    navigator: Arc<dyn Navigator>,
    policy: SyncPolicy,
    inner: Mutex<BridgeInner>,
}

impl IdentitySyncBridge {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        local: Arc<dyn LocalAuth>,
        client: Arc<dyn SyncClient>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_policy(provider, local, client, navigator, SyncPolicy::default())
    }

    pub fn with_policy(
        provider: Arc<dyn IdentityProvider>,
        local: Arc<dyn LocalAuth>,
        client: Arc<dyn SyncClient>,
        navigator: Arc<dyn Navigator>,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            provider,
            local,
            client,
            navigator,
            policy,
            inner: Mutex::new(BridgeInner::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeInner> {
        // Nothing panics while holding the lock; recover the data if it did.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SyncState {
        self.lock().state.clone()
    }

    /// Message of the last failed attempt, for display
    pub fn error(&self) -> Option<String> {
        match &self.lock().state {
            SyncState::Failed { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Forget failures and return to Idle
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Re-check the inputs and start a reconciliation if one is due.
    ///
    /// Call on every change of the provider or local auth context. At most
    /// one reconciliation runs at a time; while one is running this returns
    /// `Syncing` immediately. Dropping the returned future releases the
    /// in-flight marker.
    pub async fn evaluate(&self) -> SyncState {
        loop {
            let Some(attempt) = self.begin() else {
                return self.state();
            };

            let outcome = self
                .call_with_retry(&attempt.request, attempt.token.as_deref())
                .await;

            if let Some(state) = self.finish(attempt, outcome) {
                return state;
            }
            // The provider user changed while the call ran; check again.
        }
    }

    /// Apply the guard; on success mark Syncing and return the call inputs.
    fn begin(&self) -> Option<Attempt<'_>> {
        let provider_authenticated = self.provider.is_authenticated();
        let provider_user = self.provider.user();
        let local_authenticated = self.local.is_authenticated();

        let mut inner = self.lock();

        let subject = provider_user.as_ref().map(|u| u.sub.clone());
        if subject.is_some() && inner.subject.is_some() && subject != inner.subject {
            if inner.in_flight.is_some() {
                debug!("Provider user changed during sync, outcome will be discarded");
                inner.generation += 1;
                return None;
            }
            debug!("Provider user changed, clearing sync history");
            inner.clear();
        }

        if inner.in_flight.is_some() {
            return None;
        }

        if local_authenticated {
            inner.failed_attempts = 0;
            inner.last_failure = None;
            if matches!(inner.state, SyncState::Failed { .. }) {
                inner.state = SyncState::Idle;
            }
            // A later local sign-out is a new transition
            inner.subject = None;
            return None;
        }

        let user = match provider_user {
            Some(user) if provider_authenticated => user,
            _ => return None,
        };

        match &inner.state {
            SyncState::Synced if inner.subject.as_deref() == Some(user.sub.as_str()) => {
                return None;
            }
            SyncState::Failed { .. } => {
                if inner.failed_attempts >= self.policy.max_attempts {
                    return None;
                }
                let cooling = inner
                    .last_failure
                    .is_some_and(|at| at.elapsed() < self.policy.cooldown);
                if cooling {
                    return None;
                }
            }
            _ => {}
        }

        inner.generation += 1;
        let generation = inner.generation;
        inner.in_flight = Some(generation);
        inner.state = SyncState::Syncing;
        inner.subject = Some(user.sub.clone());
        drop(inner);

        debug!(provider_id = %user.sub, generation, "Starting identity sync");
        Some(Attempt {
            request: SyncRequest::from_provider_user(&user, &self.policy.role_claim),
            token: self.provider.token(),
            guard: InFlight {
                bridge: self,
                generation,
                finished: false,
            },
        })
    }

    /// Record the outcome of `attempt`. Returns None when the attempt was
    /// superseded by a provider user change and its outcome was dropped.
    fn finish(&self, mut attempt: Attempt<'_>, outcome: Result<()>) -> Option<SyncState> {
        attempt.guard.finished = true;
        let generation = attempt.guard.generation;
        let provider_id = attempt.request.provider_id;

        let mut inner = self.lock();
        let owns_marker = inner.in_flight == Some(generation);
        if owns_marker {
            inner.in_flight = None;
        }

        if inner.generation != generation {
            debug!(provider_id = %provider_id, "Discarding outcome of superseded identity sync");
            if owns_marker {
                inner.clear();
            }
            return None;
        }

        match outcome {
            Ok(()) => {
                info!(provider_id = %provider_id, "Identity sync complete");
                inner.state = SyncState::Synced;
                inner.failed_attempts = 0;
                inner.last_failure = None;
                drop(inner);
                self.navigator.navigate(&self.policy.landing_route);
                Some(SyncState::Synced)
            }
            Err(e) => {
                inner.failed_attempts += 1;
                inner.last_failure = Some(Instant::now());
                warn!(
                    provider_id = %provider_id,
                    attempt = inner.failed_attempts,
                    "Identity sync failed: {}",
                    e
                );
                inner.state = SyncState::Failed {
                    message: failure_message(&e),
                };
                Some(inner.state.clone())
            }
        }
    }

    async fn call_with_retry(&self, request: &SyncRequest, token: Option<&str>) -> Result<()> {
        let mut last_error = None;
        for call in 0..=self.policy.retries_per_attempt {
            if call > 0 {
                debug!(call, "Retrying identity sync");
            }
            match self.call_once(request, token).await {
                Ok(()) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| ClientError::SyncRejected("no attempt made".into())))
    }

    async fn call_once(&self, request: &SyncRequest, token: Option<&str>) -> Result<()> {
        let response = tokio::time::timeout(self.policy.timeout, self.client.sync(request, token))
            .await
            .map_err(|_| ClientError::Timeout(self.policy.timeout))??;

        if response.success {
            Ok(())
        } else {
            Err(ClientError::SyncRejected(
                response
                    .message
                    .unwrap_or_else(|| "sync was not accepted".to_string()),
            ))
        }
    }
}

fn failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Timeout(_) => "Account sync timed out. Please try again.".to_string(),
        ClientError::SyncRejected(reason) => format!("Account sync failed: {}", reason),
        other => format!("Account sync failed: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::testing::RecordingNavigator;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        user: Mutex<Option<ProviderUser>>,
        authenticated: AtomicBool,
    }

    impl FakeProvider {
        fn signed_in(sub: &str) -> Arc<Self> {
            let provider = Self::default();
            provider.set_user(sub);
            Arc::new(provider)
        }

        fn set_user(&self, sub: &str) {
            *self.user.lock().unwrap() = Some(ProviderUser {
                sub: sub.to_string(),
                email: Some(format!("{}@example.com", sub)),
                ..ProviderUser::default()
            });
            self.authenticated.store(true, Ordering::SeqCst);
        }
    }

    impl IdentityProvider for FakeProvider {
        fn user(&self) -> Option<ProviderUser> {
            self.user.lock().unwrap().clone()
        }

        fn is_authenticated(&self) -> bool {
            self.authenticated.load(Ordering::SeqCst)
        }

        fn token(&self) -> Option<String> {
            Some("provider-token".to_string())
        }
    }

    #[derive(Default)]
    struct FakeLocal(AtomicBool);

    impl LocalAuth for FakeLocal {
        fn is_authenticated(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        Reject,
        Hang,
        /// Succeeds after one second
        Slow,
    }

    struct FakeClient {
        behavior: Mutex<Behavior>,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        last_request: Mutex<Option<(SyncRequest, Option<String>)>>,
    }

    impl FakeClient {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior: Mutex::new(behavior),
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn max_active(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }

        fn last_provider_id(&self) -> Option<String> {
            self.last_request
                .lock()
                .unwrap()
                .as_ref()
                .map(|(request, _)| request.provider_id.clone())
        }

        fn set(&self, behavior: Behavior) {
            *self.behavior.lock().unwrap() = behavior;
        }
    }

    #[async_trait]
    impl SyncClient for FakeClient {
        async fn sync(&self, request: &SyncRequest, token: Option<&str>) -> Result<SyncResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            *self.last_request.lock().unwrap() =
                Some((request.clone(), token.map(str::to_string)));

            let behavior = *self.behavior.lock().unwrap();
            match behavior {
                Behavior::Hang => tokio::time::sleep(Duration::from_secs(3600)).await,
                Behavior::Slow => tokio::time::sleep(Duration::from_secs(1)).await,
                _ => {}
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            match behavior {
                Behavior::Succeed | Behavior::Slow => Ok(SyncResponse {
                    success: true,
                    ..SyncResponse::default()
                }),
                Behavior::Reject => Ok(SyncResponse {
                    success: false,
                    message: Some("email already linked".to_string()),
                    user: None,
                }),
                Behavior::Fail | Behavior::Hang => {
                    Err(ClientError::SyncRejected("upstream unavailable".to_string()))
                }
            }
        }
    }

    struct Harness {
        provider: Arc<FakeProvider>,
        local: Arc<FakeLocal>,
        client: Arc<FakeClient>,
        nav: Arc<RecordingNavigator>,
        bridge: Arc<IdentitySyncBridge>,
    }

    fn harness(behavior: Behavior, policy: SyncPolicy) -> Harness {
        let provider = FakeProvider::signed_in("auth0|42");
        let local = Arc::new(FakeLocal::default());
        let client = FakeClient::new(behavior);
        let nav = Arc::new(RecordingNavigator::default());
        let bridge = Arc::new(IdentitySyncBridge::with_policy(
            provider.clone(),
            local.clone(),
            client.clone(),
            nav.clone(),
            policy,
        ));
        Harness {
            provider,
            local,
            client,
            nav,
            bridge,
        }
    }

    #[test]
    fn test_payload_mapping_defaults() {
        let user = ProviderUser {
            sub: "auth0|1".to_string(),
            ..ProviderUser::default()
        };
        let request = SyncRequest::from_provider_user(&user, DEFAULT_ROLE_CLAIM);

        assert_eq!(request.provider_id, "auth0|1");
        assert_eq!(request.email, "");
        assert_eq!(request.first_name, "Unknown");
        assert_eq!(request.last_name, "User");
        assert_eq!(request.role, "user");
        assert!(!request.email_verified);
    }

    #[test]
    fn test_payload_mapping_from_claims() {
        let user: ProviderUser = serde_json::from_value(json!({
            "sub": "auth0|2",
            "email": "ada@example.com",
            "given_name": "Ada",
            "family_name": "Lovelace",
            "email_verified": true,
            "https://flowdeck.app/roles": ["admin", "editor"]
        }))
        .unwrap();
        let request = SyncRequest::from_provider_user(&user, DEFAULT_ROLE_CLAIM);

        assert_eq!(request.first_name, "Ada");
        assert_eq!(request.last_name, "Lovelace");
        assert_eq!(request.role, "admin");
        assert!(request.email_verified);

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["providerId"], json!("auth0|2"));
        assert_eq!(wire["emailVerified"], json!(true));
    }

    #[test]
    fn test_role_falls_back_to_roles_array() {
        let user: ProviderUser =
            serde_json::from_value(json!({"sub": "x", "roles": ["editor"]})).unwrap();
        assert_eq!(user.role(DEFAULT_ROLE_CLAIM), Some("editor".to_string()));
    }

    #[tokio::test]
    async fn test_success_syncs_once_and_navigates() {
        let h = harness(Behavior::Succeed, SyncPolicy::default());

        assert_eq!(h.bridge.evaluate().await, SyncState::Synced);
        assert_eq!(h.nav.visited(), vec![LANDING_ROUTE.to_string()]);

        // Local context has not caught up yet: re-render must not resync
        assert_eq!(h.bridge.evaluate().await, SyncState::Synced);
        assert_eq!(h.client.calls(), 1);

        let (request, token) = h.client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.email, "auth0|42@example.com");
        assert_eq!(token.as_deref(), Some("provider-token"));
    }

    #[tokio::test]
    async fn test_no_sync_when_locally_authenticated_or_provider_signed_out() {
        let h = harness(Behavior::Succeed, SyncPolicy::default());
        h.local.0.store(true, Ordering::SeqCst);
        assert_eq!(h.bridge.evaluate().await, SyncState::Idle);

        h.local.0.store(false, Ordering::SeqCst);
        h.provider.authenticated.store(false, Ordering::SeqCst);
        assert_eq!(h.bridge.evaluate().await, SyncState::Idle);

        assert_eq!(h.client.calls(), 0);
        assert!(h.nav.visited().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_captured_with_one_retry() {
        let h = harness(Behavior::Fail, SyncPolicy::default());

        let state = h.bridge.evaluate().await;
        assert!(matches!(state, SyncState::Failed { .. }));
        assert_eq!(h.client.calls(), 2);
        assert_eq!(
            h.bridge.error().as_deref(),
            Some("Account sync failed: upstream unavailable")
        );
        assert!(h.nav.visited().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_message_is_surfaced() {
        let policy = SyncPolicy {
            retries_per_attempt: 0,
            ..SyncPolicy::default()
        };
        let h = harness(Behavior::Reject, policy);

        h.bridge.evaluate().await;
        assert_eq!(
            h.bridge.error().as_deref(),
            Some("Account sync failed: email already linked")
        );
        assert_eq!(h.client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_and_attempt_limit() {
        let policy = SyncPolicy {
            retries_per_attempt: 0,
            cooldown: Duration::from_secs(30),
            max_attempts: 2,
            ..SyncPolicy::default()
        };
        let h = harness(Behavior::Fail, policy);

        h.bridge.evaluate().await;
        assert_eq!(h.client.calls(), 1);

        // Unchanged inputs inside the cool-down: no new call
        h.bridge.evaluate().await;
        assert_eq!(h.client.calls(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        h.bridge.evaluate().await;
        assert_eq!(h.client.calls(), 2);

        // Attempt budget exhausted
        tokio::time::advance(Duration::from_secs(31)).await;
        h.bridge.evaluate().await;
        assert_eq!(h.client.calls(), 2);
        assert!(matches!(h.bridge.state(), SyncState::Failed { .. }));

        // Explicit reset re-arms the guard
        h.client.set(Behavior::Succeed);
        h.bridge.reset();
        assert_eq!(h.bridge.evaluate().await, SyncState::Synced);
        assert_eq!(h.client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_provider_user_rearms_after_exhaustion() {
        let policy = SyncPolicy {
            retries_per_attempt: 0,
            max_attempts: 1,
            ..SyncPolicy::default()
        };
        let h = harness(Behavior::Fail, policy);

        h.bridge.evaluate().await;
        tokio::time::advance(Duration::from_secs(60)).await;
        h.bridge.evaluate().await;
        assert_eq!(h.client.calls(), 1);

        h.client.set(Behavior::Succeed);
        h.provider.set_user("auth0|43");
        assert_eq!(h.bridge.evaluate().await, SyncState::Synced);
        assert_eq!(h.client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let policy = SyncPolicy {
            timeout: Duration::from_secs(5),
            retries_per_attempt: 0,
            ..SyncPolicy::default()
        };
        let h = harness(Behavior::Hang, policy);

        let state = h.bridge.evaluate().await;
        assert_eq!(
            state,
            SyncState::Failed {
                message: "Account sync timed out. Please try again.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_local_sign_in_clears_failure() {
        let h = harness(Behavior::Fail, SyncPolicy::default());
        h.bridge.evaluate().await;
        assert!(h.bridge.error().is_some());

        h.local.0.store(true, Ordering::SeqCst);
        assert_eq!(h.bridge.evaluate().await, SyncState::Idle);
        assert!(h.bridge.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_evaluate_releases_in_flight_marker() {
        let h = harness(Behavior::Slow, SyncPolicy::default());

        let cancelled = tokio::time::timeout(Duration::from_millis(10), h.bridge.evaluate()).await;
        assert!(cancelled.is_err());
        assert_eq!(h.bridge.state(), SyncState::Idle);
        assert_eq!(h.client.calls(), 1);
        assert!(h.nav.visited().is_empty());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(h.bridge.evaluate().await, SyncState::Synced);
        assert_eq!(h.client.calls(), 2);
        assert_eq!(h.nav.visited(), vec![LANDING_ROUTE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_call_in_flight_when_evaluated_concurrently() {
        let h = harness(Behavior::Slow, SyncPolicy::default());

        let first = tokio::spawn({
            let bridge = h.bridge.clone();
            async move { bridge.evaluate().await }
        });
        while h.client.calls() == 0 {
            tokio::task::yield_now().await;
        }

        // Re-render while the call is running
        assert_eq!(h.bridge.evaluate().await, SyncState::Syncing);
        assert_eq!(first.await.unwrap(), SyncState::Synced);

        assert_eq!(h.client.calls(), 1);
        assert_eq!(h.client.max_active(), 1);
        assert_eq!(h.nav.visited().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_user_change_mid_sync_discards_stale_outcome() {
        let h = harness(Behavior::Slow, SyncPolicy::default());

        let first = tokio::spawn({
            let bridge = h.bridge.clone();
            async move { bridge.evaluate().await }
        });
        while h.client.calls() == 0 {
            tokio::task::yield_now().await;
        }

        h.provider.set_user("auth0|99");
        assert_eq!(h.bridge.evaluate().await, SyncState::Syncing);

        // The first evaluation drops the stale result and syncs the new user
        assert_eq!(first.await.unwrap(), SyncState::Synced);
        assert_eq!(h.client.calls(), 2);
        assert_eq!(h.client.max_active(), 1);
        assert_eq!(h.client.last_provider_id().as_deref(), Some("auth0|99"));
        assert_eq!(h.nav.visited(), vec![LANDING_ROUTE.to_string()]);

        // Already synced for the current user
        assert_eq!(h.bridge.evaluate().await, SyncState::Synced);
        assert_eq!(h.client.calls(), 2);
    }
}
