//! Client-side state machine for one admin device.
//!
//! ```text
//! CheckingSession ──valid──▶ Authenticated ◀──valid / inconclusive── Verifying
//!       │                        │   ▲                                   │
//!   invalid/timeout              │   └──────────── every poll ───────────┘
//!       ▼                        │                                       │
//! Unauthenticated ◀── LoggingOut ◀── logout                    valid:false
//!   │       ▲                                                            ▼
//!   ▼       │ failure                                              SessionClosed
//! Authenticating ──success──▶ Authenticated
//! ```
//!
//! A keepalive reply is applied only while the state is still `Verifying`,
//! so a reply that arrives after logout or a fresh login is dropped.

use crate::config::AgentConfig;
use crate::error::{ClientError, Result};
use crate::storage::LocalStore;
use crate::transport::SessionApi;
use cyt_models::{LoginRequest, LoginResponse, VerifyRequest};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shown when another device's login closed this one.
pub const SESSION_CLOSED_MESSAGE: &str =
    "Tu sesión fue cerrada porque otro dispositivo inició sesión";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentState {
    /// A protected view loaded; one bounded verify is in flight.
    CheckingSession,
    Unauthenticated { error: Option<String> },
    Authenticating,
    Authenticated,
    /// Keepalive verify in flight.
    Verifying,
    /// Logout request in flight. Keepalive replies are ignored meanwhile.
    LoggingOut,
    /// The server confirmed the session is gone. Terminal until the user
    /// logs in again.
    SessionClosed { reason: String },
}

impl AgentState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AgentState::Authenticated | AgentState::Verifying)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    LoggedIn { device_id: String },
    LoggedOut,
    /// Drive the forced-logout modal from this.
    SessionClosed { reason: String },
}

enum VerifyOutcome {
    Valid,
    Invalid,
    Inconclusive(ClientError),
}

pub struct AdminAgent<A, L> {
    api: A,
    store: L,
    config: AgentConfig,
    state: watch::Sender<AgentState>,
    events: broadcast::Sender<AgentEvent>,
    keepalive: Mutex<Option<CancellationToken>>,
}

impl<A: SessionApi, L: LocalStore> AdminAgent<A, L> {
    pub fn new(api: A, store: L, config: AgentConfig) -> Self {
        let (state, _) = watch::channel(AgentState::Unauthenticated { error: None });
        let (events, _) = broadcast::channel(16);

        Self {
            api,
            store,
            config,
            state,
            events,
            keepalive: Mutex::new(None),
        }
    }

    pub fn state(&self) -> AgentState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AgentState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    pub fn device_id(&self) -> Result<String> {
        self.store.device_id()
    }

    fn set_state(&self, state: AgentState) {
        tracing::debug!(?state, "Agent state changed");
        self.state.send_replace(state);
    }

    fn emit(&self, event: AgentEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Run an API call under `limit`. Elapsed maps to [`ClientError::Timeout`].
    async fn bounded<T>(
        limit: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        time::timeout(limit, call)
            .await
            .unwrap_or(Err(ClientError::Timeout))
    }

    async fn verify_stored(&self, limit: Duration) -> Option<VerifyOutcome> {
        let token = match self.store.token() {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => return Some(VerifyOutcome::Inconclusive(e)),
        };
        let device_id = match self.store.device_id() {
            Ok(id) => id,
            Err(e) => return Some(VerifyOutcome::Inconclusive(e)),
        };

        let request = VerifyRequest::new(&device_id, &token);
        Some(match Self::bounded(limit, self.api.verify(&request)).await {
            Ok(true) => VerifyOutcome::Valid,
            Ok(false) => VerifyOutcome::Invalid,
            Err(e) => VerifyOutcome::Inconclusive(e),
        })
    }

    /// Decide the initial state of a protected view.
    ///
    /// Anything short of a confirmed valid session, including a timeout,
    /// lands in `Unauthenticated`. Only an explicit `valid: false` forgets
    /// the stored token.
    pub async fn check_session(&self) -> AgentState {
        self.set_state(AgentState::CheckingSession);

        let next = match self.verify_stored(self.config.initial_check_timeout).await {
            None => AgentState::Unauthenticated { error: None },
            Some(VerifyOutcome::Valid) => AgentState::Authenticated,
            Some(VerifyOutcome::Invalid) => {
                if let Err(e) = self.store.clear_token() {
                    tracing::warn!("Failed to clear stale token: {}", e);
                }
                AgentState::Unauthenticated { error: None }
            }
            Some(VerifyOutcome::Inconclusive(e)) => {
                tracing::warn!("Initial session check failed: {}", e);
                AgentState::Unauthenticated {
                    error: Some(e.to_string()),
                }
            }
        };

        self.set_state(next.clone());
        next
    }

    /// Whether some other device currently holds the admin session.
    pub async fn other_device_active(&self) -> Result<bool> {
        let device_id = self.store.device_id()?;
        Self::bounded(
            self.config.request_timeout,
            self.api.has_active_session(Some(&device_id)),
        )
        .await
    }

    /// Log in as this device, closing any other admin session.
    ///
    /// Stops any running keepalive loop; spawn a new one for the new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        self.stop_keepalive();
        self.set_state(AgentState::Authenticating);

        match self.try_login(username, password).await {
            Ok(response) => {
                self.set_state(AgentState::Authenticated);
                self.emit(AgentEvent::LoggedIn {
                    device_id: response.device_id.clone(),
                });
                tracing::info!(device_id = %response.device_id, "Admin logged in");
                Ok(response)
            }
            Err(e) => {
                tracing::warn!("Admin login failed: {}", e);
                self.set_state(AgentState::Unauthenticated {
                    error: Some(e.to_string()),
                });
                Err(e)
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let device_id = self.store.device_id()?;
        let request = LoginRequest::new(username, password, &device_id);

        let response = Self::bounded(self.config.request_timeout, self.api.login(&request)).await?;
        self.store.set_token(&response.token)?;
        Ok(response)
    }

    /// End this device's session on the server, then forget it locally.
    ///
    /// On failure the previous state is restored and a running keepalive
    /// loop carries on, so the user can retry.
    pub async fn logout(&self) -> Result<()> {
        let device_id = self.store.device_id()?;

        let previous = self.state.send_replace(AgentState::LoggingOut);
        if let Err(e) =
            Self::bounded(self.config.request_timeout, self.api.logout(&device_id)).await
        {
            tracing::warn!("Admin logout failed: {}", e);
            let restored = match previous {
                AgentState::Verifying => AgentState::Authenticated,
                other => other,
            };
            self.transition(|s| *s == AgentState::LoggingOut, restored);
            return Err(e);
        }

        self.stop_keepalive();
        self.store.clear_token()?;
        self.set_state(AgentState::Unauthenticated { error: None });
        self.emit(AgentEvent::LoggedOut);
        tracing::info!(device_id = %device_id, "Admin logged out");
        Ok(())
    }

    /// Leave `SessionClosed` once the user has dismissed the explanation.
    pub fn acknowledge_closed(&self) {
        if matches!(self.state(), AgentState::SessionClosed { .. }) {
            self.set_state(AgentState::Unauthenticated { error: None });
        }
    }

    /// Move `Verifying` to `SessionClosed`. Does nothing from any other state.
    fn close_session(&self) -> bool {
        let reason = SESSION_CLOSED_MESSAGE.to_string();
        if !self.transition(
            |s| *s == AgentState::Verifying,
            AgentState::SessionClosed {
                reason: reason.clone(),
            },
        ) {
            return false;
        }

        self.stop_keepalive();
        if let Err(e) = self.store.clear_token() {
            tracing::warn!("Failed to clear token after eviction: {}", e);
        }
        tracing::warn!("Admin session closed by server");
        self.emit(AgentEvent::SessionClosed { reason });
        true
    }

    fn stop_keepalive(&self) {
        let mut slot = self.keepalive.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cancel) = slot.take() {
            cancel.cancel();
        }
    }

    /// Move to `to` only if the current state satisfies `from`.
    fn transition(&self, from: impl FnOnce(&AgentState) -> bool, to: AgentState) -> bool {
        self.state.send_if_modified(|state| {
            if from(state) {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// One keepalive round. Returns `false` when the loop should stop.
    async fn keepalive_tick(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let mut keep_polling = true;
        let started = self.state.send_if_modified(|state| match state {
            AgentState::Authenticated => {
                *state = AgentState::Verifying;
                true
            }
            // Skip this round; logout decides what happens next.
            AgentState::LoggingOut => false,
            _ => {
                keep_polling = false;
                false
            }
        });
        if !started {
            return keep_polling;
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return false,
            outcome = self.verify_stored(self.config.verify_timeout) => outcome,
        };

        // Logout or teardown raced the response; it no longer applies.
        if cancel.is_cancelled() {
            return false;
        }

        let still_verifying = |s: &AgentState| *s == AgentState::Verifying;
        match outcome {
            None if self.transition(still_verifying, AgentState::Unauthenticated { error: None }) => {
                return false
            }
            Some(VerifyOutcome::Invalid) if self.close_session() => return false,
            Some(VerifyOutcome::Valid) if self.transition(still_verifying, AgentState::Authenticated) => {
                return true
            }
            Some(VerifyOutcome::Inconclusive(e)) => {
                tracing::warn!("Keepalive verify inconclusive, keeping session: {}", e);
                if self.transition(still_verifying, AgentState::Authenticated) {
                    return true;
                }
            }
            _ => {}
        }

        // The state moved on while the verify was in flight; drop the reply.
        tracing::debug!("Discarding stale keepalive reply");
        matches!(
            self.state(),
            AgentState::Authenticated | AgentState::LoggingOut
        )
    }

    /// Start polling the server every `poll_interval`.
    ///
    /// Replaces any loop already running. Each verify is awaited before the
    /// next tick is taken, so requests never overlap.
    pub fn spawn_keepalive(self: &Arc<Self>) -> KeepaliveHandle {
        let cancel = CancellationToken::new();
        {
            let mut slot = self.keepalive.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = slot.replace(cancel.clone()) {
                previous.cancel();
            }
        }

        let agent = Arc::clone(self);
        let loop_cancel = cancel.clone();
        let every = self.config.poll_interval;

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
                if !agent.keepalive_tick(&loop_cancel).await {
                    break;
                }
            }
            tracing::debug!("Keepalive loop stopped");
        });

        KeepaliveHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owns a running keepalive loop. Dropping it stops the loop.
pub struct KeepaliveHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl KeepaliveHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the loop to end on its own (eviction, logout or cancel).
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Keepalive task failed: {}", e);
            }
        }
    }

    /// Cancel and wait for the loop to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        self.finished().await;
    }
}

impl Drop for KeepaliveHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
