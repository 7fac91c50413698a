//! Process-wide session state.
//!
//! `SessionManager` is created once at startup around an `ApiClient`. It
//! starts in `Loading`, resolves to `Authenticated` or `Unauthenticated` in
//! [`SessionManager::init`], and publishes every change on a `watch`
//! channel. Login, register and logout live in `actions`.

mod actions;
pub mod machine;

use std::sync::{Mutex, PoisonError};

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use machine::{SessionInput, SessionMachine, SessionMachineState, SessionStatus};

use crate::api::{endpoints, ApiClient, ApiError, RequestDescriptor};
use crate::models::UserProfile;

/// Snapshot of the session handed to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub status: SessionStatus,
}

impl Session {
    fn loading() -> Self {
        Self {
            user: None,
            status: SessionStatus::Loading,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }
}

pub struct SessionManager {
    api: ApiClient,
    machine: Mutex<SessionMachine>,
    state_tx: watch::Sender<Session>,
    // Held by init, sign-in and logout so their token writes never interleave.
    auth_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(api: ApiClient) -> Self {
        let (state_tx, _) = watch::channel(Session::loading());
        Self {
            api,
            machine: Mutex::new(SessionMachine::new()),
            state_tx,
            auth_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Current snapshot, possibly still `Loading`
    pub fn session(&self) -> Session {
        self.state_tx.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state_tx.borrow().status
    }

    /// Receive every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state_tx.subscribe()
    }

    /// Wait until the session has left `Loading` and return it
    pub async fn get_session(&self) -> Session {
        let mut rx = self.state_tx.subscribe();
        let session = match rx.wait_for(|s| !s.status.is_loading()).await {
            Ok(session) => session.clone(),
            // The sender lives as long as self, so this is unreachable in practice
            Err(_) => self.session(),
        };
        session
    }

    /// Resolve the initial `Loading` state.
    ///
    /// Without a stored access token the session becomes `Unauthenticated`
    /// without touching the network. Otherwise the identity endpoint decides:
    /// a profile means `Authenticated`, any failure (including an exhausted
    /// refresh) clears the stored tokens and means `Unauthenticated`.
    /// Once resolved, further calls return the current session unchanged.
    /// A login or logout issued meanwhile waits for the resolution.
    pub async fn init(&self) -> Session {
        let _guard = self.auth_lock.lock().await;
        if !self.status().is_loading() {
            return self.session();
        }

        match self.api.credentials().has_access_token() {
            Ok(false) => {
                info!("No stored credentials, starting signed out");
                self.apply(SessionInput::NoCredentials, None);
            }
            Ok(true) => match self.fetch_identity().await {
                Ok(user) => {
                    info!(user = %user.display_name(), "Session restored");
                    self.apply(SessionInput::IdentityConfirmed, Some(user));
                }
                Err(e) => {
                    warn!(error = %e, "Stored session rejected, clearing credentials");
                    self.clear_credentials();
                    self.apply(SessionInput::IdentityRejected, None);
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read credential store, starting signed out");
                self.apply(SessionInput::IdentityRejected, None);
            }
        }

        self.session()
    }

    /// Authenticated call for collaborators. An exhausted refresh also ends
    /// this session.
    pub async fn authenticated_request(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<Response, ApiError> {
        let result = self.api.authenticated_request(descriptor).await;
        self.observe(&result);
        result
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let result = self.api.request_json(descriptor).await;
        self.observe(&result);
        result
    }

    async fn fetch_identity(&self) -> Result<UserProfile, ApiError> {
        self.api
            .request_json(RequestDescriptor::get(endpoints::ME))
            .await
    }

    fn observe<T>(&self, result: &Result<T, ApiError>) {
        if let Err(ApiError::SessionExpired) = result {
            self.apply(SessionInput::Expired, None);
        }
    }

    fn clear_credentials(&self) {
        if let Err(e) = self.api.credentials().clear_all() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
    }

    /// Feed one input to the state machine and publish the result.
    /// Impossible transitions are logged and leave the session unchanged.
    fn apply(&self, input: SessionInput, user: Option<UserProfile>) -> SessionStatus {
        let mut machine = self.machine.lock().unwrap_or_else(PoisonError::into_inner);
        let old_status = SessionStatus::from(machine.state());

        if machine.consume(&input).is_err() {
            warn!(input = ?input, state = ?old_status, "Ignoring impossible session transition");
            return old_status;
        }

        let new_status = SessionStatus::from(machine.state());
        // Publish while holding the machine lock so snapshots stay in order
        self.state_tx.send_replace(Session {
            user,
            status: new_status,
        });
        drop(machine);

        if old_status != new_status {
            debug!(old_state = ?old_status, new_state = ?new_status, "Session state transition");
        }
        new_status
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("api", &self.api)
            .field("status", &self.status())
            .finish()
    }
}
