//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │     Loading     │ (initial)
//!                    └────────┬────────┘
//!     IdentityConfirmed       │       NoCredentials / IdentityRejected
//!     SignedIn                │       SignedOut / Expired
//!          ┌──────────────────┴──────────────────┐
//!          ▼                                     ▼
//! ┌─────────────────┐   SignedOut / Expired   ┌─────────────────┐
//! │  Authenticated  │ ──────────────────────► │ Unauthenticated │
//! │                 │ ◄────────────────────── │                 │
//! └─────────────────┘        SignedIn         └─────────────────┘
//! ```
//!
//! Nothing leads back to `Loading`; a new process starts a new machine.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Loading)

    Loading => {
        NoCredentials => Unauthenticated,
        IdentityConfirmed => Authenticated,
        IdentityRejected => Unauthenticated,
        SignedIn => Authenticated,
        SignedOut => Unauthenticated,
        Expired => Unauthenticated
    },
    Authenticated => {
        SignedIn => Authenticated,
        SignedOut => Unauthenticated,
        Expired => Unauthenticated
    },
    Unauthenticated => {
        SignedIn => Authenticated,
        SignedOut => Unauthenticated,
        Expired => Unauthenticated
    }
}

pub use session_machine::Input as SessionInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session status as seen by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Loading)
    }
}

impl From<&SessionMachineState> for SessionStatus {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Loading => SessionStatus::Loading,
            SessionMachineState::Authenticated => SessionStatus::Authenticated,
            SessionMachineState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }
}
