//! Prospect state machine.
//!
//! The lifecycle is linear: CREATED → PENDING → REACHED_OUT. Field edits are
//! only accepted while a prospect is still CREATED.

use chrono::{DateTime, Utc};

use super::domain::{Prospect, ProspectState};

impl ProspectState {
    pub fn is_editable(self) -> bool {
        self == ProspectState::Created
    }
}

/// The only edges of the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    MarkReachedOut,
}

impl Transition {
    pub const fn source(self) -> ProspectState {
        match self {
            Transition::Submit => ProspectState::Created,
            Transition::MarkReachedOut => ProspectState::Pending,
        }
    }

    pub const fn target(self) -> ProspectState {
        match self {
            Transition::Submit => ProspectState::Pending,
            Transition::MarkReachedOut => ProspectState::ReachedOut,
        }
    }

    pub const fn operation(self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::MarkReachedOut => "mark reached out",
        }
    }
}

/// Raised when an operation is attempted outside its required source state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {operation} a prospect in state {current}")]
    InvalidState {
        operation: &'static str,
        current: ProspectState,
    },
}

impl Prospect {
    /// Advances along `transition`, bumping `updated_at` on success.
    pub fn apply(
        &mut self,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        if self.state != transition.source() {
            return Err(LifecycleError::InvalidState {
                operation: transition.operation(),
                current: self.state,
            });
        }

        self.state = transition.target();
        self.updated_at = now;
        Ok(())
    }

    pub fn ensure_editable(&self, operation: &'static str) -> Result<(), LifecycleError> {
        if self.state.is_editable() {
            Ok(())
        } else {
            Err(LifecycleError::InvalidState {
                operation,
                current: self.state,
            })
        }
    }
}
