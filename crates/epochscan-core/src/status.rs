//! Run lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// State of a run.
///
/// `Idle -> Running -> {Completed, Aborted}`. Transitions are one-way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// No workers started.
    #[default]
    Idle,
    /// Workers active, reducer draining.
    Running,
    /// Every task was applied.
    Completed,
    /// Cancelled or stopped by a fatal error.
    Aborted,
}

impl RunState {
    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true if `to` is a legal next state.
    pub fn can_transition_to(&self, to: RunState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
                // rejected configs never reach Running
                | (Self::Idle, Self::Aborted)
        )
    }

    /// Move to `to`, or fail if the transition is not allowed.
    pub fn transition(&mut self, to: RunState) -> Result<(), CoreError> {
        if !self.can_transition_to(to) {
            return Err(CoreError::InvalidStateTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
