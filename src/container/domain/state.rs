//! Controller states, status snapshots, and lifecycle events.

use super::{ControllerId, ServiceMode, ServiceName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime state of a service controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Not running. The initial state and the state after stop or failed start.
    Down,
    /// The start hook is running.
    Starting,
    /// Started successfully.
    Up,
    /// The stop hook is running.
    Stopping,
    /// Removed from the registry. Terminal.
    Removed,
}

impl ServiceState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Starting => "starting",
            Self::Up => "up",
            Self::Stopping => "stopping",
            Self::Removed => "removed",
        }
    }

    /// Returns whether a lifecycle hook is in flight.
    #[must_use]
    pub const fn is_transitioning(self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }

    /// Returns whether the registry may move from this state to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Down, Self::Starting | Self::Removed)
                | (Self::Starting, Self::Up | Self::Down)
                | (Self::Up, Self::Stopping)
                | (Self::Stopping, Self::Down)
        )
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Why the last start attempt of a controller failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartFailure {
    /// Human-readable failure message.
    pub message: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

/// Point-in-time view of a controller published to waiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Current state.
    pub state: ServiceState,
    /// Current mode.
    pub mode: ServiceMode,
    /// Failure from the last start attempt, cleared on retry.
    pub failure: Option<StartFailure>,
    /// Required dependency names that currently resolve to nothing.
    pub unknown_targets: Vec<ServiceName>,
}

impl ControllerStatus {
    pub(crate) const fn new(mode: ServiceMode) -> Self {
        Self {
            state: ServiceState::Down,
            mode,
            failure: None,
            unknown_targets: Vec::new(),
        }
    }
}

/// What happened to a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum LifecycleEventKind {
    /// The start hook was invoked.
    Starting,
    /// The start hook succeeded.
    Up,
    /// The start hook or injection failed.
    StartFailed(String),
    /// The stop hook was invoked.
    Stopping,
    /// The stop hook finished and injectors were cleared.
    Down,
    /// The controller and its names were released.
    Removed,
}

/// Observability record emitted on every lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Controller that transitioned.
    pub controller: ControllerId,
    /// Primary name of the controller.
    pub service: ServiceName,
    /// Transition that occurred.
    pub kind: LifecycleEventKind,
    /// When the transition was recorded.
    pub at: DateTime<Utc>,
}
