//! Caller-side handle to a registered controller.

use super::{ContainerError, ContainerResult};
use crate::container::domain::{ControllerId, ControllerStatus, ServiceName, ServiceState};
use std::fmt;
use tokio::sync::watch;

/// Handle returned by registration and lookups.
///
/// The handle observes the controller's published status. Waiting methods
/// see the latest status, so a waiter may miss a state that was only held
/// briefly.
#[derive(Clone)]
pub struct ControllerHandle {
    id: ControllerId,
    name: ServiceName,
    status: watch::Receiver<ControllerStatus>,
}

impl ControllerHandle {
    pub(super) const fn new(
        id: ControllerId,
        name: ServiceName,
        status: watch::Receiver<ControllerStatus>,
    ) -> Self {
        Self { id, name, status }
    }

    /// Returns the controller identifier.
    #[must_use]
    pub const fn id(&self) -> ControllerId {
        self.id
    }

    /// Returns the primary service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the latest published status.
    #[must_use]
    pub fn status(&self) -> ControllerStatus {
        self.status.borrow().clone()
    }

    /// Returns the latest published state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.status.borrow().state
    }

    /// Waits until `predicate` holds for the published status.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Removed`] when the controller is dropped
    /// before the predicate holds.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ControllerStatus) -> bool,
    ) -> ContainerResult<ControllerStatus> {
        let mut receiver = self.status.clone();
        let status = receiver
            .wait_for(|status| predicate(status))
            .await
            .map_err(|_| ContainerError::Removed(self.name.clone()))?;
        Ok(status.clone())
    }

    /// Waits until the controller is up.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::StartFailed`] when a start failure is
    /// recorded first, or [`ContainerError::Removed`] when the controller is
    /// removed first.
    pub async fn await_up(&self) -> ContainerResult<()> {
        let status = self
            .wait_for(|status| {
                matches!(status.state, ServiceState::Up | ServiceState::Removed)
                    || (status.state == ServiceState::Down && status.failure.is_some())
            })
            .await?;

        match (status.state, status.failure) {
            (ServiceState::Up, _) => Ok(()),
            (ServiceState::Removed, _) => Err(ContainerError::Removed(self.name.clone())),
            (_, failure) => Err(ContainerError::StartFailed {
                service: self.name.clone(),
                message: failure.map(|failure| failure.message).unwrap_or_default(),
            }),
        }
    }

    /// Waits until the controller reaches `state`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Removed`] when the controller is removed
    /// before reaching a state other than [`ServiceState::Removed`].
    pub async fn await_state(&self, state: ServiceState) -> ContainerResult<()> {
        let reached = self
            .wait_for(|status| status.state == state || status.state == ServiceState::Removed)
            .await?;
        if reached.state == state {
            return Ok(());
        }
        Err(ContainerError::Removed(self.name.clone()))
    }

    /// Waits until the controller has been removed.
    pub async fn await_removed(&self) {
        let mut receiver = self.status.clone();
        // A closed channel means the entry is already gone.
        let _closed = receiver
            .wait_for(|status| status.state == ServiceState::Removed)
            .await
            .is_err();
    }
}

impl fmt::Debug for ControllerHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ControllerHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
