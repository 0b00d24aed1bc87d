//! Docker runtime event source.
//!
//! Everything runtime-specific lives behind [`RuntimeSource`], so the
//! reconciler can be driven by a scripted fake in tests. The production
//! implementation talks to the local Docker daemon through bollard.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerInspectResponse, EventMessage, EventMessageTypeEnum};
use bollard::system::EventsOptions;
use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::record::ContainerRecord;

/// Ordered stream of lifecycle events from the runtime.
///
/// An `Err` item means the connection to the runtime failed; the stream is
/// not resumable after that.
pub type EventStream =
    Pin<Box<dyn Stream<Item = std::result::Result<RuntimeEvent, bollard::errors::Error>> + Send>>;

/// Lifecycle transition relevant to host registration.
///
/// Every runtime event collapses into one of these three; the set of
/// handled transitions is exhaustive at the type level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A container started.
    Started(String),
    /// A container stopped or was killed.
    Died(String),
    /// Anything else (image/network/volume events, unknown actions,
    /// events without an actor id). Ignored.
    Other,
}

/// Source of container state and lifecycle events.
#[async_trait]
pub trait RuntimeSource {
    /// Enumerates currently-running containers as registration candidates.
    async fn list_running(&self) -> Result<Vec<ContainerRecord>>;

    /// Fetches the descriptor for one container.
    ///
    /// Returns `Ok(None)` when the runtime reports the container gone,
    /// which is routine for short-lived containers that exit between the
    /// event and the inspect call.
    async fn inspect(&self, id: &str) -> Result<Option<ContainerRecord>>;

    /// Subscribes to the live event stream.
    fn subscribe(&self) -> EventStream;
}

/// [`RuntimeSource`] backed by the local Docker daemon.
pub struct DockerSource {
    docker: Docker,
}

impl DockerSource {
    /// Connects using the environment's defaults (unix socket, or
    /// `DOCKER_HOST` when set).
    ///
    /// The connection is lazy; use [`ping`](Self::ping) to verify the
    /// daemon is actually reachable.
    ///
    /// # Errors
    ///
    /// Returns [`DnsthingError::Docker`](crate::DnsthingError::Docker) if
    /// the connection cannot be configured.
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    /// Verifies the daemon is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`DnsthingError::Docker`](crate::DnsthingError::Docker) if
    /// the daemon does not answer.
    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }
}

#[async_trait]
impl RuntimeSource for DockerSource {
    async fn list_running(&self) -> Result<Vec<ContainerRecord>> {
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String>::default()))
            .await?;

        let mut records = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else { continue };
            // A listed container can vanish before we inspect it.
            if let Some(record) = self.inspect(&id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn inspect(&self, id: &str) -> Result<Option<ContainerRecord>> {
        match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(record_from_inspect(response)),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> EventStream {
        let events = self
            .docker
            .events(Some(EventsOptions::<String>::default()));
        Box::pin(events.map(|item| item.map(classify_event)))
    }
}

/// Maps a raw Docker event onto [`RuntimeEvent`].
///
/// Only `{Type: container, Action: start|die}` events carry a transition;
/// the rest collapse into [`RuntimeEvent::Other`].
fn classify_event(message: EventMessage) -> RuntimeEvent {
    if message.typ != Some(EventMessageTypeEnum::CONTAINER) {
        tracing::debug!(
            kind = ?message.typ,
            action = ?message.action,
            "ignoring non-container event"
        );
        return RuntimeEvent::Other;
    }

    let id = message.actor.and_then(|actor| actor.id);
    match (message.action.as_deref(), id) {
        (Some("start"), Some(id)) => RuntimeEvent::Started(id),
        (Some("die"), Some(id)) => RuntimeEvent::Died(id),
        (action, _) => {
            tracing::debug!(action = ?action, "ignoring container event");
            RuntimeEvent::Other
        }
    }
}

/// Builds a registration candidate from an inspect response.
///
/// Containers without an id or name cannot be indexed and yield `None`.
/// Network attachments come from the primary `IPAddress` field; an
/// attachment without one is treated as unaddressed.
fn record_from_inspect(response: ContainerInspectResponse) -> Option<ContainerRecord> {
    let id = response.id?;
    let name = response.name?;

    let networks = response
        .network_settings
        .and_then(|settings| settings.networks)
        .unwrap_or_default();
    let addresses: HashMap<String, String> = networks
        .into_iter()
        .map(|(network, endpoint)| (network, endpoint.ip_address.unwrap_or_default()))
        .collect();

    Some(ContainerRecord::new(id, name, addresses))
}
