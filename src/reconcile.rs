//! Event-driven reconciliation between the runtime and the hosts file.
//!
//! One sequential loop: each event mutates the registry, then the file is
//! rewritten from a fresh snapshot. Because only one event is ever in
//! flight, a start and an immediately following die for the same id cannot
//! race.

use futures::StreamExt;

use crate::docker::{RuntimeEvent, RuntimeSource};
use crate::error::{DnsthingError, Result};
use crate::hosts::HostsFile;
use crate::registry::HostRegistry;

/// Action invoked after each successful file render, e.g. a dnsmasq
/// reload. Fire-and-forget; the reconciler never looks at the outcome.
pub type UpdateHook = Box<dyn FnMut() + Send>;

/// Drives the registry and the hosts file from runtime lifecycle events.
pub struct Reconciler<S> {
    source: S,
    registry: HostRegistry,
    hosts: HostsFile,
    on_update: Option<UpdateHook>,
}

impl<S: RuntimeSource> Reconciler<S> {
    /// Creates a reconciler over `source`, persisting into `hosts`.
    #[must_use]
    pub fn new(source: S, hosts: HostsFile) -> Self {
        Self {
            source,
            registry: HostRegistry::new(),
            hosts,
            on_update: None,
        }
    }

    /// Attaches a post-update hook, invoked synchronously after each
    /// successful render.
    #[must_use]
    pub fn with_update_hook(mut self, hook: UpdateHook) -> Self {
        self.on_update = Some(hook);
        self
    }

    /// Current index state.
    #[must_use]
    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Seeds the registry from running containers, renders once, then
    /// consumes the event stream until it fails.
    ///
    /// This never returns `Ok`: the stream is expected to outlive the
    /// process, so losing it is an error.
    ///
    /// # Errors
    ///
    /// Returns [`DnsthingError::Docker`] when the runtime connection fails,
    /// [`DnsthingError::EventStreamClosed`] when the stream ends, and
    /// rendering errors when the hosts file cannot be rewritten. There is
    /// no retry; the caller decides whether to restart.
    pub async fn run(&mut self) -> Result<()> {
        self.scan().await?;
        self.persist()?;

        let mut events = self.source.subscribe();
        while let Some(event) = events.next().await {
            self.handle(event?).await?;
        }
        Err(DnsthingError::EventStreamClosed)
    }

    /// Registers every currently-running container, so the file reflects
    /// reality even when this process starts late.
    async fn scan(&mut self) -> Result<()> {
        let running = self.source.list_running().await?;
        tracing::info!(count = running.len(), "scanned running containers");
        for record in running {
            self.registry.register(record);
        }
        Ok(())
    }

    async fn handle(&mut self, event: RuntimeEvent) -> Result<()> {
        match event {
            RuntimeEvent::Started(id) => {
                tracing::info!(id = %id, "handling start event");
                match self.source.inspect(&id).await? {
                    Some(record) => {
                        self.registry.register(record);
                    }
                    None => tracing::debug!(id = %id, "container gone before inspect"),
                }
                // Rendered even when registration was rejected; the rewrite
                // doubles as a re-sync of the managed section.
                self.persist()
            }
            RuntimeEvent::Died(id) => {
                tracing::info!(id = %id, "handling die event");
                self.registry.unregister(&id);
                self.persist()
            }
            RuntimeEvent::Other => {
                tracing::debug!("ignoring unrelated event");
                Ok(())
            }
        }
    }

    /// Renders the current snapshot, then fires the update hook.
    ///
    /// Render failures suppress the hook and propagate: a state change
    /// that did not reach the file must not be silent.
    fn persist(&mut self) -> Result<()> {
        self.hosts.render(&self.registry.snapshot())?;
        if let Some(hook) = self.on_update.as_mut() {
            hook();
        }
        Ok(())
    }
}
