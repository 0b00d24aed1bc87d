//! # dnsthing
//!
//! Publish Docker container addresses as hostnames in a managed hosts-file
//! section, for local service discovery without a real DNS server.
//!
//! The daemon seeds itself from the currently-running containers, then
//! follows the Docker event stream. Every start registers the container's
//! name and network addresses in an in-memory index; every die removes
//! them; after each change the managed section of the hosts file is
//! rewritten under an exclusive file lock:
//!
//! ```text
//! # === start dnsthing ===
//! 10.0.0.2 web.app.docker
//! 10.0.0.3 db.app.docker
//! # === end dnsthing ===
//! ```
//!
//! Lines outside the markers belong to the file's other owners and are
//! preserved. Point dnsmasq (or anything that can serve a hosts file) at
//! the managed file and `web.app.docker` resolves on the host.
//!
//! ## Quick start
//!
//! ```bash
//! touch ./hosts
//! dnsthing -v --hostsfile ./hosts --update-command 'pkill -HUP dnsmasq'
//! ```
//!
//! ## Library use
//!
//! ```rust,ignore
//! use dnsthing::{DockerSource, HostsFile, Reconciler};
//!
//! let source = DockerSource::connect()?;
//! let hosts = HostsFile::new("./hosts", "docker");
//! Reconciler::new(source, hosts).run().await?;
//! ```
//!
//! ## Failure model
//!
//! Losing the Docker connection (or the event stream ending) is fatal —
//! the process exits and leaves restarting to the supervisor. Per-container
//! trouble (a name collision, a container with no network, an inspect of a
//! container that already exited) is logged and skipped; one odd container
//! never stops the watch loop.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod docker;
pub mod error;
pub mod hosts;
pub mod reconcile;
pub mod record;
pub mod registry;

pub use docker::{DockerSource, EventStream, RuntimeEvent, RuntimeSource};
pub use error::{DnsthingError, Result};
pub use hosts::{HostsFile, SECTION_END, SECTION_START};
pub use reconcile::{Reconciler, UpdateHook};
pub use record::ContainerRecord;
pub use registry::{HostEntry, HostRegistry, RegisterOutcome};
