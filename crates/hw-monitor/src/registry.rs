//! Per-subscriber registry
//!
//! Owns the set of supervisors belonging to one subscriber and reconciles
//! the desired host set against it as configuration messages arrive. The
//! registry lives inside the subscriber's connection task, so all of its
//! mutations are serialized; supervisors reach it only through the status
//! channel the owner selects on.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;

use hw_core::config::WatchSettings;
use hw_core::transport::Transport;
use hw_core::types::{Credentials, HostAddr, HostStatus, StatusSnapshot, SubscriberId};

use crate::supervisor::{StatusUpdate, SupervisorHandle};

/// A subscriber's desired configuration: which hosts to watch and with
/// which credentials
#[derive(Debug, Clone)]
pub struct DesiredConfig {
    /// Hosts that should be watched
    pub hosts: Vec<HostAddr>,
    /// Credentials shared by all of the subscriber's hosts
    pub credentials: Credentials,
}

/// Supervisors and derived status for one subscriber.
///
/// Invariant: the supervisor map and the status map always hold exactly the
/// currently-configured host set.
pub struct SubscriberRegistry<T: Transport> {
    /// Owning subscriber, for diagnostics
    subscriber: SubscriberId,
    /// Transport handed to spawned supervisors
    transport: Arc<T>,
    /// Watch settings handed to spawned supervisors
    settings: WatchSettings,
    /// Status sender cloned into every supervisor
    status_tx: mpsc::Sender<StatusUpdate>,
    /// One supervisor per configured host
    supervisors: HashMap<HostAddr, SupervisorHandle>,
    /// Last-known status per configured host
    status: StatusSnapshot,
}

impl<T: Transport> SubscriberRegistry<T> {
    /// Create an empty registry for a freshly connected subscriber
    pub fn new(
        subscriber: SubscriberId,
        transport: Arc<T>,
        settings: WatchSettings,
        status_tx: mpsc::Sender<StatusUpdate>,
    ) -> Self {
        Self {
            subscriber,
            transport,
            settings,
            status_tx,
            supervisors: HashMap::new(),
            status: StatusSnapshot::new(),
        }
    }

    /// Reconcile the desired configuration against the running supervisors:
    /// spawn supervisors for added hosts, terminate removed ones, and
    /// forward the (possibly unchanged) credentials to the rest.
    pub async fn apply_configuration(&mut self, desired: DesiredConfig) {
        let desired_set: HashSet<HostAddr> = desired.hosts.into_iter().collect();

        let to_add: Vec<HostAddr> = desired_set
            .iter()
            .filter(|host| !self.supervisors.contains_key(*host))
            .cloned()
            .collect();
        let to_remove: Vec<HostAddr> = self
            .supervisors
            .keys()
            .filter(|host| !desired_set.contains(*host))
            .cloned()
            .collect();

        for host in to_add {
            self.add_host(host, desired.credentials.clone());
        }
        for host in to_remove {
            self.remove_host(&host).await;
        }

        // Covers just-added hosts too; the update is idempotent there.
        for handle in self.supervisors.values() {
            handle.update_credentials(desired.credentials.clone()).await;
        }

        tracing::info!(
            subscriber = %self.subscriber,
            hosts = self.supervisors.len(),
            "configuration applied"
        );
    }

    /// Record a status transition reported by a supervisor.
    ///
    /// Returns `true` when the snapshot changed and should be pushed. Late
    /// callbacks for hosts that have been removed are dropped, as are
    /// repeats of the current status (supervisors re-announce `offline` on
    /// every connect attempt).
    pub fn record_status(&mut self, update: StatusUpdate) -> bool {
        if !self.supervisors.contains_key(&update.host) {
            tracing::debug!(
                subscriber = %self.subscriber,
                host = %update.host,
                "dropping status update for unconfigured host"
            );
            return false;
        }

        let previous = self.status.insert(update.host, update.status);
        previous != Some(update.status)
    }

    /// Point-in-time copy of the host→status mapping
    pub fn snapshot(&self) -> StatusSnapshot {
        self.status.clone()
    }

    /// Number of configured hosts
    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    /// Whether any hosts are configured
    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    /// Terminate every supervisor and clear both maps. Used on subscriber
    /// disconnect.
    pub async fn teardown(&mut self) {
        for (_, handle) in self.supervisors.drain() {
            handle.terminate().await;
        }
        self.status.clear();
        tracing::info!(subscriber = %self.subscriber, "registry torn down");
    }

    fn add_host(&mut self, host: HostAddr, credentials: Credentials) {
        if self.supervisors.contains_key(&host) {
            tracing::debug!(subscriber = %self.subscriber, host = %host, "host already watched");
            return;
        }

        let handle = SupervisorHandle::spawn(
            host.clone(),
            credentials,
            Arc::clone(&self.transport),
            self.settings.clone(),
            self.status_tx.clone(),
        );
        self.supervisors.insert(host.clone(), handle);
        // Known-offline until the supervisor reports otherwise; keeps the
        // two maps' key sets equal from the moment the host is configured.
        self.status.insert(host.clone(), HostStatus::Offline);

        tracing::info!(subscriber = %self.subscriber, host = %host, "host added");
    }

    async fn remove_host(&mut self, host: &HostAddr) {
        let Some(handle) = self.supervisors.remove(host) else {
            tracing::debug!(subscriber = %self.subscriber, host = %host, "host not watched");
            return;
        };

        handle.terminate().await;
        self.status.remove(host);

        tracing::info!(subscriber = %self.subscriber, host = %host, "host removed");
    }
}
