//! Per-host session supervisor
//!
//! Each watched (subscriber, host) pair is owned by exactly one supervisor
//! task driving the connect → verify-alive → detect-failure → backoff
//! cycle. All supervisor state is task-local; the outside world interacts
//! through a `SupervisorHandle` (commands + cancellation) and receives
//! status transitions over an mpsc channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use hw_core::config::WatchSettings;
use hw_core::transport::{SessionEvent, Transport, TransportSession};
use hw_core::types::{Credentials, HostAddr, HostStatus};

use crate::backoff::BackoffSchedule;

/// Capacity for the per-supervisor command channel
const COMMAND_CHANNEL_CAPACITY: usize = 8;

/// How long to wait for a cancelled supervisor task before aborting it
const TERMINATE_GRACE: Duration = Duration::from_secs(1);

/// A status transition reported by a supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Host the transition belongs to
    pub host: HostAddr,
    /// New status
    pub status: HostStatus,
}

/// Commands accepted by a running supervisor
enum SupervisorCommand {
    /// Replace the credentials used for future connect attempts; if the
    /// session is live and the credentials differ, it is force-closed
    UpdateCredentials(Credentials),
}

/// How the online phase ended
enum OnlineExit {
    /// The session failed; reconnect with backoff
    Failure(String),
    /// The supervisor was terminated
    Terminated,
}

/// Handle to a running supervisor task.
///
/// Dropping the handle does not stop the task; use [`terminate`] so that
/// teardown is exhaustive (session closed, task joined).
///
/// [`terminate`]: SupervisorHandle::terminate
pub struct SupervisorHandle {
    /// Host this supervisor watches
    host: HostAddr,
    /// Command sender into the task
    command_tx: mpsc::Sender<SupervisorCommand>,
    /// Token cancelling the task
    cancel: CancellationToken,
    /// The supervisor task itself
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Spawn a supervisor for `host`.
    ///
    /// The supervisor starts offline and immediately drives itself into its
    /// first connect attempt.
    pub fn spawn<T: Transport>(
        host: HostAddr,
        credentials: Credentials,
        transport: Arc<T>,
        settings: WatchSettings,
        status_tx: mpsc::Sender<StatusUpdate>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let supervisor = HostSupervisor {
            host: host.clone(),
            credentials,
            transport,
            backoff: BackoffSchedule::from_config(&settings.backoff),
            settings,
            status_tx,
            command_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(supervisor.run());

        Self {
            host,
            command_tx,
            cancel,
            task,
        }
    }

    /// Host this supervisor watches
    pub fn host(&self) -> &HostAddr {
        &self.host
    }

    /// Forward new credentials to the supervisor. Idempotent if unchanged.
    pub async fn update_credentials(&self, credentials: Credentials) {
        if self
            .command_tx
            .send(SupervisorCommand::UpdateCredentials(credentials))
            .await
            .is_err()
        {
            tracing::debug!(host = %self.host, "supervisor already stopped, credential update dropped");
        }
    }

    /// Terminate the supervisor: cancel the task, wait briefly for it to
    /// close its session and exit, abort if it does not.
    pub async fn terminate(mut self) {
        self.cancel.cancel();
        if tokio::time::timeout(TERMINATE_GRACE, &mut self.task)
            .await
            .is_err()
        {
            tracing::warn!(host = %self.host, "supervisor did not stop in time, aborting");
            self.task.abort();
        }
    }
}

/// The supervisor state machine. Owns its session, backoff schedule, and
/// credentials exclusively; runs until cancelled.
struct HostSupervisor<T: Transport> {
    host: HostAddr,
    credentials: Credentials,
    transport: Arc<T>,
    backoff: BackoffSchedule,
    settings: WatchSettings,
    status_tx: mpsc::Sender<StatusUpdate>,
    command_rx: mpsc::Receiver<SupervisorCommand>,
    cancel: CancellationToken,
}

impl<T: Transport> HostSupervisor<T> {
    async fn run(mut self) {
        loop {
            // Connecting: announce the (re-)attempt, then open a session.
            // The offline emission is idempotent across repeated attempts.
            self.emit(HostStatus::Offline).await;

            let opened = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.transport.open(
                    &self.host,
                    &self.credentials,
                    self.settings.connect_timeout,
                ) => result,
            };

            match opened {
                Ok((session, events)) => match self.online_phase(session, events).await {
                    OnlineExit::Failure(reason) => {
                        tracing::warn!(host = %self.host, reason = %reason, "disconnected");
                        self.emit(HostStatus::Offline).await;
                    }
                    OnlineExit::Terminated => return,
                },
                Err(err) => {
                    tracing::debug!(host = %self.host, error = %err, "connect attempt failed");
                }
            }

            if !self.backoff_phase().await {
                return;
            }
        }
    }

    /// Drive a live session until it fails or the supervisor is terminated.
    ///
    /// Leaving this phase drops the session's event receiver, so when a
    /// single failure fires both an error and a close only the first signal
    /// is ever observed and exactly one reconnect gets scheduled.
    async fn online_phase(
        &mut self,
        mut session: T::Session,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> OnlineExit {
        self.backoff.reset();
        self.emit(HostStatus::Online).await;
        tracing::info!(host = %self.host, "connected");

        let mut probe = tokio::time::interval(self.settings.probe_interval);
        // The first interval tick completes immediately; consume it so the
        // first probe runs one full interval after connect.
        probe.tick().await;

        let exit = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break OnlineExit::Terminated,
                _ = probe.tick() => {
                    match tokio::time::timeout(self.settings.connect_timeout, session.probe()).await {
                        Ok(Ok(())) => tracing::trace!(host = %self.host, "liveness probe ok"),
                        Ok(Err(err)) => break OnlineExit::Failure(err.to_string()),
                        Err(_) => break OnlineExit::Failure("liveness probe timed out".to_string()),
                    }
                }
                event = events.recv() => {
                    break match event {
                        Some(SessionEvent::Error(message)) => OnlineExit::Failure(message),
                        Some(SessionEvent::Closed) | None => {
                            OnlineExit::Failure("connection closed".to_string())
                        }
                    };
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(SupervisorCommand::UpdateCredentials(new)) => {
                            if new != self.credentials {
                                tracing::info!(host = %self.host, "credentials changed, forcing reconnect");
                                self.credentials = new;
                                break OnlineExit::Failure("credentials rotated".to_string());
                            }
                        }
                        None => break OnlineExit::Terminated,
                    }
                }
            }
        };

        session.close().await;
        exit
    }

    /// Wait out the reconnect delay. Returns `false` when terminated.
    async fn backoff_phase(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        tracing::info!(host = %self.host, delay_secs = delay.as_secs(), "reconnect scheduled");

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                command = self.command_rx.recv() => {
                    match command {
                        Some(SupervisorCommand::UpdateCredentials(new)) => {
                            if new != self.credentials {
                                tracing::info!(host = %self.host, "credentials updated");
                                self.credentials = new;
                            }
                        }
                        None => return false,
                    }
                }
            }
        }
    }

    /// Report a status transition. Send errors are ignored: the receiver
    /// disappearing means the subscriber is being torn down.
    async fn emit(&self, status: HostStatus) {
        let _ = self
            .status_tx
            .send(StatusUpdate {
                host: self.host.clone(),
                status,
            })
            .await;
    }
}
