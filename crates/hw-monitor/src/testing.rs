//! Scriptable in-memory transport for supervisor and registry tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use hw_core::transport::{SessionEvent, Transport, TransportSession};
use hw_core::types::{Credentials, HostAddr};
use hw_core::TransportError;

/// Scripted result of one connect attempt
pub(crate) enum ConnectOutcome {
    /// Connect succeeds; probes pass until scripted otherwise
    Success,
    /// Connect fails immediately
    Failure,
    /// Connect never completes (until the attempt is cancelled)
    Hang,
}

/// Record of one connect attempt
#[derive(Debug, Clone)]
pub(crate) struct Attempt {
    pub at: Instant,
    #[allow(dead_code)]
    pub login: String,
    pub secret: String,
}

/// Remote control for an opened mock session
#[derive(Clone)]
pub(crate) struct SessionControl {
    /// Inject passive events as the remote side would
    pub events: mpsc::Sender<SessionEvent>,
    probe_failures: Arc<AtomicU32>,
    closed: Arc<AtomicBool>,
}

impl SessionControl {
    /// Make the next probe on this session fail
    pub fn fail_next_probe(&self) {
        self.probe_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether the supervisor has closed this session
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Transport whose connect attempts follow a script.
///
/// Once the script is exhausted every further attempt fails, which models
/// an unreachable host without needing an endless script.
pub(crate) struct MockTransport {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    attempts: Mutex<Vec<Attempt>>,
    sessions: Mutex<Vec<SessionControl>>,
}

impl MockTransport {
    pub fn new(outcomes: impl IntoIterator<Item = ConnectOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            attempts: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// All connect attempts seen so far
    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Timestamps of all connect attempts seen so far
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().iter().map(|a| a.at).collect()
    }

    /// Control handle for the n-th successfully opened session
    pub fn session(&self, index: usize) -> SessionControl {
        self.sessions.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Session = MockSession;

    async fn open(
        &self,
        _host: &HostAddr,
        credentials: &Credentials,
        _timeout: Duration,
    ) -> Result<(MockSession, mpsc::Receiver<SessionEvent>), TransportError> {
        self.attempts.lock().unwrap().push(Attempt {
            at: Instant::now(),
            login: credentials.login.clone(),
            secret: credentials.secret.clone(),
        });

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Failure);

        match outcome {
            ConnectOutcome::Failure => Err(TransportError::ConnectFailed(
                "scripted failure".to_string(),
            )),
            ConnectOutcome::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            ConnectOutcome::Success => {
                let (event_tx, event_rx) = mpsc::channel(16);
                let probe_failures = Arc::new(AtomicU32::new(0));
                let closed = Arc::new(AtomicBool::new(false));

                self.sessions.lock().unwrap().push(SessionControl {
                    events: event_tx,
                    probe_failures: Arc::clone(&probe_failures),
                    closed: Arc::clone(&closed),
                });

                Ok((
                    MockSession {
                        probe_failures,
                        closed,
                    },
                    event_rx,
                ))
            }
        }
    }
}

pub(crate) struct MockSession {
    probe_failures: Arc<AtomicU32>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl TransportSession for MockSession {
    async fn probe(&mut self) -> Result<(), TransportError> {
        let remaining = self.probe_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.probe_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::ProbeFailed(
                "scripted probe failure".to_string(),
            ));
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
