//! hw-monitor: Connection supervision for hostwatch
//!
//! One `HostSupervisor` task owns the lifecycle of one SSH session for one
//! (subscriber, host) pair: connect, verify liveness, detect failure, and
//! reconnect with bounded backoff. A `SubscriberRegistry` reconciles a
//! subscriber's desired host set against the running supervisors and
//! derives the status snapshot pushed upstream.

pub mod backoff;
pub mod registry;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::BackoffSchedule;
pub use registry::{DesiredConfig, SubscriberRegistry};
pub use supervisor::{StatusUpdate, SupervisorHandle};
