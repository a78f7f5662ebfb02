//! hw-transport: SSH implementation of the hostwatch transport seam
//!
//! Opens password-authenticated SSH sessions to watched hosts and verifies
//! liveness by executing a trivial command. Everything above this crate
//! talks to the `Transport`/`TransportSession` traits from `hw-core`.

mod ssh;

pub use ssh::{SshTransport, PROBE_COMMAND};
