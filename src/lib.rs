//! Deadline-bounded, fail-open credential policy gate.
//!
//! A host identity subsystem calls this crate synchronously on every
//! credential set or change. The gate asks an out-of-process decision service
//! over a local channel and returns allow or deny, under these guarantees:
//! - **Bounded**: one attempt, one deadline shared by every phase of the exchange
//! - **Fail-open**: only an explicit, well-formed `"allow": false` denies
//! - **No leaks**: secrets are redacted in formatting, never logged, and wiped on drop
//!
//! # Core Types
//!
//! - [`CredentialEvent`]: the candidate secret, principal and operation kind
//! - [`encode`]: one-line JSON request encoding
//! - [`exchange`]: the deadline-bounded round trip over a [`Channel`]
//! - [`interpret`]: reads the `allow` field of a response into a [`Verdict`]
//! - [`PolicyGate`]: ties the above together and returns a [`Decision`]
//! - [`host::HostAdapter`]: the three host entry points in safe Rust
//!
//! # Examples
//!
//! ```no_run
//! use credential_gate::{CredentialEvent, GateConfig, Operation, PolicyGate};
//!
//! let config = GateConfig::load_or_default("/etc/credential-gate/config.json");
//! let gate = PolicyGate::from_config(&config);
//!
//! let event = CredentialEvent::new("P@ss\"1", Operation::Change).with_principal("alice");
//! let decision = gate.evaluate(event);
//! println!("allowed: {}", decision.is_allowed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod config;
mod deadline;
mod encoder;
mod error;
mod event;
mod gate;
pub mod host;
mod interpreter;
mod logging;
mod secret;
mod transport;

#[cfg(test)]
mod testing;

#[cfg(unix)]
pub use channel::LocalSocket;
pub use channel::{Channel, ChannelStream};
pub use config::{GateConfig, DEFAULT_CHANNEL_PATH, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};
pub use deadline::Deadline;
pub use encoder::{encode, EncodedMessage, LINE_TERMINATOR};
pub use error::{ConfigError, EncodeError, Error};
pub use event::{CredentialEvent, Operation};
pub use gate::{Decision, Evaluation, PolicyGate};
pub use interpreter::{interpret, Verdict};
pub use secret::Secret;
pub use transport::{exchange, ExchangeOutcome, MAX_RESPONSE_BYTES};
