//! Host subsystem entry points.
//!
//! The identity subsystem calls three fixed entry points: an initialization
//! check, the pre-change filter, and a post-change notification. The exported
//! symbols themselves are a thin platform shim that converts the host's
//! counted UTF-16 strings into slices and forwards here; everything behind
//! that shim is safe Rust.
//!
//! Nothing in this module may fail or unwind into the host. The filter
//! catches panics from the gate and resolves them to allow, and the
//! notification reports success unconditionally.

use std::panic::{self, AssertUnwindSafe};

use crate::channel::Channel;
use crate::event::{CredentialEvent, Operation};
use crate::gate::PolicyGate;

/// NTSTATUS-style success code returned from the post-change notification.
pub const STATUS_SUCCESS: i32 = 0;

/// Decodes a host-owned UTF-16 string, replacing invalid sequences.
pub fn decode_host_string(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Adapter between the host's calling convention and a [`PolicyGate`].
///
/// # Examples
///
/// ```no_run
/// use credential_gate::host::HostAdapter;
/// use credential_gate::{GateConfig, PolicyGate};
///
/// let config = GateConfig::load_or_default("/etc/credential-gate/config.json");
/// let adapter = HostAdapter::new(PolicyGate::from_config(&config));
///
/// let account: Vec<u16> = "alice".encode_utf16().collect();
/// let password: Vec<u16> = "P@ss\"1".encode_utf16().collect();
/// let allowed = adapter.password_filter(&account, &[], &password, false);
/// ```
#[derive(Debug)]
pub struct HostAdapter<C> {
    gate: PolicyGate<C>,
}

impl<C: Channel> HostAdapter<C> {
    /// Wraps a gate for use behind the host entry points.
    pub fn new(gate: PolicyGate<C>) -> Self {
        Self { gate }
    }

    /// Returns the wrapped gate.
    pub fn gate(&self) -> &PolicyGate<C> {
        &self.gate
    }

    /// Initialization check; always reports ready.
    pub fn initialize_change_notify(&self) -> bool {
        tracing::info!(
            channel = %self.gate.channel().describe(),
            timeout_ms = u64::try_from(self.gate.timeout().as_millis()).unwrap_or(u64::MAX),
            "credential gate initialized"
        );
        true
    }

    /// Pre-change filter: returns false only when the decision service denies.
    ///
    /// `full_name` is accepted for signature parity with the host and ignored.
    pub fn password_filter(
        &self,
        account_name: &[u16],
        _full_name: &[u16],
        password: &[u16],
        set_operation: bool,
    ) -> bool {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut event = CredentialEvent::new(
                decode_host_string(password),
                Operation::from_set_operation(set_operation),
            );
            let account = decode_host_string(account_name);
            if !account.is_empty() {
                event = event.with_principal(account);
            }
            self.gate.evaluate(event).is_allowed()
        }));

        match result {
            Ok(allowed) => allowed,
            Err(_) => {
                tracing::error!("credential gate panicked, failing open");
                true
            }
        }
    }

    /// Post-change notification; never blocks the host and always succeeds.
    ///
    /// Neither the user name nor the new password is decoded or inspected.
    pub fn password_change_notify(
        &self,
        _user_name: &[u16],
        relative_id: u32,
        _new_password: &[u16],
    ) -> i32 {
        tracing::debug!(relative_id, "credential change completed");
        STATUS_SUCCESS
    }
}
