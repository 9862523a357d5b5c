use std::fmt;

use serde::Serialize;

use crate::Secret;

/// Kind of credential operation the host is about to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Administrative set of a credential (the host's "set operation" flag)
    Reset,
    /// User-initiated change of an existing credential
    Change,
}

impl Operation {
    /// Maps the host's set-operation flag onto an operation kind.
    pub fn from_set_operation(set_operation: bool) -> Self {
        if set_operation {
            Operation::Reset
        } else {
            Operation::Change
        }
    }

    /// Returns the wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Reset => "reset",
            Operation::Change => "change",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single credential-set attempt submitted to the gate.
///
/// The event lives only for one evaluation: encoding consumes it, and the
/// candidate secret is wiped when the event is dropped.
///
/// # Examples
///
/// ```
/// use credential_gate::{CredentialEvent, Operation};
///
/// let event = CredentialEvent::new("P@ss\"1", Operation::Change).with_principal("alice");
/// assert_eq!(event.principal(), Some("alice"));
/// assert!(!format!("{:?}", event).contains("P@ss"));
/// ```
///
/// Events are not `Clone`, so the secret has exactly one owner:
///
/// ```compile_fail
/// use credential_gate::{CredentialEvent, Operation};
///
/// let event = CredentialEvent::new("x", Operation::Change);
/// let _copy = event.clone();
/// ```
#[derive(Debug)]
pub struct CredentialEvent {
    secret: Secret<String>,
    principal: Option<String>,
    operation: Operation,
}

impl CredentialEvent {
    /// Creates an event for the given candidate secret.
    pub fn new(secret: impl Into<String>, operation: Operation) -> Self {
        Self {
            secret: Secret::new(secret.into()),
            principal: None,
            operation,
        }
    }

    /// Attaches the principal (account name) the credential belongs to.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Returns the candidate secret, still wrapped.
    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    /// Returns the principal name, if one was supplied and it is non-empty.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns the operation kind.
    pub fn operation(&self) -> Operation {
        self.operation
    }
}
