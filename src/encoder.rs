//! Wire encoding of credential events.
//!
//! A request is one JSON object on one line:
//!
//! ```text
//! {"password":"...","username":"...","op":"reset"}\n
//! ```
//!
//! `username` is omitted when the principal is absent or empty. String
//! escaping is delegated to `serde_json`, which escapes quotes, backslashes
//! and every control character, so a raw newline inside a secret can never
//! terminate the line early.

use serde::Serialize;

use crate::error::EncodeError;
use crate::event::{CredentialEvent, Operation};
use crate::Secret;

/// Line terminator shared by requests and responses.
pub const LINE_TERMINATOR: u8 = b'\n';

// Braces, three keys with quotes and colons, separators, terminator.
const FRAME_OVERHEAD: usize = 48;
// Longest escape serde_json emits for one input byte (`\u00XX`).
const MAX_ESCAPE_RATIO: usize = 6;

#[derive(Serialize)]
struct WireRequest<'a> {
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    op: Operation,
}

/// An encoded, newline-terminated request ready for the channel.
///
/// The payload embeds the candidate secret, so it is redacted in `Debug`
/// output and wiped when dropped.
#[derive(Debug)]
pub struct EncodedMessage {
    bytes: Secret<Vec<u8>>,
}

impl EncodedMessage {
    /// Returns the raw payload, terminator included.
    ///
    /// # Security Warning
    ///
    /// The payload contains the candidate secret in clear text.
    pub fn expose_bytes(&self) -> &[u8] {
        self.bytes.expose_secret()
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.expose_bytes().len()
    }

    /// Returns true if the payload is empty; never the case for [`encode`] output.
    pub fn is_empty(&self) -> bool {
        self.expose_bytes().is_empty()
    }
}

/// Encodes a credential event, consuming it.
///
/// The event (and with it the plain secret) is dropped before this function
/// returns, leaving the encoded message as the only copy.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialization fails. Serializing strings into
/// memory does not fail in practice; the gate treats it like any other
/// failure and allows.
///
/// # Examples
///
/// ```
/// use credential_gate::{encode, CredentialEvent, Operation};
///
/// let message = encode(CredentialEvent::new("abc", Operation::Reset)).unwrap();
/// assert_eq!(message.expose_bytes(), b"{\"password\":\"abc\",\"op\":\"reset\"}\n");
/// ```
pub fn encode(event: CredentialEvent) -> Result<EncodedMessage, EncodeError> {
    let password = event.secret().expose_secret().as_str();
    let username = event.principal();

    let capacity = FRAME_OVERHEAD
        + MAX_ESCAPE_RATIO * (password.len() + username.map_or(0, str::len));
    // Sized for the worst case so the serializer never reallocates and leaves
    // a stale copy of the secret in freed memory.
    let mut buffer = Secret::new(Vec::with_capacity(capacity));

    let request = WireRequest {
        password,
        username,
        op: event.operation(),
    };

    serde_json::to_writer(buffer.expose_secret_mut(), &request)
        .map_err(|_| EncodeError::new())?;
    buffer.expose_secret_mut().push(LINE_TERMINATOR);

    drop(event);
    Ok(EncodedMessage { bytes: buffer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_to_string(event: CredentialEvent) -> String {
        let message = encode(event).expect("encoding succeeds");
        String::from_utf8(message.expose_bytes().to_vec()).expect("utf-8 output")
    }

    #[test]
    fn change_with_principal_has_all_fields_in_order() {
        let line = encode_to_string(
            CredentialEvent::new("P@ss\"1", Operation::Change).with_principal("alice"),
        );

        assert_eq!(
            line,
            "{\"password\":\"P@ss\\\"1\",\"username\":\"alice\",\"op\":\"change\"}\n"
        );
    }

    #[test]
    fn empty_principal_omits_username() {
        let line = encode_to_string(CredentialEvent::new("abc", Operation::Reset).with_principal(""));

        assert!(!line.contains("username"));
        assert!(line.contains("\"op\":\"reset\""));
    }

    #[test]
    fn control_characters_use_standard_escapes() {
        let line = encode_to_string(CredentialEvent::new(
            "a\nb\rc\td\u{8}e\u{c}f\u{1}g\\h",
            Operation::Change,
        ));

        assert!(line.contains(r#"a\nb\rc\td\be\ff\u0001g\\h"#));
    }

    #[test]
    fn raw_newline_in_secret_never_splits_the_line() {
        let line = encode_to_string(CredentialEvent::new("line1\nline2\n", Operation::Change));

        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn debug_output_of_message_is_redacted() {
        let message = encode(CredentialEvent::new("hunter2", Operation::Reset)).unwrap();
        let debug_output = format!("{:?}", message);

        assert!(!debug_output.contains("hunter2"));
        assert!(!message.is_empty());
    }

    proptest! {
        /// Property: any secret and principal encode to one parseable JSON line
        #[test]
        fn proptest_encoded_message_parses_back(
            secret in any::<String>(),
            principal in prop::option::of(any::<String>()),
            set_operation in any::<bool>()
        ) {
            let mut event = CredentialEvent::new(secret.clone(), Operation::from_set_operation(set_operation));
            if let Some(name) = &principal {
                event = event.with_principal(name.clone());
            }
            let message = encode(event).unwrap();
            let bytes = message.expose_bytes();

            prop_assert_eq!(bytes.last(), Some(&LINE_TERMINATOR));
            prop_assert_eq!(bytes.iter().filter(|b| **b == LINE_TERMINATOR).count(), 1);
            prop_assert!(message.len() <= FRAME_OVERHEAD
                + MAX_ESCAPE_RATIO * (secret.len() + principal.as_ref().map_or(0, String::len)));

            let parsed: serde_json::Value = serde_json::from_slice(&bytes[..bytes.len() - 1]).unwrap();
            prop_assert_eq!(parsed["password"].as_str(), Some(secret.as_str()));
            match principal.as_deref().filter(|name| !name.is_empty()) {
                Some(name) => {
                    prop_assert_eq!(parsed["username"].as_str(), Some(name));
                }
                None => {
                    prop_assert!(parsed.get("username").is_none());
                }
            }
            let expected_op = if set_operation { "reset" } else { "change" };
            prop_assert_eq!(parsed["op"].as_str(), Some(expected_op));
        }
    }
}
