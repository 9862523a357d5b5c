//! Interpretation of decision-service responses.

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct WireVerdict {
    #[serde(default)]
    allow: Option<bool>,
    // Any JSON type is accepted so an odd `reason` cannot void a denial.
    #[serde(default)]
    reason: Option<Value>,
}

fn reason_text(reason: Option<Value>) -> Option<String> {
    match reason {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

/// What the decision service said about a credential event.
///
/// Only [`Verdict::Deny`] blocks the operation. Everything the gate cannot
/// positively read as a denial resolves to allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `"allow": true`
    Allow,
    /// `"allow": false`, with the service's reason when it gave one
    Deny {
        /// Free-form reason supplied by the service
        reason: Option<String>,
    },
    /// A well-formed object without an `allow` field (or with `null`)
    Unspecified,
    /// Not a JSON object, or `allow` is not a boolean
    Malformed,
}

impl Verdict {
    /// Returns false only for an explicit denial.
    pub fn allows(&self) -> bool {
        !matches!(self, Verdict::Deny { .. })
    }

    /// Stable label used in log events and tooling output.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Deny { .. } => "deny",
            Verdict::Unspecified => "unspecified",
            Verdict::Malformed => "malformed",
        }
    }
}

/// Reads the `allow` field out of one response line.
///
/// Unknown fields, field order and insignificant whitespace do not matter.
///
/// # Examples
///
/// ```
/// use credential_gate::{interpret, Verdict};
///
/// assert!(!interpret(r#"{ "reason": "breached", "allow" : false }"#).allows());
/// assert_eq!(interpret(r#"{"status":"ok"}"#), Verdict::Unspecified);
/// assert_eq!(interpret(r#"{"allow":"false"}"#), Verdict::Malformed);
/// ```
pub fn interpret(raw: &str) -> Verdict {
    match serde_json::from_str::<WireVerdict>(raw) {
        Ok(WireVerdict {
            allow: Some(true), ..
        }) => Verdict::Allow,
        Ok(WireVerdict {
            allow: Some(false),
            reason,
        }) => Verdict::Deny {
            reason: reason_text(reason),
        },
        Ok(WireVerdict { allow: None, .. }) => Verdict::Unspecified,
        Err(_) => Verdict::Malformed,
    }
}
