use std::time::Duration;

use crate::event::Operation;
use crate::gate::Evaluation;
use crate::interpreter::Verdict;

/// Log context for one gate evaluation.
///
/// Carries only what is safe to emit: the operation kind and, when the
/// configuration allows it, the principal name. Secrets, encoded requests and
/// raw responses never reach this type, so no log event can contain them.
#[derive(Debug)]
pub(crate) struct EvaluationLog<'a> {
    operation: Operation,
    principal: Option<&'a str>,
}

impl<'a> EvaluationLog<'a> {
    /// Creates the log context; `principal` is dropped unless `log_principal`.
    pub(crate) fn new(operation: Operation, principal: Option<&'a str>, log_principal: bool) -> Self {
        Self {
            operation,
            principal: principal.filter(|_| log_principal),
        }
    }

    /// Emits one event describing how the evaluation ended.
    ///
    /// Denials log at `info`, fail-open after a failure or an unreadable
    /// response at `warn`, ordinary allows at `debug`.
    pub(crate) fn record(&self, evaluation: &Evaluation) {
        let op = self.operation.as_str();
        let outcome = evaluation.outcome.label();
        let allow = evaluation.decision.is_allowed();
        let elapsed_ms = millis(evaluation.elapsed);
        let principal = self.principal.unwrap_or("-");

        if !allow {
            tracing::info!(op, outcome, allow, elapsed_ms, principal, "credential change denied");
        } else if evaluation.outcome.is_failure() {
            tracing::warn!(
                op,
                outcome,
                allow,
                elapsed_ms,
                principal,
                "decision service not consulted, failing open"
            );
        } else if matches!(evaluation.verdict, Some(Verdict::Malformed)) {
            tracing::warn!(
                op,
                outcome,
                allow,
                elapsed_ms,
                principal,
                "decision service response unreadable, failing open"
            );
        } else {
            tracing::debug!(op, outcome, allow, elapsed_ms, principal, "credential change allowed");
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
