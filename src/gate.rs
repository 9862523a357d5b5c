use std::time::{Duration, Instant};

use crate::channel::Channel;
use crate::config::{GateConfig, DEFAULT_TIMEOUT_MS};
use crate::deadline::Deadline;
use crate::encoder::encode;
use crate::event::CredentialEvent;
use crate::interpreter::{interpret, Verdict};
use crate::logging::EvaluationLog;
use crate::transport::{exchange, ExchangeOutcome};

/// The gate's answer to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    allow: bool,
}

impl Decision {
    /// A decision permitting the credential operation.
    pub fn allow() -> Self {
        Self { allow: true }
    }

    /// A decision rejecting the credential operation.
    pub fn deny() -> Self {
        Self { allow: false }
    }

    /// Returns true if the operation may proceed.
    pub fn is_allowed(&self) -> bool {
        self.allow
    }
}

/// Detailed record of one evaluation, for diagnostics and tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Decision returned to the caller
    pub decision: Decision,
    /// How the exchange with the decision service ended
    pub outcome: ExchangeOutcome,
    /// Interpretation of the response, when one was decoded
    pub verdict: Option<Verdict>,
    /// Wall time spent in the evaluation
    pub elapsed: Duration,
}

/// The fail-open credential policy gate.
///
/// `PolicyGate` asks the decision service about each credential event and
/// returns its answer, but only an explicit, well-formed denial blocks: every
/// failure to reach, talk to, or understand the service resolves to allow.
/// A single attempt is made per event, bounded end to end by the configured
/// timeout.
///
/// The gate holds no mutable state, so one instance can serve concurrent
/// callers on many threads.
///
/// # Examples
///
/// ```no_run
/// use credential_gate::{CredentialEvent, LocalSocket, Operation, PolicyGate};
/// use std::time::Duration;
///
/// let gate = PolicyGate::new(LocalSocket::new("/run/credential-gate/policy.sock"))
///     .with_timeout(Duration::from_millis(1500));
///
/// let decision = gate.evaluate(CredentialEvent::new("P@ss\"1", Operation::Change));
/// if !decision.is_allowed() {
///     // reject the credential change
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PolicyGate<C> {
    channel: C,
    timeout: Duration,
    log_principal: bool,
}

impl<C: Channel> PolicyGate<C> {
    /// Creates a gate on `channel` with the default 1500 ms timeout.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            log_principal: false,
        }
    }

    /// Sets the end-to-end budget for one evaluation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allows log events to carry the principal name.
    pub fn with_principal_logging(mut self, enabled: bool) -> Self {
        self.log_principal = enabled;
        self
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the channel the gate talks to.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Decides whether the credential operation may proceed.
    ///
    /// Never fails and never blocks longer than the timeout plus scheduling
    /// slack.
    pub fn evaluate(&self, event: CredentialEvent) -> Decision {
        self.evaluate_detailed(event).decision
    }

    /// Like [`evaluate`](Self::evaluate), also reporting how the exchange ended.
    pub fn evaluate_detailed(&self, event: CredentialEvent) -> Evaluation {
        let started = Instant::now();
        let operation = event.operation();
        let principal = event.principal().map(str::to_owned);
        let log = EvaluationLog::new(operation, principal.as_deref(), self.log_principal);

        let outcome = match encode(event) {
            Ok(message) => {
                let deadline = Deadline::after(self.timeout);
                exchange(&self.channel, &message, deadline)
            }
            Err(_) => ExchangeOutcome::EncodeFailed,
        };

        let verdict = match &outcome {
            ExchangeOutcome::Decoded(raw) => Some(interpret(raw)),
            _ => None,
        };
        let decision = match &verdict {
            Some(verdict) if !verdict.allows() => Decision::deny(),
            _ => Decision::allow(),
        };

        let evaluation = Evaluation {
            decision,
            outcome,
            verdict,
            elapsed: started.elapsed(),
        };
        log.record(&evaluation);
        evaluation
    }
}

#[cfg(unix)]
impl PolicyGate<crate::channel::LocalSocket> {
    /// Builds a gate on the Unix socket described by `config`.
    pub fn from_config(config: &GateConfig) -> Self {
        PolicyGate::new(crate::channel::LocalSocket::new(&config.channel_path))
            .with_timeout(config.timeout())
            .with_principal_logging(config.log_username)
    }
}
