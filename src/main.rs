//! `credgate`: operator tooling for the credential gate.
//!
//! - `probe` runs one real gate evaluation against the decision service
//! - `check` reports whether the service channel is reachable
//!
//! Passwords given to `probe` are sent to the service and never printed.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand, ValueEnum};
use credential_gate::{
    Channel, CredentialEvent, Deadline, Error, GateConfig, LocalSocket, Operation, PolicyGate,
    Verdict,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "credgate", version, about = "Credential policy gate tooling")]
struct Cli {
    /// Gate configuration file
    #[arg(long, value_name = "PATH", env = "CREDENTIAL_GATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the decision service socket path
    #[arg(long, value_name = "PATH", global = true)]
    channel: Option<PathBuf>,

    /// Override the exchange timeout
    #[arg(long, value_name = "MS", global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a test credential and print the gate's decision
    Probe(ProbeArgs),
    /// Check that the decision service channel is reachable
    Check,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Test password (a throwaway one is generated when omitted)
    #[arg(long, conflicts_with = "password_stdin")]
    password: Option<String>,

    /// Read the test password from the first line of stdin
    #[arg(long)]
    password_stdin: bool,

    /// Account name to send with the request
    #[arg(long)]
    username: Option<String>,

    /// Operation kind to report
    #[arg(long, value_enum, default_value_t = OpArg::Change)]
    op: OpArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OpArg {
    Reset,
    Change,
}

impl From<OpArg> for Operation {
    fn from(op: OpArg) -> Self {
        match op {
            OpArg::Reset => Operation::Reset,
            OpArg::Change => Operation::Change,
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(io::stderr(), "credgate: {}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = resolve_config(&cli)?;
    let gate = PolicyGate::from_config(&config);

    match cli.command {
        Command::Probe(args) => probe(&gate, args),
        Command::Check => check(&gate),
    }
}

fn resolve_config(cli: &Cli) -> Result<GateConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => GateConfig::load(path).map_err(Error::from)?,
        None => GateConfig::default(),
    };
    if let Some(channel) = &cli.channel {
        config.channel_path = channel.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate().map_err(Error::from)?;
    Ok(config)
}

fn probe(gate: &PolicyGate<LocalSocket>, args: ProbeArgs) -> Result<ExitCode, CliError> {
    let password = match (args.password, args.password_stdin) {
        (Some(password), _) => password,
        (None, true) => read_password_line()?,
        (None, false) => throwaway_password(),
    };

    let mut event = CredentialEvent::new(password, args.op.into());
    if let Some(username) = args.username {
        event = event.with_principal(username);
    }

    let evaluation = gate.evaluate_detailed(event);
    let decision = if evaluation.decision.is_allowed() {
        "allow"
    } else {
        "deny"
    };

    let mut out = io::stdout().lock();
    writeln!(out, "decision: {}", decision)?;
    writeln!(out, "outcome:  {}", evaluation.outcome)?;
    if let Some(verdict) = &evaluation.verdict {
        writeln!(out, "verdict:  {}", verdict.label())?;
        if let Verdict::Deny {
            reason: Some(reason),
        } = verdict
        {
            writeln!(out, "reason:   {}", reason)?;
        }
    }
    writeln!(out, "elapsed:  {} ms", evaluation.elapsed.as_millis())?;
    Ok(ExitCode::SUCCESS)
}

fn check(gate: &PolicyGate<LocalSocket>) -> Result<ExitCode, CliError> {
    let channel = gate.channel();
    let deadline = Deadline::after(gate.timeout());
    let reachable = channel
        .wait_available(gate.timeout())
        .and_then(|()| {
            let remaining = deadline
                .remaining()
                .ok_or_else(|| io::Error::from(io::ErrorKind::TimedOut))?;
            channel.open(remaining)
        })
        .map(drop);

    let mut out = io::stdout().lock();
    match reachable {
        Ok(()) => {
            writeln!(out, "channel {} is reachable", channel.describe())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            writeln!(out, "channel {} is unavailable: {}", channel.describe(), e)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_password_line() -> Result<String, CliError> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let trimmed_len = line.trim_end_matches(&['\r', '\n'][..]).len();
    line.truncate(trimmed_len);
    Ok(line)
}

fn throwaway_password() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .subsec_nanos();
    format!("Probe-{}-{:08x}A1!", std::process::id(), nanos)
}

/// Failures surfaced to the operator.
#[derive(Debug)]
enum CliError {
    Gate(Error),
    Io(io::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Gate(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Gate(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
