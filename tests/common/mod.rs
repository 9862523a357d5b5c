//! Decision-service stub for integration tests.
//!
//! Listens on a Unix socket inside a temporary directory, records every
//! request it receives, and answers according to a [`Reply`] policy.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

/// How long misbehaving connections are held open.
pub const HOLD_OPEN: Duration = Duration::from_secs(3);

/// How the stub answers each request.
#[derive(Clone)]
pub enum Reply {
    /// Write this line followed by a terminator
    Line(String),
    /// Write these bytes, then keep the connection open without a terminator
    Partial(Vec<u8>),
    /// Read the request and never answer
    Silent,
    /// Compute the answer line from the parsed request
    Decide(fn(&Value) -> String),
}

/// A running stub service.
pub struct StubService {
    _dir: TempDir,
    path: PathBuf,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl StubService {
    /// Binds a fresh socket and starts answering with `reply`.
    pub fn start(reply: Reply) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policy.sock");
        let listener = UnixListener::bind(&path).expect("bind stub socket");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let reply = reply.clone();
                let recorded = Arc::clone(&recorded);
                thread::spawn(move || serve(stream, reply, recorded));
            }
        });

        Self {
            _dir: dir,
            path,
            requests,
        }
    }

    /// Socket path clients should connect to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requests received so far, parsed as JSON.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("requests lock").clone()
    }
}

fn serve(stream: UnixStream, reply: Reply, recorded: Arc<Mutex<Vec<Value>>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut line = String::new();
    if reader.read_line(&mut line).unwrap_or(0) == 0 {
        return;
    }
    assert!(line.ends_with('\n'), "request must be newline-terminated");
    let request: Value = serde_json::from_str(line.trim_end_matches('\n')).expect("request is JSON");
    recorded.lock().expect("requests lock").push(request.clone());

    let mut stream = stream;
    match reply {
        Reply::Line(text) => {
            let _ = stream.write_all(format!("{}\n", text).as_bytes());
        }
        Reply::Partial(bytes) => {
            let _ = stream.write_all(&bytes);
            thread::sleep(HOLD_OPEN);
        }
        Reply::Silent => thread::sleep(HOLD_OPEN),
        Reply::Decide(decide) => {
            let _ = stream.write_all(format!("{}\n", decide(&request)).as_bytes());
        }
    }
}

/// A socket path inside a fresh directory where nothing listens.
pub fn absent_socket() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.sock");
    (dir, path)
}
