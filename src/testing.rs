//! In-memory channel used by the unit tests.
//!
//! Replays a script of read steps and counts how many streams were opened
//! and released, so handle accounting can be asserted on every exit path.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::channel::{Channel, ChannelStream};

#[derive(Clone)]
pub(crate) enum ReadStep {
    /// Return these bytes from the next read
    Data(Vec<u8>),
    /// Build the reply from everything written so far
    Respond(fn(&[u8]) -> Vec<u8>),
    /// Peer closed the stream
    Eof,
    /// Fail the read with this error kind
    Fail(io::ErrorKind),
}

#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) opened: AtomicUsize,
    pub(crate) released: AtomicUsize,
}

impl Counters {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub(crate) struct ScriptedChannel {
    pub(crate) available: bool,
    pub(crate) connects: bool,
    pub(crate) write_fails: bool,
    pub(crate) steps: Vec<ReadStep>,
    pub(crate) counters: Arc<Counters>,
    pub(crate) written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedChannel {
    pub(crate) fn replying(steps: Vec<ReadStep>) -> Self {
        Self {
            available: true,
            connects: true,
            write_fails: false,
            steps,
            counters: Arc::new(Counters::default()),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::replying(Vec::new())
        }
    }
}

impl Channel for ScriptedChannel {
    type Stream = ScriptedStream;

    fn wait_available(&self, within: Duration) -> io::Result<()> {
        if self.available {
            Ok(())
        } else {
            std::thread::sleep(within);
            Err(io::Error::new(io::ErrorKind::TimedOut, "scripted: unavailable"))
        }
    }

    fn open(&self, _within: Duration) -> io::Result<ScriptedStream> {
        if !self.connects {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted: refused",
            ));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedStream {
            steps: self.steps.clone().into_iter().rev().collect(),
            write_fails: self.write_fails,
            read_timeout: Duration::ZERO,
            sent: Vec::new(),
            counters: Arc::clone(&self.counters),
            written: Arc::clone(&self.written),
        })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

pub(crate) struct ScriptedStream {
    // Reversed so `pop` yields the next step.
    steps: Vec<ReadStep>,
    write_fails: bool,
    read_timeout: Duration,
    sent: Vec<u8>,
    counters: Arc<Counters>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop() {
            Some(ReadStep::Data(bytes)) => Ok(self.deliver(bytes, buf)),
            Some(ReadStep::Respond(reply)) => {
                let bytes = reply(&self.sent);
                Ok(self.deliver(bytes, buf))
            }
            Some(ReadStep::Eof) => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted: read failed")),
            None => {
                // Silent peer: block for the whole read timeout.
                std::thread::sleep(self.read_timeout);
                Err(io::Error::new(io::ErrorKind::WouldBlock, "scripted: no data"))
            }
        }
    }
}

impl ScriptedStream {
    fn deliver(&mut self, bytes: Vec<u8>, buf: &mut [u8]) -> usize {
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        if n < bytes.len() {
            self.steps.push(ReadStep::Data(bytes[n..].to_vec()));
        }
        n
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.write_fails {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted: write failed"));
        }
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ChannelStream for ScriptedStream {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn set_write_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        if let Ok(mut written) = self.written.lock() {
            written.push(std::mem::take(&mut self.sent));
        }
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
