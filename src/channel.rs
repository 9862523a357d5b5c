//! Local named channel to the decision service.
//!
//! The transport only needs three things from an IPC endpoint: wait until it
//! accepts connections, open a bidirectional byte stream, and bound every
//! blocking read and write by an OS-level timeout. [`Channel`] and
//! [`ChannelStream`] capture exactly that, so the exchange logic is the same
//! for the Unix domain socket shipped here and for any other local transport
//! a host integration plugs in.

use std::io::{self, Read, Write};
use std::time::Duration;

/// A bidirectional byte stream opened on a [`Channel`].
///
/// Dropping the stream releases the underlying handle.
pub trait ChannelStream: Read + Write {
    /// Bounds the next blocking reads by `timeout`.
    ///
    /// A read that sees no data within the timeout fails with
    /// [`io::ErrorKind::WouldBlock`] or [`io::ErrorKind::TimedOut`].
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Bounds the next blocking writes by `timeout`.
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// A named local endpoint of the decision service.
pub trait Channel {
    /// Stream type produced by [`open`](Self::open).
    type Stream: ChannelStream;

    /// Blocks until the endpoint can accept a connection, for at most `within`.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::TimedOut`] if the endpoint did not appear in
    /// time, or any error encountered while probing it.
    fn wait_available(&self, within: Duration) -> io::Result<()>;

    /// Opens a new stream to the endpoint, giving up after `within`.
    ///
    /// # Errors
    ///
    /// Returns the connection error, or an error of kind
    /// [`io::ErrorKind::TimedOut`] or [`io::ErrorKind::WouldBlock`] when the
    /// endpoint cannot take the connection in time.
    fn open(&self, within: Duration) -> io::Result<Self::Stream>;

    /// Human-readable endpoint name for diagnostics.
    fn describe(&self) -> String;
}

#[cfg(unix)]
pub use self::unix::LocalSocket;

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::io;
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::net::UnixStream;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    use socket2::{Domain, SockAddr, Socket, Type};

    use super::{Channel, ChannelStream};

    /// Interval between probes for the socket file while waiting for it.
    const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

    /// Unix domain socket endpoint at a well-known path.
    ///
    /// # Examples
    ///
    /// ```
    /// use credential_gate::{Channel, LocalSocket};
    ///
    /// let socket = LocalSocket::new("/run/credential-gate/policy.sock");
    /// assert_eq!(socket.describe(), "/run/credential-gate/policy.sock");
    /// ```
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LocalSocket {
        path: PathBuf,
    }

    impl LocalSocket {
        /// Creates an endpoint for the socket at `path`.
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// Returns the socket path.
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn is_listening_socket(&self) -> bool {
            fs::metadata(&self.path)
                .map(|meta| meta.file_type().is_socket())
                .unwrap_or(false)
        }
    }

    impl Channel for LocalSocket {
        type Stream = UnixStream;

        fn wait_available(&self, within: Duration) -> io::Result<()> {
            let started = Instant::now();
            loop {
                if self.is_listening_socket() {
                    return Ok(());
                }
                let left = within.saturating_sub(started.elapsed());
                if left.is_zero() {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "decision service socket did not appear in time",
                    ));
                }
                std::thread::sleep(left.min(WAIT_POLL_INTERVAL));
            }
        }

        fn open(&self, within: Duration) -> io::Result<UnixStream> {
            // A full accept backlog would block a plain connect indefinitely.
            let address = SockAddr::unix(&self.path)?;
            let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
            socket.connect_timeout(&address, within)?;
            Ok(UnixStream::from(socket))
        }

        fn describe(&self) -> String {
            self.path.display().to_string()
        }
    }

    impl ChannelStream for UnixStream {
        fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
            UnixStream::set_read_timeout(self, Some(timeout))
        }

        fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
            UnixStream::set_write_timeout(self, Some(timeout))
        }
    }

}
