//! Connection endpoint: listener setup and the single peer session.
//!
//! The service accepts exactly one client per process lifetime. That
//! invariant is enforced by construction: `accept_once` consumes the
//! `Endpoint`, and the resulting `Session` owns both the peer stream and
//! the listener. The listener stays bound but idle for the session's
//! lifetime, so no second peer can be accepted.

use crate::config::Config;
use socket2::{Domain, Socket, Type};
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Listen backlog. One client is expected; a tiny backlog matches.
const BACKLOG: i32 = 3;

/// Fixed receive buffer size, reused across reads.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Phase of socket setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPhase {
    Create,
    SetOpt,
    Bind,
    Listen,
    Register,
    Accept,
}

impl SocketPhase {
    fn as_str(&self) -> &'static str {
        match self {
            SocketPhase::Create => "create",
            SocketPhase::SetOpt => "setsockopt",
            SocketPhase::Bind => "bind",
            SocketPhase::Listen => "listen",
            SocketPhase::Register => "register",
            SocketPhase::Accept => "accept",
        }
    }
}

/// Fatal socket setup/accept failure.
#[derive(Debug)]
pub struct SocketError {
    pub phase: SocketPhase,
    pub source: io::Error,
}

impl SocketError {
    fn new(phase: SocketPhase, source: io::Error) -> Self {
        SocketError { phase, source }
    }
}

impl std::fmt::Display for SocketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "socket {} failed: {}", self.phase.as_str(), self.source)
    }
}

impl std::error::Error for SocketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Transport failure while writing to the peer. Ends the session loop,
/// never the process.
#[derive(Debug)]
pub struct SendError(pub io::Error);

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "send failed: {}", self.0)
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Result of one receive call.
///
/// A zero-length read (`Closed`) is a clean peer disconnect and must stay
/// distinguishable from a read error (`Failed`); both end the loop.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// Bytes arrived. One read call is one message; no line reassembly.
    Data(String),
    /// Peer closed the stream.
    Closed,
    /// The underlying read failed.
    Failed(io::Error),
}

/// The bound, listening endpoint. Exists only between bind and accept.
#[derive(Debug)]
pub struct Endpoint {
    listener: TcpListener,
}

impl Endpoint {
    /// Create, configure, bind, and listen. Must be called from within a
    /// tokio runtime (the listener is registered with it).
    ///
    /// Each setup step maps to a [`SocketPhase`] so startup failures name
    /// the step that broke.
    pub fn bind(config: &Config) -> Result<Endpoint, SocketError> {
        let ip: IpAddr = config
            .bind
            .parse()
            .map_err(|e| {
                SocketError::new(
                    SocketPhase::Bind,
                    io::Error::new(io::ErrorKind::InvalidInput, format!("{e}")),
                )
            })?;
        let addr = SocketAddr::new(ip, config.port);

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)
            .map_err(|e| SocketError::new(SocketPhase::Create, e))?;

        socket
            .set_reuse_address(true)
            .map_err(|e| SocketError::new(SocketPhase::SetOpt, e))?;
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        socket
            .set_reuse_port(true)
            .map_err(|e| SocketError::new(SocketPhase::SetOpt, e))?;

        socket
            .bind(&addr.into())
            .map_err(|e| SocketError::new(SocketPhase::Bind, e))?;
        socket
            .listen(BACKLOG)
            .map_err(|e| SocketError::new(SocketPhase::Listen, e))?;

        // tokio requires a nonblocking socket
        socket
            .set_nonblocking(true)
            .map_err(|e| SocketError::new(SocketPhase::Register, e))?;
        let listener = TcpListener::from_std(socket.into())
            .map_err(|e| SocketError::new(SocketPhase::Register, e))?;

        Ok(Endpoint { listener })
    }

    /// Address the listener actually bound to (port 0 resolves here).
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.listener
            .local_addr()
            .map_err(|e| SocketError::new(SocketPhase::Bind, e))
    }

    /// Wait for exactly one peer. Consumes the endpoint; the session keeps
    /// the listener alive so accept cannot happen twice.
    pub async fn accept_once(self) -> Result<Session, SocketError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| SocketError::new(SocketPhase::Accept, e))?;

        Ok(Session {
            stream,
            peer,
            buf: [0u8; RECV_BUFFER_SIZE],
            _listener: self.listener,
        })
    }
}

/// The single accepted peer connection and its reusable receive buffer.
pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    buf: [u8; RECV_BUFFER_SIZE],
    _listener: TcpListener,
}

impl Session {
    /// Peer address, for diagnostics.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Block until the peer sends bytes or closes the stream. Reads at most
    /// [`RECV_BUFFER_SIZE`] bytes; no timeout is applied.
    pub async fn receive(&mut self) -> ReceiveOutcome {
        match self.stream.read(&mut self.buf).await {
            Ok(0) => ReceiveOutcome::Closed,
            Ok(n) => ReceiveOutcome::Data(String::from_utf8_lossy(&self.buf[..n]).into_owned()),
            Err(e) => ReceiveOutcome::Failed(e),
        }
    }

    /// Write all bytes of `text` to the peer.
    pub async fn send(&mut self, text: &str) -> Result<(), SendError> {
        self.stream
            .write_all(text.as_bytes())
            .await
            .map_err(SendError)
    }
}
