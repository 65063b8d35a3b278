//! Non-blocking TCP socket primitives: a peer stream wrapper and a
//! single-backlog listener.

use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};

use socket2::{Domain, Protocol, Type};

/// Maximum bytes pulled off the wire per receive call
pub const RECV_CHUNK: usize = 1024;

/// Pending connections the OS queues for the listener (single-peer design)
pub const BACKLOG: i32 = 1;

/// Link error types
#[derive(Debug)]
pub enum LinkError {
    /// I/O error during socket operation
    Io(std::io::Error),
    /// Connect target is not a dotted IPv4 address
    InvalidAddress(String),
    /// Peer closed the connection
    ConnectionClosed,
    /// Operation on a socket that is not open
    NotConnected,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::Io(e) => write!(f, "I/O error: {}", e),
            LinkError::InvalidAddress(addr) => write!(f, "Invalid IPv4 address: {}", addr),
            LinkError::ConnectionClosed => write!(f, "Connection closed"),
            LinkError::NotConnected => write!(f, "Socket not connected"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<std::io::Error> for LinkError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::UnexpectedEof {
            LinkError::ConnectionClosed
        } else {
            LinkError::Io(e)
        }
    }
}

/// A connected peer stream. The handle is `None` once closed; `close` is
/// idempotent and drop closes implicitly.
pub struct Socket {
    inner: Option<TcpStream>,
}

impl Socket {
    pub(crate) fn from_stream(stream: TcpStream) -> Self {
        // Disable Nagle's algorithm for lower latency
        let _ = stream.set_nodelay(true);
        Socket {
            inner: Some(stream),
        }
    }

    /// Connect to a dotted IPv4 address
    pub fn connect(host: &str, port: u16) -> Result<Socket, LinkError> {
        let ip: Ipv4Addr = host
            .parse()
            .map_err(|_| LinkError::InvalidAddress(host.to_string()))?;
        let stream = TcpStream::connect(SocketAddrV4::new(ip, port))?;
        Ok(Socket::from_stream(stream))
    }

    /// Whether the underlying handle is still open
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Address of the remote endpoint, if open
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.as_ref().and_then(|s| s.peer_addr().ok())
    }

    /// Set non-blocking mode. No-op on a closed socket.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), LinkError> {
        match &self.inner {
            Some(stream) => Ok(stream.set_nonblocking(nonblocking)?),
            None => Ok(()),
        }
    }

    /// Write the full byte content of `text` in one call. No retry: a full
    /// send buffer (would-block) is a failure like any other write error.
    pub fn send(&mut self, text: &str) -> Result<(), LinkError> {
        let stream = self.inner.as_mut().ok_or(LinkError::NotConnected)?;
        stream.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Non-blocking receive of up to [`RECV_CHUNK`] bytes, appended to `buf`.
    ///
    /// Returns `Ok(n)` with `n > 0` when data was read, `Ok(0)` when no data
    /// is currently available (would-block — never an error), and `Err` when
    /// the peer closed the connection or a genuine error occurred. Callers
    /// must not treat `Ok(0)` as end-of-stream.
    pub fn try_recv(&mut self, buf: &mut Vec<u8>) -> Result<usize, LinkError> {
        let stream = self.inner.as_mut().ok_or(LinkError::NotConnected)?;
        let mut chunk = [0u8; RECV_CHUNK];
        match stream.read(&mut chunk) {
            Ok(0) => Err(LinkError::ConnectionClosed),
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(LinkError::Io(e)),
        }
    }

    /// Close the socket. Idempotent: a second call is a no-op.
    pub fn close(&mut self) {
        if let Some(stream) = self.inner.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// A listening endpoint restricted to the server role: bind, listen, accept.
/// Client-style operations live on [`Socket`], the type `try_accept` yields.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the wildcard address on `port` and start listening with a
    /// backlog of one. Every failing step is surfaced; a listener that could
    /// not bind is never constructed.
    pub fn bind(port: u16) -> Result<Listener, LinkError> {
        let socket = socket2::Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        // Avoid bind failures against lingering TIME_WAIT state
        socket.set_reuse_address(true)?;
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        socket.bind(&addr.into())?;
        socket.listen(BACKLOG)?;
        Ok(Listener {
            inner: socket.into(),
        })
    }

    /// Accept one pending connection, if any. `Ok(None)` means nothing is
    /// pending (non-blocking mode), distinct from an accept error.
    pub fn try_accept(&self) -> Result<Option<Socket>, LinkError> {
        match self.inner.accept() {
            Ok((stream, _)) => Ok(Some(Socket::from_stream(stream))),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(LinkError::Io(e)),
        }
    }

    /// Set non-blocking mode on the listener
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), LinkError> {
        Ok(self.inner.set_nonblocking(nonblocking)?)
    }

    /// Local address the listener is bound to (reports the OS-chosen port
    /// when bound to port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.inner.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn bind_local() -> (Listener, u16) {
        let listener = Listener::bind(0).unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn try_accept_returns_none_when_nothing_pending() {
        let (listener, _) = bind_local();
        listener.set_nonblocking(true).unwrap();
        assert!(listener.try_accept().unwrap().is_none());
    }

    #[test]
    fn connect_rejects_malformed_address() {
        match Socket::connect("not-an-ip", 2101) {
            Err(LinkError::InvalidAddress(addr)) => assert_eq!(addr, "not-an-ip"),
            other => panic!("expected InvalidAddress, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn close_is_idempotent_and_send_fails_after() {
        let (listener, port) = bind_local();
        let client = thread::spawn(move || {
            let _stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            thread::sleep(Duration::from_millis(50));
        });

        let mut peer = loop {
            if let Some(p) = listener.try_accept().unwrap() {
                break p;
            }
        };

        assert!(peer.is_open());
        peer.close();
        peer.close();
        assert!(!peer.is_open());
        assert!(matches!(peer.send("x"), Err(LinkError::NotConnected)));
        // Non-blocking toggle on a closed socket is a no-op, not an error
        assert!(peer.set_nonblocking(true).is_ok());
        client.join().unwrap();
    }

    #[test]
    fn send_and_recv_round_trip() {
        let (listener, port) = bind_local();

        let client = thread::spawn(move || {
            let mut socket = Socket::connect("127.0.0.1", port).unwrap();
            socket.send("hello\n").unwrap();

            let mut buf = Vec::new();
            socket.set_nonblocking(true).unwrap();
            let deadline = std::time::Instant::now() + Duration::from_secs(2);
            while !buf.ends_with(b"\n") {
                assert!(std::time::Instant::now() < deadline, "no reply");
                socket.try_recv(&mut buf).unwrap();
                thread::sleep(Duration::from_millis(1));
            }
            assert_eq!(buf, b"world\n");
        });

        let mut peer = loop {
            if let Some(p) = listener.try_accept().unwrap() {
                break p;
            }
        };
        peer.set_nonblocking(true).unwrap();

        let mut buf = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !buf.ends_with(b"\n") {
            assert!(std::time::Instant::now() < deadline, "no data from client");
            peer.try_recv(&mut buf).unwrap();
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(buf, b"hello\n");

        peer.send("world\n").unwrap();
        client.join().unwrap();
    }

    #[test]
    fn recv_reports_peer_close_as_error() {
        let (listener, port) = bind_local();
        let client = thread::spawn(move || {
            let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            drop(stream);
        });

        let mut peer = loop {
            if let Some(p) = listener.try_accept().unwrap() {
                break p;
            }
        };
        peer.set_nonblocking(true).unwrap();
        client.join().unwrap();

        let mut buf = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            match peer.try_recv(&mut buf) {
                Err(LinkError::ConnectionClosed) => break,
                Err(e) => panic!("unexpected error: {}", e),
                Ok(_) => {
                    assert!(std::time::Instant::now() < deadline, "close not observed");
                    thread::sleep(Duration::from_millis(1));
                }
            }
        }
    }

    #[test]
    fn bind_rejects_port_in_use() {
        let (_listener, port) = bind_local();
        assert!(matches!(Listener::bind(port), Err(LinkError::Io(_))));
    }
}
