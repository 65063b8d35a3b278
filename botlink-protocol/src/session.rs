//! Single-peer bot session: non-blocking accept, buffered line reads, event
//! sends. Designed to be polled once per host tick.

use std::net::SocketAddr;

use crate::event::Event;
use crate::socket::{LinkError, Listener, Socket};

/// Session state machine over one listening endpoint and at most one peer.
///
/// `peer` is `Some` iff the session is connected. Any peer-level failure
/// closes the peer and returns the session to the idle state, where it can
/// accept a new connection; nothing is fatal to the session itself.
pub struct BotSession {
    listener: Listener,
    peer: Option<Socket>,
    inbound: Vec<u8>,
}

impl BotSession {
    /// Bind the listening endpoint on `port` and set it non-blocking.
    /// Bind or listen failure is returned, not swallowed.
    pub fn bind(port: u16) -> Result<BotSession, LinkError> {
        let listener = Listener::bind(port)?;
        listener.set_nonblocking(true)?;
        Ok(BotSession {
            listener,
            peer: None,
            inbound: Vec::new(),
        })
    }

    /// Whether a peer is currently connected
    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    /// Address of the connected peer, if any
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer.as_ref().and_then(|p| p.peer_addr())
    }

    /// Local address of the listening endpoint
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        self.listener.local_addr()
    }

    /// Accept one pending bot connection, if any. Returns false while a peer
    /// is already connected; a second connector stays queued at the OS until
    /// the current peer goes away.
    pub fn try_accept(&mut self) -> bool {
        if self.peer.is_some() {
            return false;
        }
        match self.listener.try_accept() {
            Ok(Some(peer)) => {
                if peer.set_nonblocking(true).is_err() {
                    return false;
                }
                self.inbound.clear();
                self.peer = Some(peer);
                true
            }
            // Nothing pending, or accept rejected by the OS. Either way the
            // session stays idle and the next poll retries.
            Ok(None) | Err(_) => false,
        }
    }

    /// Read one complete line from the bot, if available.
    ///
    /// Received bytes accumulate in an internal buffer and are only handed
    /// out at newline boundaries, one line per call; a partial line stays
    /// buffered until its terminator arrives. `None` means no complete line
    /// yet — never an error. On peer close or read error the peer is
    /// disconnected and the session returns to idle.
    pub fn try_read_line(&mut self) -> Option<String> {
        if let Some(line) = self.pop_line() {
            return Some(line);
        }
        let peer = self.peer.as_mut()?;
        match peer.try_recv(&mut self.inbound) {
            Ok(0) => None,
            Ok(_) => self.pop_line(),
            Err(_) => {
                self.disconnect();
                None
            }
        }
    }

    /// Send one telemetry line to the bot. Returns false without side
    /// effects when idle; on a send failure the peer is disconnected.
    pub fn send_event(&mut self, time: f32, name: &str, pos: (f32, f32), params: &str) -> bool {
        self.send(&Event::new(time, name, pos, params))
    }

    /// Send an already-built [`Event`]
    pub fn send(&mut self, event: &Event) -> bool {
        let Some(peer) = self.peer.as_mut() else {
            return false;
        };
        if peer.send(&event.encode()).is_err() {
            self.disconnect();
            return false;
        }
        true
    }

    /// Split the first complete line off the inbound buffer. Strips the
    /// newline and an optional carriage return before it.
    fn pop_line(&mut self) -> Option<String> {
        let newline = self.inbound.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.inbound.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn disconnect(&mut self) {
        if let Some(mut peer) = self.peer.take() {
            peer.close();
        }
        self.inbound.clear();
    }
}

impl Drop for BotSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
