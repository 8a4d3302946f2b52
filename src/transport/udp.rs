use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::Bytes;
use mio::net::UdpSocket;
use mio::{Events, Interest, Poll, Token};

use super::{Transport, DEFAULT_TIMEOUT, DNS_PORT, MAX_REPLY_SIZE};
use crate::error::Result;

const UPSTREAM_TOKEN: Token = Token(0);

//
// Blocking request/response over a single non-blocking socket, waited on with mio.
//
pub struct UdpTransport {
    socket: UdpSocket,
    poll: Poll,
    events: Events,
    port: u16,
    timeout: Duration,
}

impl UdpTransport {
    pub fn new() -> io::Result<UdpTransport> {
        UdpTransport::with_options(DNS_PORT, DEFAULT_TIMEOUT)
    }

    ///`port` is the port queries are sent to on every server.
    pub fn with_options(port: u16, timeout: Duration) -> io::Result<UdpTransport> {
        let mut socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut socket, UPSTREAM_TOKEN, Interest::READABLE)?;
        info!("Bound UDP socket to {:?}", socket.local_addr());
        Ok(UdpTransport {
            socket,
            poll,
            events: Events::with_capacity(16),
            port,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // Late replies to earlier, timed out queries would otherwise be read as the
    // reply to the next one.
    fn discard_stale(&mut self) {
        let mut buf = [0; MAX_REPLY_SIZE];
        while let Ok((count, addr)) = self.socket.recv_from(&mut buf) {
            debug!("Discarding {} stale bytes from {}", count, addr);
        }
    }

    // Only datagrams from `server` are considered; matching the id is left to the caller.
    fn receive(&mut self, server: SocketAddr) -> io::Result<Bytes> {
        let deadline = Instant::now() + self.timeout;
        let mut buf = [0; MAX_REPLY_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no reply from {} within {:?}", server, self.timeout),
                ));
            }

            match self.socket.recv_from(&mut buf) {
                Ok((count, addr)) if addr == server => {
                    debug!("Received {} bytes from {}", count, addr);
                    return Ok(Bytes::copy_from_slice(&buf[..count]));
                }
                Ok((count, addr)) => {
                    debug!("Ignoring {} bytes from {}, expected {}", count, addr, server);
                    continue;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }

            match self.poll.poll(&mut self.events, Some(remaining)) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, query: &[u8], server: IpAddr) -> Result<Bytes> {
        self.discard_stale();
        let addr = SocketAddr::new(server, self.port);
        let count = self.socket.send_to(query, addr)?;
        trace!("{:?} bytes sent to {}", count, addr);
        Ok(self.receive(addr)?)
    }
}
