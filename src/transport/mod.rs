use std::net::IpAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

pub mod udp;

pub use self::udp::UdpTransport;

pub const DNS_PORT: u16 = 53;
pub const MAX_REPLY_SIZE: usize = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

///Sends one query and waits for one reply. Only one exchange is ever in flight.
///
///Timeouts and socket failures come back as `Error::Transport`.
pub trait Transport {
    fn send(&mut self, query: &[u8], server: IpAddr) -> Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, query: &[u8], server: IpAddr) -> Result<Bytes> {
        (**self).send(query, server)
    }
}
