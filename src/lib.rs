//! An iterative DNS resolver: walks the delegation tree from a root server down to
//! an authoritative answer without asking the operating system's resolver.
#[macro_use]
extern crate log;

pub mod buf;
pub mod cache;
pub mod dns;
pub mod error;
pub mod resolver;
pub mod shell;
pub mod trace;
pub mod transport;

pub use crate::cache::Cache;
pub use crate::dns::{Node, RecordType, RecordValue, ResourceRecord};
pub use crate::error::{Error, Result};
pub use crate::resolver::{Resolver, ResolverConfig};
pub use crate::transport::{Transport, UdpTransport};
