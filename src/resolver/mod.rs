//! Iterative resolution from a root server down to an authoritative answer.
//!
//! Every reply that decodes cleanly is written to the cache, and the cache is the
//! only record of what has been learned: the resolver decides whether it is done
//! by reading it back.

use std::collections::HashSet;
use std::net::IpAddr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::cache::Cache;
use crate::dns::{self, Node, RecordType, ResourceRecord};
use crate::error::Result;
use crate::trace::Tracer;
use crate::transport::Transport;

mod session;

pub use self::session::Session;

/// How many CNAMEs are followed, and how often a lookup is restarted, before giving up.
pub const MAX_INDIRECTION_LEVEL: usize = 10;
/// How many referrals one walk follows, and how deeply nameserver lookups may nest.
pub const MAX_DELEGATION_DEPTH: usize = 10;
/// How many other nameservers are tried after an exchange fails.
pub const QUERY_RESEND_MAX_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub root_server: IpAddr,
    pub verbose: bool,
}

impl ResolverConfig {
    pub fn new(root_server: IpAddr) -> ResolverConfig {
        ResolverConfig {
            root_server,
            verbose: false,
        }
    }
}

pub struct Resolver<T, R = StdRng> {
    root_server: IpAddr,
    transport: T,
    cache: Cache,
    rng: R,
    tracer: Tracer,
}

impl<T: Transport, R: Rng> Resolver<T, R> {
    ///`rng` picks transaction ids, nameservers and addresses. Seed it for repeatable runs.
    pub fn with_parts(
        config: ResolverConfig,
        transport: T,
        cache: Cache,
        rng: R,
        mut tracer: Tracer,
    ) -> Resolver<T, R> {
        tracer.set_enabled(config.verbose);
        Resolver {
            root_server: config.root_server,
            transport,
            cache,
            rng,
            tracer,
        }
    }

    pub fn root_server(&self) -> IpAddr {
        self.root_server
    }

    pub fn set_root_server(&mut self, root_server: IpAddr) {
        info!("Root server is now {}", root_server);
        self.root_server = root_server;
    }

    pub fn verbose(&self) -> bool {
        self.tracer.is_enabled()
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.tracer.set_enabled(verbose);
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    ///All records for `host_name` and `record_type`, following CNAMEs. The records
    ///returned are those of the canonical name when an alias was followed.
    ///
    ///An empty set means no answer was found within the caps. The only error is
    ///`Error::Encoding` for a host name that cannot be put in a query.
    pub fn resolve(
        &mut self,
        host_name: &str,
        record_type: RecordType,
    ) -> Result<HashSet<ResourceRecord>> {
        let node = Node::new(host_name, record_type);
        dns::encode_query(&node, 0)?;
        self.cache.remove_expired();
        Ok(self.get_results(node))
    }

    fn get_results(&mut self, mut node: Node) -> HashSet<ResourceRecord> {
        for level in 0..MAX_INDIRECTION_LEVEL {
            let cached = self.cache.get_cached_results(&node);
            if !cached.is_empty() {
                return cached;
            }
            let records = match self.canonical_node(&node) {
                Some(canonical) if canonical != node => {
                    debug!("Following alias {} -> {}", node, canonical);
                    let records = self.resolve_node(&canonical, 0);
                    if !records.is_empty() {
                        node = canonical;
                    }
                    records
                }
                _ => self.resolve_node(&node, 0),
            };
            if !records.is_empty() {
                // read back rather than trust the walk's view
                return self.cache.get_cached_results(&node);
            }
            debug!("No results for {} at indirection level {}", node, level);
        }
        warn!("Maximum number of indirection levels reached for {}", node);
        HashSet::new()
    }

    ///Follows cached CNAMEs from `node` to the first name that either has records of
    ///the wanted type cached or no alias cached. `None` once the chain gets too long.
    fn canonical_node(&self, node: &Node) -> Option<Node> {
        // an alias asked for by name is the answer, not something to follow
        if node.record_type == RecordType::CNAME {
            return Some(node.clone());
        }
        let mut current = node.clone();
        for _ in 0..MAX_INDIRECTION_LEVEL {
            let alias_node = Node::new(&current.host_name, RecordType::CNAME);
            let aliases = self.cache.get_cached_results(&alias_node);
            let target = match aliases.iter().min().and_then(ResourceRecord::target) {
                Some(target) => Node::new(target, node.record_type),
                None => return Some(current),
            };
            if !self.cache.get_cached_results(&target).is_empty() {
                return Some(target);
            }
            current = target;
        }
        warn!("Maximum number of indirection levels reached for {}", node);
        None
    }

    fn resolve_node(&mut self, node: &Node, nesting: usize) -> HashSet<ResourceRecord> {
        if self.cache.get_cached_results(node).is_empty() {
            let root = self.root_server;
            self.walk(node, root, nesting);
        }
        self.cache.get_cached_results(node)
    }

    ///Queries `server` for `node` and follows referrals until the cache holds an answer,
    ///a reply names no further nameservers, or a cap is hit.
    fn walk(&mut self, node: &Node, server: IpAddr, nesting: usize) {
        if nesting >= MAX_DELEGATION_DEPTH {
            warn!("Nameserver lookups nested too deeply resolving {}", node);
            return;
        }
        let mut session = Session::new();
        let mut server = server;
        for _ in 0..MAX_DELEGATION_DEPTH {
            session.transaction_id = self.rng.gen();
            if let Err(e) = self.exchange(node, server, &mut session) {
                debug!("{} at {} failed. {}", node, server, e);
                self.tracer.miss(node);
                if !self.reattempt(node, &mut session, nesting) {
                    return;
                }
            }

            if !self.cache.get_cached_results(node).is_empty() || session.nameservers.is_empty() {
                return;
            }
            server = match self.nameserver_address(&session, nesting) {
                Some(next) => next,
                None => {
                    debug!("No address for any nameserver of {}", node);
                    return;
                }
            };
        }
        warn!("Maximum delegation depth reached resolving {}", node);
    }

    ///Resends the session's query, with its transaction id, to other nameservers
    ///from the last good referral. True once one of them replies cleanly.
    fn reattempt(&mut self, node: &Node, session: &mut Session, nesting: usize) -> bool {
        if session.nameservers.is_empty() {
            debug!("No other nameservers known for {}", node);
            return false;
        }
        for attempt in 1..=QUERY_RESEND_MAX_ATTEMPTS {
            let result = match self.nameserver_address(session, nesting) {
                Some(server) => self.exchange(node, server, session),
                None => {
                    debug!("Attempt {} for {}: nameserver has no address", attempt, node);
                    self.tracer.miss(node);
                    continue;
                }
            };
            match result {
                Ok(()) => return true,
                Err(e) => {
                    debug!("Attempt {} for {} failed. {}", attempt, node, e);
                    self.tracer.miss(node);
                }
            }
        }
        info!(
            "Giving up on {} after {} attempts",
            node, QUERY_RESEND_MAX_ATTEMPTS
        );
        false
    }

    ///Address of a random nameserver of the session, resolving its name if needed.
    fn nameserver_address(&mut self, session: &Session, nesting: usize) -> Option<IpAddr> {
        let name = session
            .nameservers
            .choose(&mut self.rng)
            .and_then(ResourceRecord::target)?;
        let ns_node = Node::new(name, RecordType::A);
        let mut addresses = self
            .resolve_node(&ns_node, nesting + 1)
            .iter()
            .filter_map(ResourceRecord::ip)
            .filter(IpAddr::is_ipv4)
            .collect::<Vec<_>>();
        addresses.sort();
        addresses.choose(&mut self.rng).copied()
    }

    ///One query/reply exchange. On success the reply's records are cached and its
    ///NS records become the session's nameservers. On failure nothing is touched.
    fn exchange(&mut self, node: &Node, server: IpAddr, session: &mut Session) -> Result<()> {
        let id = session.transaction_id;
        let query = dns::encode_query(node, id)?;
        debug!("Query {} {} --> {}", id, node, server);
        self.tracer.query(id, node, server);

        let reply = self.transport.send(&query, server)?;
        let message = dns::decode_message(&reply, id)?;
        self.tracer.response(&message);

        for record in message.records() {
            self.cache.add_result(record.clone());
        }
        let mut nameservers = message
            .nameservers
            .into_iter()
            .filter(|record| record.record_type == RecordType::NS)
            .collect::<Vec<_>>();
        nameservers.sort();
        session.nameservers = nameservers;
        Ok(())
    }
}
