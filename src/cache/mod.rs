use std::collections::{HashMap, HashSet};
use std::time::Instant;

use time::Duration;

use crate::dns::{Node, ResourceRecord};

///Decoded records keyed by `(host name, type)`. A record is stored once per node no
///matter how many replies carry it.
///
///TTLs are only enforced for a cache built with `expiring()`. There a record is
///dropped by the first `remove_expired` after its TTL has elapsed, so a lookup
///that purges once up front can still read back answers with a TTL of zero.
///Adding an expired record again restarts its TTL.
#[derive(Debug, Default)]
pub struct Cache {
    map: HashMap<Node, HashMap<ResourceRecord, Instant>>,
    expire: bool,
}

impl Cache {
    pub fn new() -> Cache {
        Cache::default()
    }

    pub fn expiring() -> Cache {
        Cache {
            map: HashMap::new(),
            expire: true,
        }
    }

    pub fn add_result(&mut self, record: ResourceRecord) {
        self.add_result_at(record, Instant::now());
    }

    fn add_result_at(&mut self, record: ResourceRecord, now: Instant) {
        let expiry = now + Duration::seconds(i64::from(record.ttl));
        let expire = self.expire;
        let records = self.map.entry(record.node()).or_default();
        match records.get_mut(&record) {
            Some(existing) => {
                if expire && *existing <= now {
                    trace!("Refreshing {:?}", record);
                    *existing = expiry;
                }
            }
            None => {
                trace!("Caching {:?}", record);
                records.insert(record, expiry);
            }
        }
    }

    pub fn get_cached_results(&self, node: &Node) -> HashSet<ResourceRecord> {
        self.map
            .get(node)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    ///Calls `f` for every node with records, ordered by node.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Node, &HashSet<ResourceRecord>),
    {
        let mut nodes = self.map.keys().collect::<Vec<_>>();
        nodes.sort();
        for node in nodes {
            let records = self.get_cached_results(node);
            if !records.is_empty() {
                f(node, &records);
            }
        }
    }

    ///Drops records whose TTL has elapsed. A no-op unless the cache is expiring.
    pub fn remove_expired(&mut self) -> usize {
        self.remove_expired_at(Instant::now())
    }

    fn remove_expired_at(&mut self, now: Instant) -> usize {
        if !self.expire {
            return 0;
        }
        let mut count = 0;
        for records in self.map.values_mut() {
            let before = records.len();
            records.retain(|_, expiry| *expiry > now);
            count += before - records.len();
        }
        self.map.retain(|_, records| !records.is_empty());
        debug!("Removed {} expired records", count);
        count
    }

    ///Number of nodes with at least one record stored
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
