#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr};

use bytes::{BufMut, Bytes, BytesMut};
use koala_lookup::dns::decode_message;
use koala_lookup::trace::Tracer;
use koala_lookup::{Cache, RecordType, Resolver, ResolverConfig, Transport};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const ROOT: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 41, 0, 4));

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub enum Data {
    A(Ipv4Addr),
    Ns(String),
    Cname(String),
    Other(u16, Vec<u8>),
}

pub struct Rec {
    name: String,
    ttl: u32,
    data: Data,
}

pub fn a(name: &str, ttl: u32, addr: &str) -> Rec {
    Rec {
        name: name.to_string(),
        ttl,
        data: Data::A(addr.parse().unwrap()),
    }
}

pub fn ns(name: &str, target: &str) -> Rec {
    Rec {
        name: name.to_string(),
        ttl: 172800,
        data: Data::Ns(target.to_string()),
    }
}

pub fn cname(name: &str, target: &str) -> Rec {
    Rec {
        name: name.to_string(),
        ttl: 3600,
        data: Data::Cname(target.to_string()),
    }
}

pub fn soa(name: &str) -> Rec {
    Rec {
        name: name.to_string(),
        ttl: 900,
        data: Data::Other(6, vec![0; 22]),
    }
}

///Wire-format reply written without compression.
#[derive(Default)]
pub struct Reply {
    aa: bool,
    rcode: u8,
    answers: Vec<Rec>,
    authority: Vec<Rec>,
    additional: Vec<Rec>,
}

impl Reply {
    pub fn new() -> Reply {
        Reply::default()
    }

    pub fn authoritative(mut self) -> Reply {
        self.aa = true;
        self
    }

    pub fn rcode(mut self, rcode: u8) -> Reply {
        self.rcode = rcode;
        self
    }

    pub fn answer(mut self, rec: Rec) -> Reply {
        self.answers.push(rec);
        self
    }

    pub fn authority(mut self, rec: Rec) -> Reply {
        self.authority.push(rec);
        self
    }

    pub fn additional(mut self, rec: Rec) -> Reply {
        self.additional.push(rec);
        self
    }

    pub fn to_bytes(&self, id: u16, qname: &str, qtype: u16) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u16(id);
        let mut flags = 0x8000u16;
        if self.aa {
            flags |= 0x0400;
        }
        flags |= self.rcode as u16;
        buf.put_u16(flags);
        buf.put_u16(1);
        buf.put_u16(self.answers.len() as u16);
        buf.put_u16(self.authority.len() as u16);
        buf.put_u16(self.additional.len() as u16);

        put_name(&mut buf, qname);
        buf.put_u16(qtype);
        buf.put_u16(1);

        for rec in self
            .answers
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
        {
            put_name(&mut buf, &rec.name);
            let (rtype, rdata) = match &rec.data {
                Data::A(addr) => (1, addr.octets().to_vec()),
                Data::Ns(target) => (2, name_bytes(target)),
                Data::Cname(target) => (5, name_bytes(target)),
                Data::Other(code, rdata) => (*code, rdata.clone()),
            };
            buf.put_u16(rtype);
            buf.put_u16(1);
            buf.put_u32(rec.ttl);
            buf.put_u16(rdata.len() as u16);
            buf.put_slice(&rdata);
        }
        buf.freeze()
    }
}

fn name_bytes(name: &str) -> Vec<u8> {
    let mut buf = BytesMut::new();
    put_name(&mut buf, name);
    buf.to_vec()
}

fn put_name(buf: &mut BytesMut, name: &str) {
    for label in name.split('.').filter(|l| !l.is_empty()) {
        buf.put_u8(label.len() as u8);
        buf.put_slice(label.as_bytes());
    }
    buf.put_u8(0);
}

enum Behaviour {
    Reply(Reply),
    WrongId(Reply),
    TimeoutOnce(Reply, bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub server: IpAddr,
    pub qname: String,
    pub qtype: RecordType,
    pub id: u16,
}

///Answers from a fixed script keyed by server and question. Anything not scripted
///times out.
#[derive(Default)]
pub struct ScriptedTransport {
    script: HashMap<(IpAddr, String, RecordType), Behaviour>,
    pub sent: Vec<Sent>,
}

fn key(server: &str, qname: &str, qtype: RecordType) -> (IpAddr, String, RecordType) {
    (ip(server), qname.trim_end_matches('.').to_string(), qtype)
}

impl ScriptedTransport {
    pub fn new() -> ScriptedTransport {
        ScriptedTransport::default()
    }

    pub fn on(mut self, server: &str, qname: &str, qtype: RecordType, reply: Reply) -> Self {
        self.script
            .insert(key(server, qname, qtype), Behaviour::Reply(reply));
        self
    }

    pub fn wrong_id(mut self, server: &str, qname: &str, qtype: RecordType, reply: Reply) -> Self {
        self.script
            .insert(key(server, qname, qtype), Behaviour::WrongId(reply));
        self
    }

    pub fn timeout_once(
        mut self,
        server: &str,
        qname: &str,
        qtype: RecordType,
        reply: Reply,
    ) -> Self {
        self.script
            .insert(key(server, qname, qtype), Behaviour::TimeoutOnce(reply, false));
        self
    }

    pub fn sent_to(&self, server: &str) -> Vec<&Sent> {
        self.sent.iter().filter(|s| s.server == ip(server)).collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, query: &[u8], server: IpAddr) -> koala_lookup::Result<Bytes> {
        let id = u16::from_be_bytes([query[0], query[1]]);
        let question = decode_message(query, id)?
            .question
            .expect("query without a question");
        self.sent.push(Sent {
            server,
            qname: question.qname.clone(),
            qtype: question.qtype,
            id,
        });

        let timeout = || -> koala_lookup::Result<Bytes> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "scripted timeout").into())
        };
        let qtype = question.qtype.code();
        match self
            .script
            .get_mut(&(server, question.qname.clone(), question.qtype))
        {
            None => timeout(),
            Some(Behaviour::Reply(reply)) => Ok(reply.to_bytes(id, &question.qname, qtype)),
            Some(Behaviour::WrongId(reply)) => {
                Ok(reply.to_bytes(id.wrapping_add(1), &question.qname, qtype))
            }
            Some(Behaviour::TimeoutOnce(reply, fired)) => {
                if *fired {
                    Ok(reply.to_bytes(id, &question.qname, qtype))
                } else {
                    *fired = true;
                    timeout()
                }
            }
        }
    }
}

pub fn resolver(transport: ScriptedTransport) -> Resolver<ScriptedTransport, StdRng> {
    resolver_with_cache(transport, Cache::new())
}

pub fn resolver_with_cache(
    transport: ScriptedTransport,
    cache: Cache,
) -> Resolver<ScriptedTransport, StdRng> {
    Resolver::with_parts(
        ResolverConfig::new(ROOT),
        transport,
        cache,
        StdRng::seed_from_u64(7),
        Tracer::new(Box::new(io::sink())),
    )
}
