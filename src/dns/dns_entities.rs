use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use thiserror::Error;

use crate::buf::*;
use crate::dns::bit_cursor::BitCursor;
use crate::dns::dns_packet::DnsPacket;
use crate::dns::name::DnsName;
use crate::error::{Error, Result};

pub const CLASS_IN: u16 = 1;
pub const HEADER_LEN: usize = 12;

pub const QR_QUERY: bool = false;
pub const QR_RESPONSE: bool = true;

/// Shown in place of record data this crate does not interpret.
pub const OPAQUE_PLACEHOLDER: &str = "----";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    MX,
    AAAA,
    /// Any other code, kept verbatim
    Other(u16),
}

impl RecordType {
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::MX => 15,
            RecordType::AAAA => 28,
            RecordType::Other(code) => code,
        }
    }

    pub fn from_code(code: u16) -> RecordType {
        match code {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            15 => RecordType::MX,
            28 => RecordType::AAAA,
            code => RecordType::Other(code),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::A => "A",
            RecordType::NS => "NS",
            RecordType::CNAME => "CNAME",
            RecordType::MX => "MX",
            RecordType::AAAA => "AAAA",
            RecordType::Other(_) => "OTHER",
        };
        f.pad(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown record type {0:?}, must be one of A, AAAA, NS, MX, CNAME")]
pub struct UnknownRecordType(pub String);

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::NS),
            "CNAME" => Ok(RecordType::CNAME),
            "MX" => Ok(RecordType::MX),
            "AAAA" => Ok(RecordType::AAAA),
            _ => Err(UnknownRecordType(s.to_string())),
        }
    }
}

///The key a lookup is made and cached under.
///Host names are kept without the trailing `.` so that `www.example.com.` and
///`www.example.com` are the same node. Case is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub host_name: String,
    pub record_type: RecordType,
}

impl Node {
    pub fn new(host_name: &str, record_type: RecordType) -> Node {
        Node {
            host_name: host_name.strip_suffix('.').unwrap_or(host_name).to_string(),
            record_type,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.host_name, self.record_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordValue {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// NS, CNAME or MX target
    Name(String),
    Opaque,
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Ipv4(addr) => write!(f, "{}", addr),
            RecordValue::Ipv6(addr) => write!(f, "{}", addr),
            RecordValue::Name(name) => f.write_str(name),
            RecordValue::Opaque => f.write_str(OPAQUE_PLACEHOLDER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRecord {
    pub host_name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub value: RecordValue,
}

impl ResourceRecord {
    pub fn new(host_name: &str, record_type: RecordType, ttl: u32, value: RecordValue) -> Self {
        ResourceRecord {
            host_name: host_name.strip_suffix('.').unwrap_or(host_name).to_string(),
            record_type,
            ttl,
            value,
        }
    }

    pub fn node(&self) -> Node {
        Node::new(&self.host_name, self.record_type)
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self.value {
            RecordValue::Ipv4(addr) => Some(IpAddr::V4(addr)),
            RecordValue::Ipv6(addr) => Some(IpAddr::V6(addr)),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.value {
            RecordValue::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    ///Iterative query: standard opcode, no recursion desired, one question.
    pub fn query(id: u16) -> DnsHeader {
        DnsHeader {
            id,
            qr: QR_QUERY,
            qdcount: 1,
            ..Default::default()
        }
    }

    pub fn parse(packet: &mut DnsPacket<'_>) -> Result<DnsHeader> {
        let id = packet.next_u16()?;
        let mut cursor = BitCursor::new_with(packet.next_u16()?);
        trace!("flags: {:016b}", cursor.bits());
        Ok(DnsHeader {
            id,
            qr: cursor.next_bool(),
            opcode: cursor.next_u4(),
            aa: cursor.next_bool(),
            tc: cursor.next_bool(),
            rd: cursor.next_bool(),
            ra: cursor.next_bool(),
            z: cursor.next_u3(),
            rcode: cursor.next_u4(),
            qdcount: packet.next_u16()?,
            ancount: packet.next_u16()?,
            nscount: packet.next_u16()?,
            arcount: packet.next_u16()?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut) {
        let mut cursor = BitCursor::default();
        cursor.write_bool(self.qr);
        cursor.write_u4(self.opcode);
        cursor.write_bool(self.aa);
        cursor.write_bool(self.tc);
        cursor.write_bool(self.rd);
        cursor.write_bool(self.ra);
        cursor.write_u3(self.z);
        cursor.write_u4(self.rcode);

        buf.put_u16(self.id);
        buf.put_u16(cursor.bits());
        buf.put_u16(self.qdcount);
        buf.put_u16(self.ancount);
        buf.put_u16(self.nscount);
        buf.put_u16(self.arcount);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub qname: String,
    pub qtype: RecordType,
    pub qclass: u16,
}

impl DnsQuestion {
    pub fn new(node: &Node) -> DnsQuestion {
        DnsQuestion {
            qname: node.host_name.clone(),
            qtype: node.record_type,
            qclass: CLASS_IN,
        }
    }

    pub fn parse(packet: &mut DnsPacket<'_>) -> Result<DnsQuestion> {
        Ok(DnsQuestion {
            qname: DnsName::parse(packet)?,
            qtype: RecordType::from_code(packet.next_u16()?),
            qclass: packet.next_u16()?,
        })
    }

    pub fn write(&self, buf: &mut BytesMut) -> Result<()> {
        DnsName::write(&self.qname, buf)?;
        buf.put_u16(self.qtype.code());
        buf.put_u16(self.qclass);
        Ok(())
    }

    pub fn node(&self) -> Node {
        Node::new(&self.qname, self.qtype)
    }
}

///A resource record as it sits on the wire. Only lives long enough to become a
///`ResourceRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub name: String,
    pub atype: u16,
    pub aclass: u16,
    pub ttl: u32,
    pub rdlength: u16,
    /// Offset of the rdata within the message, needed for compressed names in rdata
    pub rdata_offset: usize,
    pub rdata: Vec<u8>,
}

impl DnsAnswer {
    pub fn parse(packet: &mut DnsPacket<'_>) -> Result<DnsAnswer> {
        let name = DnsName::parse(packet)?;
        let atype = packet.next_u16()?;
        let aclass = packet.next_u16()?;
        let ttl = packet.next_u32()?;
        let rdlength = packet.next_u16()?;
        let rdata_offset = packet.pos();
        let rdata = packet.next_bytes(rdlength as usize)?;
        Ok(DnsAnswer {
            name,
            atype,
            aclass,
            ttl,
            rdlength,
            rdata_offset,
            rdata,
        })
    }

    ///Interprets the rdata. `message` is the whole datagram the answer came from.
    pub fn into_record(self, message: &[u8]) -> Result<ResourceRecord> {
        let record_type = RecordType::from_code(self.atype);
        let value = match record_type {
            RecordType::A => {
                let octets: [u8; 4] = self.rdata.as_slice().try_into().map_err(|_| {
                    Error::malformed(format!(
                        "A record for {} has {} bytes of rdata",
                        self.name, self.rdlength
                    ))
                })?;
                RecordValue::Ipv4(Ipv4Addr::from(octets))
            }
            RecordType::AAAA => {
                let octets: [u8; 16] = self.rdata.as_slice().try_into().map_err(|_| {
                    Error::malformed(format!(
                        "AAAA record for {} has {} bytes of rdata",
                        self.name, self.rdlength
                    ))
                })?;
                RecordValue::Ipv6(Ipv6Addr::from(octets))
            }
            RecordType::NS | RecordType::CNAME => {
                self.check_rdlength(1)?;
                let mut packet = DnsPacket::new_at(message, self.rdata_offset);
                RecordValue::Name(DnsName::parse(&mut packet)?)
            }
            RecordType::MX => {
                // skip the 16 bit preference
                self.check_rdlength(3)?;
                let mut packet = DnsPacket::new_at(message, self.rdata_offset);
                packet.next_u16()?;
                RecordValue::Name(DnsName::parse(&mut packet)?)
            }
            RecordType::Other(_) => RecordValue::Opaque,
        };
        Ok(ResourceRecord {
            host_name: self.name,
            record_type,
            ttl: self.ttl,
            value,
        })
    }

    // names in rdata are read from the whole message, so a short rdlength would
    // otherwise decode the next record's bytes
    fn check_rdlength(&self, min: u16) -> Result<()> {
        if self.rdlength < min {
            return Err(Error::malformed(format!(
                "type {} record for {} has {} bytes of rdata",
                self.atype, self.name, self.rdlength
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub question: Option<DnsQuestion>,
    pub answers: Vec<ResourceRecord>,
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl DnsMessage {
    ///A server-reported failure, or an authoritative reply with nothing in it.
    pub fn is_flagged(&self) -> bool {
        match self.header.rcode {
            1..=5 => true,
            0 => self.header.aa && self.answers.is_empty(),
            _ => false,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.nameservers.iter())
            .chain(self.additional.iter())
    }

    pub fn first_answer(&self) -> Option<&ResourceRecord> {
        self.answers.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_codes() {
        for rtype in [
            RecordType::A,
            RecordType::NS,
            RecordType::CNAME,
            RecordType::MX,
            RecordType::AAAA,
            RecordType::Other(6),
            RecordType::Other(65535),
        ] {
            assert_eq!(rtype, RecordType::from_code(rtype.code()));
        }
        assert_eq!(RecordType::Other(16), RecordType::from_code(16));
        assert_eq!("OTHER", RecordType::Other(16).to_string());
    }

    #[test]
    fn record_type_from_str() {
        assert_eq!(Ok(RecordType::AAAA), "aaaa".parse());
        assert_eq!(Ok(RecordType::CNAME), "CName".parse());
        assert_eq!(
            Err(UnknownRecordType("TXT".to_string())),
            "TXT".parse::<RecordType>()
        );
    }

    #[test]
    fn node_equality() {
        assert_eq!(
            Node::new("www.example.com.", RecordType::A),
            Node::new("www.example.com", RecordType::A)
        );
        assert_ne!(
            Node::new("www.example.com", RecordType::A),
            Node::new("www.example.com", RecordType::AAAA)
        );
        assert_ne!(
            Node::new("WWW.example.com", RecordType::A),
            Node::new("www.example.com", RecordType::A)
        );
    }

    #[test]
    fn header_round_trip() {
        let header = DnsHeader {
            id: 2161,
            qr: true,
            opcode: 2,
            aa: true,
            tc: false,
            rd: true,
            ra: true,
            z: 5,
            rcode: 3,
            qdcount: 1,
            ancount: 2,
            nscount: 3,
            arcount: 4,
        };
        let mut buf = BytesMut::new();
        header.write(&mut buf);
        assert_eq!(HEADER_LEN, buf.len());
        let parsed = DnsHeader::parse(&mut DnsPacket::new(&buf)).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn parse_query_header() {
        let buf = vec![8, 113, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        let header = DnsHeader::parse(&mut DnsPacket::new(&buf)).unwrap();
        assert_eq!(2161, header.id);
        assert!(!header.qr);
        assert!(header.rd);
        assert_eq!(1, header.qdcount);
    }

    fn answer(atype: u16, rdata: &[u8]) -> Vec<u8> {
        let mut buf = vec![0; HEADER_LEN];
        // owner "host"
        buf.extend_from_slice(&[4, b'h', b'o', b's', b't', 0]);
        buf.extend_from_slice(&atype.to_be_bytes());
        buf.extend_from_slice(&CLASS_IN.to_be_bytes());
        buf.extend_from_slice(&300u32.to_be_bytes());
        buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(rdata);
        buf
    }

    fn decode(buf: &[u8]) -> Result<ResourceRecord> {
        let mut packet = DnsPacket::new_at(buf, HEADER_LEN);
        DnsAnswer::parse(&mut packet)?.into_record(buf)
    }

    #[test]
    fn a_record() {
        let buf = answer(1, &[203, 0, 113, 5]);
        let record = decode(&buf).unwrap();
        assert_eq!(
            ResourceRecord::new("host", RecordType::A, 300, RecordValue::Ipv4(Ipv4Addr::new(203, 0, 113, 5))),
            record
        );
        assert_eq!(Some("203.0.113.5".parse().unwrap()), record.ip());
    }

    #[test]
    fn aaaa_record() {
        let addr: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let buf = answer(28, &addr.octets());
        assert_eq!(RecordValue::Ipv6(addr), decode(&buf).unwrap().value);
    }

    #[test]
    fn wrong_address_length_is_malformed() {
        assert!(matches!(decode(&answer(1, &[1, 2, 3])), Err(Error::MalformedMessage(_))));
        assert!(matches!(decode(&answer(28, &[1, 2, 3, 4])), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn compressed_ns_target() {
        // "ns1" + pointer back to "host" at offset 12
        let buf = answer(2, &[3, b'n', b's', b'1', 0xC0, 12]);
        let record = decode(&buf).unwrap();
        assert_eq!(RecordType::NS, record.record_type);
        assert_eq!(Some("ns1.host"), record.target());
    }

    #[test]
    fn mx_exchange() {
        let buf = answer(15, &[0, 10, 4, b'm', b'a', b'i', b'l', 0xC0, 12]);
        assert_eq!(RecordValue::Name("mail.host".to_string()), decode(&buf).unwrap().value);
    }

    #[test]
    fn short_name_rdata_is_malformed() {
        // a valid name follows the empty rdata, it must not be read as the target
        let mut buf = answer(2, &[]);
        buf.extend_from_slice(&[3, b'n', b's', b'1', 0]);
        assert!(matches!(decode(&buf), Err(Error::MalformedMessage(_))));

        let mut buf = answer(15, &[0, 10]);
        buf.extend_from_slice(&[4, b'm', b'a', b'i', b'l', 0]);
        assert!(matches!(decode(&buf), Err(Error::MalformedMessage(_))));

        // root exchange is the shortest valid MX
        let buf = answer(15, &[0, 10, 0]);
        assert_eq!(RecordValue::Name(String::new()), decode(&buf).unwrap().value);
    }

    #[test]
    fn other_types_are_opaque() {
        let buf = answer(16, b"\x05hello");
        let record = decode(&buf).unwrap();
        assert_eq!(RecordType::Other(16), record.record_type);
        assert_eq!(RecordValue::Opaque, record.value);
        assert_eq!(OPAQUE_PLACEHOLDER, record.value.to_string());
    }

    #[test]
    fn truncated_rdata_is_malformed() {
        let mut buf = answer(1, &[203, 0, 113, 5]);
        buf.truncate(buf.len() - 1);
        assert!(matches!(decode(&buf), Err(Error::MalformedMessage(_))));
    }

    fn message(rcode: u8, aa: bool, answers: usize) -> DnsMessage {
        let record = ResourceRecord::new("host", RecordType::A, 1, RecordValue::Opaque);
        DnsMessage {
            header: DnsHeader {
                qr: QR_RESPONSE,
                aa,
                rcode,
                ..Default::default()
            },
            question: None,
            answers: vec![record; answers],
            nameservers: vec![],
            additional: vec![],
        }
    }

    #[test]
    fn flagged() {
        for rcode in 1..=5 {
            assert!(message(rcode, false, 1).is_flagged());
        }
        assert!(message(0, true, 0).is_flagged());
        assert!(!message(0, true, 1).is_flagged());
        assert!(!message(0, false, 0).is_flagged());
        assert!(!message(9, false, 0).is_flagged());
    }
}
