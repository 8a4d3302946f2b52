//! Encoding of outgoing queries and decoding of replies

use bytes::{Bytes, BytesMut};

use crate::buf::*;
use crate::dns::dns_entities::*;
use crate::dns::dns_packet::DnsPacket;
use crate::error::{Error, Result};

/// RFC1035 2.3.4, UDP messages are 512 octets or less
pub const MAX_QUERY_SIZE: usize = 512;

/// Root owner name, type, class, ttl and rdlength with no rdata
const MIN_RECORD_LEN: usize = 11;

///Builds a single-question, non-recursive query for `node`.
pub fn encode_query(node: &Node, transaction_id: u16) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(MAX_QUERY_SIZE);
    DnsHeader::query(transaction_id).write(&mut buf);
    DnsQuestion::new(node).write(&mut buf)?;
    debug_assert!(buf.len() <= MAX_QUERY_SIZE);
    trace!("{:?} bytes in query for {}", buf.len(), node);
    Ok(buf.freeze())
}

///Decodes a reply to the query with `expected_id`.
///
///Fails with `TransactionMismatch` before anything past the id is read, and with
///`ResponseFlagged` when the server reported an error or answered authoritatively
///with no answers. Records are only returned from a reply that passed both checks.
pub fn decode_message(bytes: &[u8], expected_id: u16) -> Result<DnsMessage> {
    let mut packet = DnsPacket::new(bytes);
    let id = packet.next_u16()?;
    if id != expected_id {
        return Err(Error::TransactionMismatch {
            expected: expected_id,
            actual: id,
        });
    }
    packet.seek(0);
    let header = DnsHeader::parse(&mut packet)?;

    let mut question = None;
    for _ in 0..header.qdcount {
        let parsed = DnsQuestion::parse(&mut packet)?;
        if question.is_some() {
            warn!("Ignoring extra question {:?}", parsed);
            continue;
        }
        question = Some(parsed);
    }

    let answers = parse_records(&mut packet, header.ancount)?;
    let nameservers = parse_records(&mut packet, header.nscount)?;
    let additional = parse_records(&mut packet, header.arcount)?;

    let message = DnsMessage {
        header,
        question,
        answers,
        nameservers,
        additional,
    };
    if message.is_flagged() {
        return Err(Error::ResponseFlagged(message.header.rcode));
    }
    Ok(message)
}

fn parse_records(packet: &mut DnsPacket<'_>, count: u16) -> Result<Vec<ResourceRecord>> {
    let mut records = Vec::with_capacity(capacity_hint(count, packet.remaining()));
    for _ in 0..count {
        let answer = DnsAnswer::parse(packet)?;
        trace!("{:?}", answer);
        records.push(answer.into_record(packet.message())?);
    }
    Ok(records)
}

// Counts come from the header and are not to be trusted
fn capacity_hint(count: u16, remaining: usize) -> usize {
    (count as usize).min(remaining / MIN_RECORD_LEN)
}
