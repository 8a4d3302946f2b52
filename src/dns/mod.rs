pub mod bit_cursor;
pub mod dns_entities;
pub mod dns_packet;
pub mod message;
pub mod name;

pub use self::dns_entities::{
    DnsHeader, DnsMessage, DnsQuestion, Node, RecordType, RecordValue, ResourceRecord,
    UnknownRecordType,
};
pub use self::message::{decode_message, encode_query};
