use bytes::{BufMut, BytesMut};

use crate::buf::*;
use crate::dns::dns_packet::DnsPacket;
use crate::error::{Error, Result};

/// RFC1035 2.3.4 size limits
pub const MAX_LABEL_LENGTH: usize = 63;
pub const MAX_NAME_LENGTH: usize = 255;

/// Upper bound on compression pointers followed for a single name. Replies are
/// untrusted, so a pointer cycle ends in `MalformedMessage` rather than a hang.
pub const MAX_POINTER_JUMPS: usize = 32;

const POINTER_MASK: u8 = 0b1100_0000;

pub struct DnsName;

impl DnsName {
    ///Writes `name` as length-prefixed labels terminated by the root label.
    ///Empty labels (leading, trailing or doubled dots) are skipped.
    pub fn write(name: &str, buf: &mut BytesMut) -> Result<()> {
        let labels = name
            .split('.')
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>();

        let mut encoded_len = 1;
        for label in &labels {
            if label.len() > MAX_LABEL_LENGTH {
                return Err(Error::Encoding(format!(
                    "label {:?} in {:?} is longer than {} octets",
                    label, name, MAX_LABEL_LENGTH
                )));
            }
            if let Some(byte) = label.bytes().find(|b| !b.is_ascii_graphic()) {
                return Err(Error::Encoding(format!(
                    "label {:?} in {:?} contains byte {:#04x}",
                    label, name, byte
                )));
            }
            encoded_len += label.len() + 1;
        }
        if encoded_len > MAX_NAME_LENGTH {
            return Err(Error::Encoding(format!(
                "{:?} encodes to {} octets, the limit is {}",
                name, encoded_len, MAX_NAME_LENGTH
            )));
        }

        for label in labels {
            buf.put_u8(label.len() as u8);
            buf.put_slice(label.as_bytes());
        }
        buf.put_u8(0);
        Ok(())
    }

    ///Reads a possibly compressed name and strips the trailing separator.
    pub fn parse(packet: &mut DnsPacket<'_>) -> Result<String> {
        let mut name = Self::decompress(packet)?;
        name.pop();
        Ok(name)
    }

    ///Reads a name starting at the packet position, following compression pointers
    ///into the whole message. Every label is followed by a `.`, so the root name is
    ///the empty string and `example` is `"example."`.
    ///
    ///The packet is left after the terminating root label or after the first
    ///pointer, whichever ends the name in the stream.
    pub fn decompress(packet: &mut DnsPacket<'_>) -> Result<String> {
        let message = packet.message();
        let mut name = String::new();
        let mut cursor = packet.pos();
        let mut resume_at = None;
        let mut jumps = 0;

        loop {
            let len = *message
                .get(cursor)
                .ok_or_else(|| Error::malformed(format!("name runs past end at {}", cursor)))?;

            match len & POINTER_MASK {
                0 if len == 0 => {
                    cursor += 1;
                    break;
                }
                0 => {
                    let start = cursor + 1;
                    let label = message.get(start..start + len as usize).ok_or_else(|| {
                        Error::malformed(format!("label of {} octets runs past end at {}", len, start))
                    })?;
                    name.push_str(&String::from_utf8_lossy(label));
                    name.push('.');
                    if name.len() > MAX_NAME_LENGTH {
                        return Err(Error::malformed(format!(
                            "name exceeds {} octets",
                            MAX_NAME_LENGTH
                        )));
                    }
                    cursor = start + len as usize;
                }
                POINTER_MASK => {
                    let low = *message.get(cursor + 1).ok_or_else(|| {
                        Error::malformed(format!("pointer runs past end at {}", cursor))
                    })?;
                    let offset = (((len & !POINTER_MASK) as usize) << 8) | low as usize;
                    jumps += 1;
                    if jumps > MAX_POINTER_JUMPS {
                        return Err(Error::malformed(format!(
                            "more than {} compression pointers in one name",
                            MAX_POINTER_JUMPS
                        )));
                    }
                    trace!("Following pointer at {} to {}", cursor, offset);
                    resume_at.get_or_insert(cursor + 2);
                    cursor = offset;
                }
                _ => {
                    return Err(Error::malformed(format!(
                        "reserved label type {:#04x} at {}",
                        len, cursor
                    )))
                }
            }
        }

        packet.seek(resume_at.unwrap_or(cursor));
        Ok(name)
    }
}
