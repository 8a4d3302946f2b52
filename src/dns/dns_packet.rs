use crate::buf::*;

///Read-only cursor over a received datagram providing seek, next etc.
#[derive(Debug, Clone, Copy)]
pub struct DnsPacket<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl DirectAccessBuf for DnsPacket<'_> {
    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn len(&self) -> usize {
        self.buf.len()
    }
}

impl BufRead for DnsPacket<'_> {
    fn buf(&self) -> &[u8] {
        self.buf
    }
}

impl<'a> DnsPacket<'a> {
    pub fn new(buf: &'a [u8]) -> DnsPacket<'a> {
        DnsPacket::new_at(buf, 0)
    }

    pub fn new_at(buf: &'a [u8], pos: usize) -> DnsPacket<'a> {
        DnsPacket { buf, pos }
    }

    ///The whole datagram, independent of the cursor. Compression pointers are offsets into this.
    pub fn message(&self) -> &'a [u8] {
        self.buf
    }
}
