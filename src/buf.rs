use crate::error::{Error, Result};

pub trait DirectAccessBuf {
    fn pos(&self) -> usize;
    fn set_pos(&mut self, pos: usize);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn seek(&mut self, pos: usize) -> bool {
        if pos > self.len() {
            return false;
        }
        self.set_pos(pos);
        true
    }

    fn advance(&mut self, count: usize) -> bool {
        let new_pos = self.pos() + count;
        self.seek(new_pos)
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.pos())
    }
}

///Big-endian reads that fail with `MalformedMessage` instead of running off the end.
///Position is left unchanged when a read fails.
pub trait BufRead: DirectAccessBuf {
    fn buf(&self) -> &[u8];

    fn peek_u8(&self) -> Option<u8> {
        self.buf().get(self.pos()).copied()
    }

    fn next_u8(&mut self) -> Result<u8> {
        let byte = self
            .peek_u8()
            .ok_or_else(|| Error::malformed(format!("message ends before u8 at {}", self.pos())))?;
        self.advance(1);
        Ok(byte)
    }

    fn next_u16(&mut self) -> Result<u16> {
        let bytes = self.next_array::<2>()?;
        Ok(u16::from_be_bytes(bytes))
    }

    fn next_u32(&mut self) -> Result<u32> {
        let bytes = self.next_array::<4>()?;
        Ok(u32::from_be_bytes(bytes))
    }

    fn next_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let pos = self.pos();
        let bytes = self
            .buf()
            .get(pos..pos + count)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                Error::malformed(format!("message ends before {} bytes at {}", count, pos))
            })?;
        self.advance(count);
        Ok(bytes)
    }

    fn next_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let pos = self.pos();
        let mut out = [0; N];
        match self.buf().get(pos..pos + N) {
            Some(bytes) => out.copy_from_slice(bytes),
            None => {
                return Err(Error::malformed(format!(
                    "message ends before {} bytes at {}",
                    N, pos
                )))
            }
        }
        self.advance(N);
        Ok(out)
    }
}
