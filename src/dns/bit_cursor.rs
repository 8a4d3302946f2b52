///
///A Left-To-Right `BitCursor` for reading and writing the bits of a 16 bit word
///
#[derive(Debug, Default)]
pub struct BitCursor {
    bits: u16,
    pos: u32,
}

impl BitCursor {
    pub fn new_with(bits: u16) -> BitCursor {
        BitCursor { bits, pos: 0 }
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn next_bool(&mut self) -> bool {
        self.read_and_advance(1) == 1
    }

    pub fn next_u3(&mut self) -> u8 {
        self.read_and_advance(3) as u8
    }

    pub fn next_u4(&mut self) -> u8 {
        self.read_and_advance(4) as u8
    }

    pub fn write_bool(&mut self, bit: bool) -> bool {
        self.write_and_advance(1, bit as u16)
    }

    pub fn write_u3(&mut self, val: u8) -> bool {
        self.write_and_advance(3, val as u16)
    }

    pub fn write_u4(&mut self, val: u8) -> bool {
        self.write_and_advance(4, val as u16)
    }

    fn read_and_advance(&mut self, count: u32) -> u16 {
        if self.pos + count > 16 {
            warn!("Read of {} bits past end of word at {}", count, self.pos);
            return 0;
        }
        let shift = 16 - self.pos - count;
        let result = (self.bits >> shift) & Self::mask(count);
        trace!("{:016b} - bits, {:?} read at {}", self.bits, result, self.pos);
        self.pos += count;
        result
    }

    fn write_and_advance(&mut self, count: u32, val: u16) -> bool {
        if self.pos + count > 16 {
            return false;
        }
        let shift = 16 - self.pos - count;
        self.bits |= (val & Self::mask(count)) << shift;
        self.pos += count;
        true
    }

    //
    // Returns a mask to read that many bits. E.g.
    // 0000 0000 0000 0001 to read 1 bit
    // 0000 0000 0000 1111 to read 4 bits
    //
    fn mask(count: u32) -> u16 {
        match count {
            0 => 0,
            16.. => u16::MAX,
            n => (1 << n) - 1,
        }
    }
}
