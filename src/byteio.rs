//! Byte-level reading and writing for the codec modules.
//!
//! Compressed streams mix big- and little-endian fields, sometimes within
//! the same header, so the helpers here are explicit about byte order.
//! The reader borrows the input slice and keeps a cursor so that a codec
//! can consume exactly its share of a larger stream (the moduled container
//! depends on this to find the next chunk).

use crate::Error;

/// Cursor over a borrowed byte slice.  All reads advance the cursor and
/// fail with `Error::Truncated` past the end.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize
}

impl <'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
    pub fn read1(&mut self) -> Result<u8,Error> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            },
            None => Err(Error::Truncated)
        }
    }
    pub fn read2_be(&mut self) -> Result<u16,Error> {
        let hi = self.read1()?;
        let lo = self.read1()?;
        Ok(u16::from_be_bytes([hi,lo]))
    }
    pub fn read2_le(&mut self) -> Result<u16,Error> {
        let lo = self.read1()?;
        let hi = self.read1()?;
        Ok(u16::from_le_bytes([lo,hi]))
    }
    /// cursor position from the start of the slice
    pub fn position(&self) -> usize {
        self.pos
    }
    /// move the cursor, clamping is not allowed, past-the-end is
    pub fn set_position(&mut self,pos: usize) -> Result<(),Error> {
        if pos > self.data.len() {
            return Err(Error::Truncated);
        }
        self.pos = pos;
        Ok(())
    }
    /// skip `count` bytes
    pub fn advance(&mut self,count: usize) -> Result<(),Error> {
        self.set_position(self.pos + count)
    }
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
    /// everything from the cursor to the end, cursor does not move
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

pub fn write2_be(out: &mut Vec<u8>,val: u16) {
    out.extend_from_slice(&u16::to_be_bytes(val));
}

pub fn write2_le(out: &mut Vec<u8>,val: u16) {
    out.extend_from_slice(&u16::to_le_bytes(val));
}

#[test]
fn reads() {
    let mut r = ByteReader::new(&[0x12,0x34,0x56,0x78]);
    assert_eq!(r.read2_be().unwrap(),0x1234);
    assert_eq!(r.read2_le().unwrap(),0x7856);
    assert_eq!(r.read1(),Err(Error::Truncated));
}

#[test]
fn positioning() {
    let mut r = ByteReader::new(&[1,2,3,4]);
    r.advance(3).unwrap();
    assert_eq!(r.remaining(),1);
    assert_eq!(r.remaining_slice(),&[4]);
    assert!(r.advance(2).is_err());
    r.set_position(4).unwrap();
    assert!(r.at_end());
}
