//! Ring buffer for codecs whose window is a fixed hardware buffer.
//!
//! The Rocket decompressor on the console runs over a 0x400-byte ring that
//! starts out filled with spaces, and match offsets are stored as absolute
//! positions inside that ring.  Mirroring the decoded output into the same
//! structure reproduces those semantics without any offset rebasing.

use num_traits::PrimInt;

pub struct RingBuffer<T: PrimInt> {
    buf: Vec<T>,
    pos: usize,
    n: usize
}

impl <T: PrimInt> RingBuffer<T> {
    pub fn create(fill: T,n: usize) -> Self {
        Self {
            buf: vec![fill;n],
            pos: 0,
            n
        }
    }
    /// absolute position of the cursor
    pub fn get_pos(&self) -> usize {
        self.pos
    }
    /// set absolute position of the cursor
    pub fn set_pos(&mut self,pos: usize) {
        self.pos = pos % self.n;
    }
    /// value at an absolute position, any integer is a valid position
    pub fn get_abs(&self,abs: usize) -> T {
        self.buf[abs % self.n]
    }
    /// write `val` at the cursor and advance the cursor by 1
    pub fn put(&mut self,val: T) {
        self.buf[self.pos] = val;
        self.pos = (self.pos + 1) % self.n;
    }
}

#[test]
fn wraparound() {
    let mut ring: RingBuffer<u8> = RingBuffer::create(0x20,4);
    ring.set_pos(3);
    ring.put(1);
    ring.put(2);
    assert_eq!(ring.get_pos(),1);
    assert_eq!(ring.get_abs(3),1);
    assert_eq!(ring.get_abs(4),2);
    assert_eq!(ring.get_abs(1),0x20);
}

#[test]
fn prefill() {
    let ring: RingBuffer<u8> = RingBuffer::create(0x20,0x400);
    assert_eq!(ring.get_abs(0x3ff),0x20);
    assert_eq!(ring.get_abs(0x1234),0x20);
}
