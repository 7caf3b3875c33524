//! Rocket compression
//!
//! Used by Rocket Knight Adventures.  The game decompresses through a
//! 0x400-byte ring buffer that starts out filled with spaces, with the
//! write cursor at 0x3C0, and match tokens store the absolute ring
//! position of their source.  The compressor reproduces this by treating
//! a 0x3C0-byte run of 0x20 as a virtual prefix of the input, so early
//! matches can copy spaces that were never part of the user data.  There
//! is no end-of-stream marker; the header carries the decompressed and
//! compressed sizes as big-endian words.

use crate::lzss::{self,LzssFormat,Window,DescriptorSpec,LzssReader,LzssWriter};
use crate::byteio::{self,ByteReader};
use crate::tools::ring_buffer::RingBuffer;
use crate::Error;

const DESC: DescriptorSpec = DescriptorSpec {
    width: 8,
    little_endian_bytes: false,
    little_endian_bits: true,
    early_fetch: false
};

/// size of the console-side ring buffer
const RING_SIZE: usize = 0x400;
/// where the write cursor starts inside the ring
const PREFILL: usize = 0x3C0;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Kind {
    Symbolwise,
    Dictionary
}

struct Rocket;

impl LzssFormat for Rocket {
    type Symbol = u8;
    type Kind = Kind;
    const SYMBOLWISE: Kind = Kind::Symbolwise;
    const NUM_DESC_BITS: u32 = 8;
    const NUM_TERM_BITS: u32 = 0;
    const TERMINATOR_WEIGHT: u32 = 0;
    const NEED_EARLY_DESCRIPTOR: bool = false;
    const FIRST_MATCH_POSITION: usize = PREFILL;
    const LOOK_AHEAD_BUF_SIZE: usize = 0x40;
    fn windows() -> &'static [Window<Kind>] {
        &[Window { search_buf: RING_SIZE, min_len: 2, look_ahead: 0x40, kind: Kind::Dictionary }]
    }
    fn desc_bits(_kind: Kind) -> u32 {
        1
    }
    fn edge_weight(kind: Kind,_length: usize) -> u32 {
        match kind {
            // 8-bit value
            Kind::Symbolwise => 1 + 8,
            // 6-bit length, 10-bit ring position
            Kind::Dictionary => 1 + 6 + 10
        }
    }
}

/// Main compression function
pub fn encode(data: &[u8]) -> Vec<u8> {
    encode_with_padding(data,7)
}

pub(crate) fn encode_with_padding(data: &[u8],pad_mask: u32) -> Vec<u8> {
    // the virtual space prefix is part of the encoder's view but not of
    // the output
    let mut buf = vec![0x20u8;PREFILL];
    buf.extend_from_slice(data);
    let parse = lzss::find_optimal_parse::<Rocket>(&buf,pad_mask);
    let mut body = LzssWriter::create(DESC);
    for edge in parse.iter() {
        match edge.kind {
            Kind::Symbolwise => {
                body.descbit(1);
                body.putbyte(edge.symbol);
            },
            Kind::Dictionary => {
                let pos = (edge.pos - edge.distance) % RING_SIZE;
                body.descbit(0);
                body.putbyte((((edge.length - 1) << 2) | (pos >> 8)) as u8);
                body.putbyte(pos as u8);
            }
        }
    }
    let body = body.finish();
    let mut out = Vec::new();
    byteio::write2_be(&mut out,data.len() as u16);
    byteio::write2_be(&mut out,body.len() as u16);
    out.extend(body);
    out
}

/// Main decompression function
pub fn decode(data: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = ByteReader::new(data);
    let mut out = Vec::new();
    decode_stream(&mut src,&mut out)?;
    Ok(out)
}

pub(crate) fn decode_stream(src: &mut ByteReader,out: &mut Vec<u8>) -> Result<(),Error> {
    let _uncompressed = src.read2_be()?;
    let compressed = src.read2_be()? as usize;
    let end = src.position() + compressed;
    let mut bits = LzssReader::create(DESC,src);
    let mut ring: RingBuffer<u8> = RingBuffer::create(0x20,RING_SIZE);
    ring.set_pos(PREFILL);
    while bits.position() < end {
        if bits.descbit()? != 0 {
            let b = bits.getbyte()?;
            out.push(b);
            ring.put(b);
        } else {
            let hi = bits.getbyte()? as usize;
            let lo = bits.getbyte()? as usize;
            let length = ((hi & 0xFC) >> 2) + 1;
            let pos = ((hi & 3) << 8) | lo;
            for i in 0..length {
                let b = ring.get_abs(pos + i);
                out.push(b);
                ring.put(b);
            }
        }
    }
    Ok(())
}

#[test]
fn compression_works() {
    // 64 spaces copy straight out of the pre-filled ring
    assert_eq!(encode(&[0x20;0x40]),hex::decode("0040000300ffbf").unwrap());
    // a lone non-space byte has nothing to match
    assert_eq!(encode(&[0x41]),hex::decode("000100020141").unwrap());
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("0040000300ffbf").unwrap()).unwrap(),vec![0x20;0x40]);
    assert_eq!(decode(&hex::decode("000100020141").unwrap()).unwrap(),vec![0x41]);
}

#[test]
fn prefill_matches_mix_with_data() {
    // spaces at the start come from the ring prefix even when the real
    // data hasn't produced any yet
    let mut data = vec![0x20;10];
    data.extend_from_slice(b"rocket knight");
    data.extend(vec![0x20;30]);
    data.extend_from_slice(b"rocket knight");
    let compressed = encode(&data);
    assert_eq!(decode(&compressed).unwrap(),data);
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x20],
        vec![0x41;100],
        (0..=255u8).cycle().take(2000).collect(),
        b"opposed to fortune's wheel, the knight rides on".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn truncated_header_is_an_error() {
    assert_eq!(decode(&[0x00]),Err(Error::Truncated));
}
