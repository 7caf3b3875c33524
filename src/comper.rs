//! Comper compression
//!
//! Comper works on big-endian 16-bit words rather than bytes, which is what
//! makes its decompressor so fast on the 68000: every copy is a word move.
//! Tokens are flagged one bit at a time from a big-endian 16-bit descriptor
//! field, high bit first.  A literal is the word itself; a match stores a
//! negated word distance and a length byte.  The length byte 0 doubles as
//! the end-of-stream marker.
//!
//! A distance byte of 0 means 256 words (512 bytes) back; the reference
//! decompressor relies on this wrap and so do we.

use crate::lzss::{self,LzssFormat,Window,DescriptorSpec,LzssReader,LzssWriter};
use crate::byteio::ByteReader;
use crate::Error;

const DESC: DescriptorSpec = DescriptorSpec {
    width: 16,
    little_endian_bytes: false,
    little_endian_bits: false,
    early_fetch: false
};

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Kind {
    Symbolwise,
    Dictionary
}

struct Comper;

impl LzssFormat for Comper {
    type Symbol = u16;
    type Kind = Kind;
    const SYMBOLWISE: Kind = Kind::Symbolwise;
    const NUM_DESC_BITS: u32 = 16;
    const NUM_TERM_BITS: u32 = 1;
    const TERMINATOR_WEIGHT: u32 = 1 + 2 * 8;
    const NEED_EARLY_DESCRIPTOR: bool = false;
    const FIRST_MATCH_POSITION: usize = 0;
    const LOOK_AHEAD_BUF_SIZE: usize = 256;
    fn windows() -> &'static [Window<Kind>] {
        &[Window { search_buf: 256, min_len: 2, look_ahead: 256, kind: Kind::Dictionary }]
    }
    fn desc_bits(_kind: Kind) -> u32 {
        1
    }
    fn edge_weight(kind: Kind,_length: usize) -> u32 {
        match kind {
            // 16-bit word
            Kind::Symbolwise => 1 + 16,
            // 8-bit distance, 8-bit length
            Kind::Dictionary => 1 + 8 + 8
        }
    }
}

/// group the input into big-endian words, padding an odd tail with zero
fn to_words(data: &[u8]) -> Vec<u16> {
    let mut words: Vec<u16> = data.chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0],pair[1]]))
        .collect();
    if data.len() % 2 != 0 {
        words.push(u16::from_be_bytes([data[data.len()-1],0]));
    }
    words
}

/// Main compression function.  An odd-length input is zero-padded to a
/// whole number of words first.
pub fn encode(data: &[u8]) -> Vec<u8> {
    encode_with_padding(data,7)
}

pub(crate) fn encode_with_padding(data: &[u8],pad_mask: u32) -> Vec<u8> {
    let words = to_words(data);
    let parse = lzss::find_optimal_parse::<Comper>(&words,pad_mask);
    let mut out = LzssWriter::create(DESC);
    for edge in parse.iter() {
        match edge.kind {
            Kind::Symbolwise => {
                out.descbit(0);
                out.putbyte((edge.symbol >> 8) as u8);
                out.putbyte(edge.symbol as u8);
            },
            Kind::Dictionary => {
                out.descbit(1);
                out.putbyte((0x100 - edge.distance) as u8);
                out.putbyte((edge.length - 1) as u8);
            }
        }
    }
    out.descbit(1);
    out.putbyte(0);
    out.putbyte(0);
    out.finish()
}

/// Main decompression function
pub fn decode(data: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = ByteReader::new(data);
    let mut out = Vec::new();
    decode_stream(&mut src,&mut out)?;
    Ok(out)
}

pub(crate) fn decode_stream(src: &mut ByteReader,out: &mut Vec<u8>) -> Result<(),Error> {
    let start = out.len();
    let mut bits = LzssReader::create(DESC,src);
    loop {
        if bits.descbit()? == 0 {
            // literal word
            let hi = bits.getbyte()?;
            let lo = bits.getbyte()?;
            out.push(hi);
            out.push(lo);
        } else {
            let raw_dist = bits.getbyte()?;
            let raw_len = bits.getbyte()?;
            if raw_len == 0 {
                break;
            }
            // distance byte 0 wraps to a full 256 words back
            let distance = (0x100 - raw_dist as usize) * 2;
            if distance > out.len() - start {
                return Err(Error::Malformed("comper match reaches before the output"));
            }
            for _i in 0..=raw_len {
                let p = out.len() - distance;
                let hi = out[p];
                let lo = out[p+1];
                out.push(hi);
                out.push(lo);
            }
        }
    }
    Ok(())
}

#[test]
fn compression_works() {
    // one literal word then the terminator
    assert_eq!(encode(&[0x12,0x34]),hex::decode("400012340000").unwrap());
    // empty input is just the terminator
    assert_eq!(encode(&[]),hex::decode("80000000").unwrap());
    // a repeated word becomes one distance-1 match
    assert_eq!(encode(&[0x12,0x34,0x12,0x34,0x12,0x34]),hex::decode("60001234ff010000").unwrap());
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("400012340000").unwrap()).unwrap(),vec![0x12,0x34]);
    assert_eq!(decode(&hex::decode("80000000").unwrap()).unwrap(),Vec::<u8>::new());
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x12,0x34],
        vec![0xAA;64],
        vec![0x00;512],
        (0u16..256).flat_map(|w| w.to_be_bytes()).collect(),
        b"I am Sam. Sam I am. I do not like this Sam I am.".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn wrap_distance_round_trips() {
    // force a 2-word match 256 words back: a word pair, 254 distinct
    // filler words, then the same pair again
    let mut data: Vec<u8> = vec![0x12,0x34,0x56,0x78];
    for i in 0..254u16 {
        data.extend((i + 0x4000).to_be_bytes());
    }
    data.extend([0x12,0x34,0x56,0x78]);
    let compressed = encode(&data);
    let expanded = decode(&compressed).expect("expansion failed");
    assert_eq!(expanded,data);
}

#[test]
fn truncated_stream_is_an_error() {
    assert_eq!(decode(&[0x40,0x00,0x12]),Err(Error::Truncated));
    assert_eq!(decode(&[]),Err(Error::Truncated));
}
