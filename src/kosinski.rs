//! Kosinski compression
//!
//! The workhorse format of the classic Sonic engines, named for Brett
//! Kosinski.  Descriptor fields are 16-bit words stored little-endian with
//! bits consumed from the low end.  The decompressor fetches a fresh field
//! the moment the old one is spent, so when the end-of-stream marker lands
//! exactly on a field boundary the compressor owes a dummy all-zero field
//! before the marker's payload.
//!
//! Three match encodings share the two-bit `0x` prefixes: a one-byte form
//! for short nearby matches (its two length bits ride in the descriptor
//! field), a two-byte form for lengths up to 9, and a three-byte form whose
//! extra length byte doubles as the end-of-stream marker when zero.

use crate::lzss::{self,LzssFormat,Window,DescriptorSpec,LzssReader,LzssWriter};
use crate::byteio::ByteReader;
use crate::Error;

const DESC: DescriptorSpec = DescriptorSpec {
    width: 16,
    little_endian_bytes: true,
    little_endian_bits: true,
    early_fetch: true
};

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Kind {
    Symbolwise,
    Inline,
    Short,
    Long
}

struct Kosinski;

impl LzssFormat for Kosinski {
    type Symbol = u8;
    type Kind = Kind;
    const SYMBOLWISE: Kind = Kind::Symbolwise;
    const NUM_DESC_BITS: u32 = 16;
    const NUM_TERM_BITS: u32 = 2;
    const TERMINATOR_WEIGHT: u32 = 2 + 3 * 8;
    const NEED_EARLY_DESCRIPTOR: bool = true;
    const FIRST_MATCH_POSITION: usize = 0;
    const LOOK_AHEAD_BUF_SIZE: usize = 256;
    fn windows() -> &'static [Window<Kind>] {
        &[
            Window { search_buf: 256, min_len: 2, look_ahead: 5, kind: Kind::Inline },
            Window { search_buf: 8192, min_len: 3, look_ahead: 9, kind: Kind::Short },
            Window { search_buf: 8192, min_len: 10, look_ahead: 256, kind: Kind::Long }
        ]
    }
    fn desc_bits(kind: Kind) -> u32 {
        match kind {
            Kind::Symbolwise => 1,
            // 2-bit prefix plus the 2-bit length count
            Kind::Inline => 2 + 2,
            Kind::Short | Kind::Long => 2
        }
    }
    fn edge_weight(kind: Kind,_length: usize) -> u32 {
        match kind {
            // 8-bit value
            Kind::Symbolwise => 1 + 8,
            // 8-bit distance
            Kind::Inline => 2 + 2 + 8,
            // 13-bit distance, 3-bit length
            Kind::Short => 2 + 13 + 3,
            // 13-bit distance, 3-bit marker, 8-bit length
            Kind::Long => 2 + 13 + 3 + 8
        }
    }
}

/// Main compression function
pub fn encode(data: &[u8]) -> Vec<u8> {
    encode_with_padding(data,7)
}

pub(crate) fn encode_with_padding(data: &[u8],pad_mask: u32) -> Vec<u8> {
    let parse = lzss::find_optimal_parse::<Kosinski>(data,pad_mask);
    let mut out = LzssWriter::create(DESC);
    for edge in parse.iter() {
        match edge.kind {
            Kind::Symbolwise => {
                out.descbit(1);
                out.putbyte(edge.symbol);
            },
            Kind::Inline => {
                let len = edge.length - 2;
                out.descbit(0);
                out.descbit(0);
                out.descbit((len >> 1) as u32 & 1);
                out.descbit(len as u32 & 1);
                out.putbyte((0x100 - edge.distance) as u8);
            },
            Kind::Short => {
                let base = 0x2000 - edge.distance;
                out.descbit(0);
                out.descbit(1);
                out.putbyte(base as u8);
                out.putbyte((((base >> 5) & 0xF8) | (edge.length - 2)) as u8);
            },
            Kind::Long => {
                let base = 0x2000 - edge.distance;
                out.descbit(0);
                out.descbit(1);
                out.putbyte(base as u8);
                out.putbyte(((base >> 5) & 0xF8) as u8);
                out.putbyte((edge.length - 1) as u8);
            }
        }
    }
    out.descbit(0);
    out.descbit(1);
    out.putbyte(0x00);
    out.putbyte(0xF0);
    out.putbyte(0x00);
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
    let mut bits = LzssReader::create(DESC,src);
    loop {
        if bits.descbit()? != 0 {
            let b = bits.getbyte()?;
            out.push(b);
            continue;
        }
        let count;
        let distance;
        if bits.descbit()? != 0 {
            let lo = bits.getbyte()? as usize;
            let hi = bits.getbyte()? as usize;
            distance = 0x2000 - (((hi & 0xF8) << 5) | lo);
            let c = hi & 0x07;
            if c != 0 {
                count = c + 2;
            } else {
                let c = bits.getbyte()? as usize;
                if c == 0 {
                    break;
                }
                if c == 1 {
                    // dummy token, nothing to copy
                    continue;
                }
                count = c + 1;
            }
        } else {
            let hi = bits.descbit()?;
            let lo = bits.descbit()?;
            count = (hi * 2 + lo) as usize + 2;
            distance = 0x100 - bits.getbyte()? as usize;
        }
        if distance > out.len() {
            return Err(Error::Malformed("kosinski match reaches before the output"));
        }
        for _i in 0..count {
            let p = out.len() - distance;
            let b = out[p];
            out.push(b);
        }
    }
    Ok(())
}

#[test]
fn compression_works() {
    // one literal, then the terminator
    assert_eq!(encode(&[0xAB]),hex::decode("0500ab00f000").unwrap());
    // literal plus a 15-byte three-byte match
    assert_eq!(encode(&[0x00;16]),hex::decode("150000fff80e00f000").unwrap());
}

#[test]
fn dummy_descriptor_on_exact_boundary() {
    // 14 literals plus the 2 terminator bits fill the field exactly, which
    // forces a dummy all-zero field before the terminator bytes
    let data: Vec<u8> = (1..=14).collect();
    let mut expected = hex::decode("ffbf").unwrap();
    expected.extend(1..=14u8);
    expected.extend(hex::decode("000000f000").unwrap());
    assert_eq!(encode(&data),expected);
    assert_eq!(decode(&expected).unwrap(),data);
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("0500ab00f000").unwrap()).unwrap(),vec![0xAB]);
    assert_eq!(decode(&hex::decode("150000fff80e00f000").unwrap()).unwrap(),vec![0x00;16]);
}

#[test]
fn dummy_token_is_skipped() {
    // a three-byte match whose length byte is 1 copies nothing; some
    // shipped streams carry these as alignment filler
    let stream = hex::decode("0a00fff80100f000").unwrap();
    assert_eq!(decode(&stream).unwrap(),Vec::<u8>::new());
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0xFF],
        vec![0x00;31],
        vec![0x00;32],
        vec![0x00;33],
        vec![0x5A;4096],
        (0..=255u8).cycle().take(1000).collect(),
        b"I am Sam. Sam I am. I do not like this Sam I am.".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn long_distances_round_trip() {
    // repeat a block roughly 7900 bytes later so only the 13-bit distance
    // forms can reach it
    let mut data: Vec<u8> = b"landmark text".to_vec();
    data.extend((0..=255u8).cycle().take(7900));
    data.extend_from_slice(b"landmark text");
    let compressed = encode(&data);
    assert_eq!(decode(&compressed).unwrap(),data);
}
