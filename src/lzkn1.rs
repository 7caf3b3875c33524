//! LZKN1 compression
//!
//! Konami's LZSS variant, seen in several of their Mega Drive titles.  A
//! 16-bit big-endian uncompressed size leads the stream; after that, an
//! 8-bit descriptor field consumed low bit first flags literals against
//! everything else.  The first payload byte picks the token: `0x1F` ends
//! the stream, `0xC0..` runs a packed block of literals, `0x80..0xBF` is a
//! one-byte match with a 4-bit distance, and anything under `0x80` starts
//! a two-byte match with a 10-bit distance.  The terminator byte aliases a
//! one-byte match, so it must be tested first when decoding.

use log::warn;
use crate::lzss::{self,Edge,LzssFormat,Window,DescriptorSpec,LzssReader,LzssWriter};
use crate::byteio::{self,ByteReader};
use crate::Error;

const DESC: DescriptorSpec = DescriptorSpec {
    width: 8,
    little_endian_bytes: false,
    little_endian_bits: true,
    early_fetch: false
};

const EOF_MARKER: u8 = 0x1F;
const PACKED_MARKER: u8 = 0xC0;
const SHORT_MARKER: u8 = 0x80;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Kind {
    Symbolwise,
    Short,
    Long,
    Packed
}

struct Lzkn1;

impl LzssFormat for Lzkn1 {
    type Symbol = u8;
    type Kind = Kind;
    const SYMBOLWISE: Kind = Kind::Symbolwise;
    const NUM_DESC_BITS: u32 = 8;
    const NUM_TERM_BITS: u32 = 1;
    const TERMINATOR_WEIGHT: u32 = 1 + 8;
    const NEED_EARLY_DESCRIPTOR: bool = false;
    const FIRST_MATCH_POSITION: usize = 0;
    const LOOK_AHEAD_BUF_SIZE: usize = 33;
    fn windows() -> &'static [Window<Kind>] {
        &[
            Window { search_buf: 15, min_len: 2, look_ahead: 5, kind: Kind::Short },
            Window { search_buf: 1023, min_len: 3, look_ahead: 33, kind: Kind::Long }
        ]
    }
    fn desc_bits(_kind: Kind) -> u32 {
        1
    }
    fn edge_weight(kind: Kind,length: usize) -> u32 {
        match kind {
            // 8-bit value
            Kind::Symbolwise => 1 + 8,
            // 2-bit marker, 2-bit length, 4-bit distance
            Kind::Short => 1 + 2 + 2 + 4,
            // 1-bit marker, 5-bit length, 10-bit distance
            Kind::Long => 1 + 1 + 5 + 10,
            // 2-bit marker, 6-bit length, the literals themselves
            Kind::Packed => 1 + 2 + 6 + 8 * length as u32
        }
    }
    fn extra_matches(_data: &[u8],base: usize,ubound: usize,_lbound: usize,
                     matches: &mut Vec<Edge<Kind,u8>>) -> bool {
        // packed literal blocks, usable wherever the look-ahead allows
        let end = usize::min(ubound - base,72);
        for len in 8..end {
            matches.push(Edge { pos: base, kind: Kind::Packed, distance: lzss::NO_DISTANCE, length: len, symbol: 0 });
        }
        false
    }
}

/// Main compression function
pub fn encode(data: &[u8]) -> Vec<u8> {
    encode_with_padding(data,7)
}

pub(crate) fn encode_with_padding(data: &[u8],pad_mask: u32) -> Vec<u8> {
    let parse = lzss::find_optimal_parse::<Lzkn1>(data,pad_mask);
    let mut header = Vec::new();
    byteio::write2_be(&mut header,data.len() as u16);
    let mut out = LzssWriter::create(DESC);
    for edge in parse.iter() {
        match edge.kind {
            Kind::Symbolwise => {
                out.descbit(0);
                out.putbyte(edge.symbol);
            },
            Kind::Packed => {
                out.descbit(1);
                out.putbyte(PACKED_MARKER + (edge.length - 8) as u8);
                for i in 0..edge.length {
                    out.putbyte(data[edge.pos + i]);
                }
            },
            Kind::Short => {
                out.descbit(1);
                out.putbyte((((edge.length + 6) << 4) | edge.distance) as u8);
            },
            Kind::Long => {
                out.descbit(1);
                out.putbyte(((edge.length - 3) | ((edge.distance & 0x300) >> 3)) as u8);
                out.putbyte(edge.distance as u8);
            }
        }
    }
    out.descbit(1);
    out.putbyte(EOF_MARKER);
    header.extend(out.finish());
    header
}

/// Main decompression function
pub fn decode(data: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = ByteReader::new(data);
    let mut out = Vec::new();
    decode_stream(&mut src,&mut out)?;
    Ok(out)
}

pub(crate) fn decode_stream(src: &mut ByteReader,out: &mut Vec<u8>) -> Result<(),Error> {
    let size = src.read2_be()? as usize;
    let start = out.len();
    let mut bits = LzssReader::create(DESC,src);
    loop {
        if bits.descbit()? == 0 {
            let b = bits.getbyte()?;
            out.push(b);
            continue;
        }
        let data = bits.getbyte()?;
        // the terminator aliases a short match, test it first
        if data == EOF_MARKER {
            break;
        }
        if (data & PACKED_MARKER) == PACKED_MARKER {
            let count = (data - PACKED_MARKER) as usize + 8;
            for _i in 0..count {
                let b = bits.getbyte()?;
                out.push(b);
            }
            continue;
        }
        let count;
        let distance;
        if (data & SHORT_MARKER) == SHORT_MARKER {
            distance = (data & 0x0F) as usize;
            count = (data >> 4) as usize - 6;
        } else {
            let low = bits.getbyte()? as usize;
            distance = (((data as usize) << 3) & 0x300) | low;
            count = (data & 0x1F) as usize + 3;
        }
        if distance == 0 || distance > out.len() - start {
            return Err(Error::Malformed("lzkn1 match reaches before the output"));
        }
        for _i in 0..count {
            let p = out.len() - distance;
            let b = out[p];
            out.push(b);
        }
    }
    let written = out.len() - start;
    if written != size {
        warn!("lzkn1 stream expanded to {} bytes, header said {}",written,size);
        return Err(Error::SizeMismatch { expected: size, actual: written });
    }
    Ok(())
}

#[test]
fn compression_works() {
    // single literal
    assert_eq!(encode(&[0x42]),hex::decode("000102421f").unwrap());
    // literal plus a short match
    assert_eq!(encode(&[0xAA;5]),hex::decode("000506aaa11f").unwrap());
    // a packed literal block takes over for long incompressible stretches
    let data: Vec<u8> = (0x10..0x20).collect();
    let mut expected = hex::decode("001005c7").unwrap();
    expected.extend(0x10..0x1F);
    expected.extend([0x1F,0x1F]);
    assert_eq!(encode(&data),expected);
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("000102421f").unwrap()).unwrap(),vec![0x42]);
    assert_eq!(decode(&hex::decode("000506aaa11f").unwrap()).unwrap(),vec![0xAA;5]);
}

#[test]
fn size_mismatch_is_an_error() {
    // header claims 2 bytes but the stream expands to 1
    let result = decode(&hex::decode("000202421f").unwrap());
    assert_eq!(result,Err(Error::SizeMismatch { expected: 2, actual: 1 }));
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x42],
        vec![0x00;1024],
        (0..=255u8).collect(),
        (0..=255u8).cycle().take(3000).collect(),
        b"and they compressed happily ever after".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn long_match_distances_round_trip() {
    // force matches near the 10-bit distance limit
    let mut data: Vec<u8> = b"prelude block".to_vec();
    data.extend((0..=255u8).cycle().take(1000));
    data.extend_from_slice(b"prelude block");
    let compressed = encode(&data);
    assert_eq!(decode(&compressed).unwrap(),data);
}
