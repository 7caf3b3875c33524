//! Saxman compression
//!
//! The scheme used by Sonic 2's sound driver, named for its hacker
//! discoverer.  It is a conventional 4096-byte-window LZSS with one twist:
//! match offsets are stored as absolute positions within the current
//! 0x1000-byte block (offset by 0x12), and an offset that lands at or
//! ahead of the write cursor means "emit zeroes" instead of copying.  The
//! compressor exploits this to seed runs of zeroes that were never
//! written, but only while the cursor is inside the first window's worth
//! of output.  Streams usually begin with a little-endian 16-bit size of
//! the compressed body; the game's driver knows the size out of band, so
//! the header is optional on both ends.

use crate::lzss::{self,Edge,LzssFormat,Window,DescriptorSpec,LzssReader,LzssWriter};
use crate::byteio::{self,ByteReader};
use crate::Error;

const DESC: DescriptorSpec = DescriptorSpec {
    width: 8,
    little_endian_bytes: false,
    little_endian_bits: true,
    early_fetch: false
};

const WINDOW: usize = 0x1000;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Kind {
    Symbolwise,
    Dictionary,
    Zerofill
}

struct Saxman;

impl LzssFormat for Saxman {
    type Symbol = u8;
    type Kind = Kind;
    const SYMBOLWISE: Kind = Kind::Symbolwise;
    const NUM_DESC_BITS: u32 = 8;
    const NUM_TERM_BITS: u32 = 0;
    const TERMINATOR_WEIGHT: u32 = 0;
    const NEED_EARLY_DESCRIPTOR: bool = false;
    const FIRST_MATCH_POSITION: usize = 0;
    const LOOK_AHEAD_BUF_SIZE: usize = 18;
    fn windows() -> &'static [Window<Kind>] {
        &[Window { search_buf: WINDOW, min_len: 3, look_ahead: 18, kind: Kind::Dictionary }]
    }
    fn desc_bits(_kind: Kind) -> u32 {
        1
    }
    fn edge_weight(kind: Kind,_length: usize) -> u32 {
        match kind {
            // 8-bit value
            Kind::Symbolwise => 1 + 8,
            // 12-bit offset, 4-bit length
            Kind::Dictionary | Kind::Zerofill => 1 + 12 + 4
        }
    }
    fn extra_matches(data: &[u8],base: usize,ubound: usize,_lbound: usize,
                     matches: &mut Vec<Edge<Kind,u8>>) -> bool {
        // zero fills only decode as such while the cursor is inside the
        // first block of output
        if base >= WINDOW - 1 {
            return false;
        }
        let end = ubound - base;
        let mut run = 0;
        while run < end && data[base + run] == 0 {
            run += 1;
        }
        if run >= 3 {
            for len in 3..=run {
                matches.push(Edge { pos: base, kind: Kind::Zerofill, distance: lzss::NO_DISTANCE, length: len, symbol: 0 });
            }
        }
        // when zero fills exist they stand in for this node's matches
        !matches.is_empty()
    }
}

/// Main compression function; `with_size` controls the optional header
pub fn encode(data: &[u8],with_size: bool) -> Vec<u8> {
    encode_internal(data,with_size,7)
}

pub(crate) fn encode_with_padding(data: &[u8],pad_mask: u32) -> Vec<u8> {
    encode_internal(data,true,pad_mask)
}

fn encode_internal(data: &[u8],with_size: bool,pad_mask: u32) -> Vec<u8> {
    let parse = lzss::find_optimal_parse::<Saxman>(data,pad_mask);
    let mut body = LzssWriter::create(DESC);
    for edge in parse.iter() {
        match edge.kind {
            Kind::Symbolwise => {
                body.descbit(1);
                body.putbyte(edge.symbol);
            },
            Kind::Dictionary | Kind::Zerofill => {
                // a zero fill is a match from one past the cursor, which
                // the sentinel distance yields through the wraparound
                let base = edge.pos.wrapping_sub(edge.distance).wrapping_sub(0x12) & 0xFFF;
                body.descbit(0);
                body.putbyte(base as u8);
                body.putbyte((((edge.length - 3) & 0x0F) | ((base >> 4) & 0xF0)) as u8);
            }
        }
    }
    let body = body.finish();
    let mut out = Vec::new();
    if with_size {
        byteio::write2_le(&mut out,body.len() as u16);
    }
    out.extend(body);
    out
}

/// Decompress a stream that leads with its little-endian size header
pub fn decode(data: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = ByteReader::new(data);
    let mut out = Vec::new();
    decode_stream(&mut src,&mut out,None)?;
    Ok(out)
}

/// Decompress a headerless stream of `size` compressed bytes
pub fn decode_headerless(data: &[u8],size: usize) -> Result<Vec<u8>,Error> {
    let mut src = ByteReader::new(data);
    let mut out = Vec::new();
    decode_stream(&mut src,&mut out,Some(size))?;
    Ok(out)
}

pub(crate) fn decode_stream(src: &mut ByteReader,out: &mut Vec<u8>,explicit_size: Option<usize>) -> Result<(),Error> {
    let size = match explicit_size {
        Some(s) => s,
        None => src.read2_le()? as usize
    };
    let out_start = out.len();
    let body_start = src.position();
    let mut bits = LzssReader::create(DESC,src);
    while bits.position() - body_start < size {
        if bits.descbit()? != 0 {
            if bits.source_at_end() {
                break;
            }
            let b = bits.getbyte()?;
            out.push(b);
        } else {
            if bits.source_at_end() {
                break;
            }
            let lo = bits.getbyte()? as usize;
            let hi = bits.getbyte()? as usize;
            let base = lo | ((hi << 4) & 0xF00);
            let length = (hi & 0x0F) + 3;
            let stored = (base + 0x12) % WINDOW;
            let cursor = out.len() - out_start;
            // rebase the absolute in-block offset around the cursor; a
            // source at or ahead of the cursor reaches before the start
            // of the output and decodes as zeroes
            let delta = (stored + WINDOW - cursor % WINDOW) % WINDOW;
            let source = cursor as i64 - WINDOW as i64 + delta as i64;
            if source < 0 {
                for _i in 0..length {
                    out.push(0);
                }
            } else {
                for i in 0..length {
                    let b = out[out_start + source as usize + i];
                    out.push(b);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn compression_works() {
    // five zeroes become one zero-fill token
    assert_eq!(encode(&[0x00;5],true),hex::decode("030000eff2").unwrap());
    // headerless variant drops the leading size word
    assert_eq!(encode(&[0x00;5],false),hex::decode("00eff2").unwrap());
    // a lone literal
    assert_eq!(encode(&[0x42],true),hex::decode("02000142").unwrap());
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("030000eff2").unwrap()).unwrap(),vec![0x00;5]);
    assert_eq!(decode_headerless(&hex::decode("00eff2").unwrap(),3).unwrap(),vec![0x00;5]);
    assert_eq!(decode(&hex::decode("02000142").unwrap()).unwrap(),vec![0x42]);
}

#[test]
fn zero_fill_stops_after_first_block() {
    // zeroes past offset 0xFFF must be encoded as ordinary matches, and
    // the stream must still round-trip
    let data = vec![0u8;WINDOW + 64];
    let compressed = encode(&data,true);
    assert_eq!(decode(&compressed).unwrap(),data);
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x00],
        vec![0x00,0x00],
        vec![0x12;500],
        (0..=255u8).cycle().take(5000).collect(),
        b"saxophones and sound drivers".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data,true);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn copies_across_block_boundary_round_trip() {
    // a match whose source sits just behind a 0x1000 boundary while the
    // cursor is past it exercises the offset rebasing
    let mut data: Vec<u8> = (0..=255u8).cycle().take(WINDOW - 8).collect();
    data.extend_from_slice(b"boundary straddle");
    data.extend((0..=255u8).cycle().take(64));
    data.extend_from_slice(b"boundary straddle");
    let compressed = encode(&data,true);
    assert_eq!(decode(&compressed).unwrap(),data);
}
