//! Kosinski+ compression
//!
//! Flamewing's tightened revision of Kosinski.  The descriptor shrinks to
//! a single byte consumed high bit first with no eager fetch, the two-byte
//! match form stores its length as `10 - length` with the bytes swapped,
//! and the three-byte form counts from 9 so it reaches length 264.  The
//! end-of-stream marker is a three-byte match whose length byte is zero.

use crate::lzss::{self,LzssFormat,Window,DescriptorSpec,LzssReader,LzssWriter};
use crate::byteio::ByteReader;
use crate::Error;

const DESC: DescriptorSpec = DescriptorSpec {
    width: 8,
    little_endian_bytes: false,
    little_endian_bits: false,
    early_fetch: false
};

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Kind {
    Symbolwise,
    Inline,
    Short,
    Long
}

struct KosPlus;

impl LzssFormat for KosPlus {
    type Symbol = u8;
    type Kind = Kind;
    const SYMBOLWISE: Kind = Kind::Symbolwise;
    const NUM_DESC_BITS: u32 = 8;
    const NUM_TERM_BITS: u32 = 2;
    const TERMINATOR_WEIGHT: u32 = 2 + 3 * 8;
    const NEED_EARLY_DESCRIPTOR: bool = false;
    const FIRST_MATCH_POSITION: usize = 0;
    const LOOK_AHEAD_BUF_SIZE: usize = 264;
    fn windows() -> &'static [Window<Kind>] {
        &[
            Window { search_buf: 256, min_len: 2, look_ahead: 5, kind: Kind::Inline },
            Window { search_buf: 8192, min_len: 3, look_ahead: 9, kind: Kind::Short },
            Window { search_buf: 8192, min_len: 10, look_ahead: 264, kind: Kind::Long }
        ]
    }
    fn desc_bits(kind: Kind) -> u32 {
        match kind {
            Kind::Symbolwise => 1,
            Kind::Inline => 2 + 2,
            Kind::Short | Kind::Long => 2
        }
    }
    fn edge_weight(kind: Kind,_length: usize) -> u32 {
        match kind {
            Kind::Symbolwise => 1 + 8,
            Kind::Inline => 2 + 2 + 8,
            Kind::Short => 2 + 13 + 3,
            Kind::Long => 2 + 13 + 3 + 8
        }
    }
}

/// Main compression function
pub fn encode(data: &[u8]) -> Vec<u8> {
    encode_with_padding(data,7)
}

pub(crate) fn encode_with_padding(data: &[u8],pad_mask: u32) -> Vec<u8> {
    let parse = lzss::find_optimal_parse::<KosPlus>(data,pad_mask);
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
                out.putbyte((0x100 - edge.distance) as u8);
                out.descbit((len >> 1) as u32 & 1);
                out.descbit(len as u32 & 1);
            },
            Kind::Short => {
                let base = 0x2000 - edge.distance;
                out.descbit(0);
                out.descbit(1);
                out.putbyte((((base >> 5) & 0xF8) | (10 - edge.length)) as u8);
                out.putbyte(base as u8);
            },
            Kind::Long => {
                let base = 0x2000 - edge.distance;
                out.descbit(0);
                out.descbit(1);
                out.putbyte(((base >> 5) & 0xF8) as u8);
                out.putbyte(base as u8);
                out.putbyte((edge.length - 9) as u8);
            }
        }
    }
    out.descbit(0);
    out.descbit(1);
    out.putbyte(0xF0);
    out.putbyte(0x00);
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
            let hi = bits.getbyte()? as usize;
            let lo = bits.getbyte()? as usize;
            let c = hi & 0x07;
            if c != 0 {
                count = 10 - c;
            } else {
                let c = bits.getbyte()? as usize;
                if c == 0 {
                    break;
                }
                count = c + 9;
            }
            distance = 0x2000 - (((hi & 0xF8) << 5) | lo);
        } else {
            distance = 0x100 - bits.getbyte()? as usize;
            let hi = bits.descbit()?;
            let lo = bits.descbit()?;
            count = (hi * 2 + lo) as usize + 2;
        }
        if distance > out.len() {
            return Err(Error::Malformed("kosinski+ match reaches before the output"));
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
    assert_eq!(encode(&[0xAB]),hex::decode("a0abf00000").unwrap());
    // literal plus a 15-byte three-byte match
    assert_eq!(encode(&[0x00;16]),hex::decode("a800f8ff06f00000").unwrap());
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("a0abf00000").unwrap()).unwrap(),vec![0xAB]);
    assert_eq!(decode(&hex::decode("a800f8ff06f00000").unwrap()).unwrap(),vec![0x00;16]);
}

#[test]
fn long_form_reaches_264() {
    // a run of 265 collapses to a literal plus one maximal match
    let data = vec![0x77u8;265];
    let compressed = encode(&data);
    assert_eq!(decode(&compressed).unwrap(),data);
    // literal, match, terminator and one descriptor byte
    assert_eq!(compressed.len(),1 + 1 + 3 + 3);
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x01],
        vec![0xFF;33],
        (0..=255u8).cycle().take(2048).collect(),
        b"sing in me muse and through me tell the story".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}
