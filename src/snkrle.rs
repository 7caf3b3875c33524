//! SNK run-length encoding
//!
//! The simplest format of the family, used by SNK's Mega Drive releases.
//! Every output byte appears literally in the stream; whenever two equal
//! bytes have just been emitted, the next stream byte is a repeat count
//! adding up to 255 more copies.  A count of 255 hands off to another
//! literal, which restarts the pair rule, so arbitrarily long runs chain
//! through full-count blocks.  A big-endian 16-bit size of the decoded
//! data leads the stream, and is the only way the decoder knows to stop.

use crate::byteio::{self,ByteReader};
use crate::Error;

/// Main compression function; fails only when the input cannot fit the
/// 16-bit size field
pub fn encode(data: &[u8]) -> Result<Vec<u8>,Error> {
    if data.len() > 0xFFFF {
        return Err(Error::FileTooLarge);
    }
    let mut out = Vec::new();
    byteio::write2_be(&mut out,data.len() as u16);
    if data.is_empty() {
        return Ok(out);
    }
    let mut i = 1;
    let mut cc = data[0];
    loop {
        out.push(cc);
        if i >= data.len() {
            break;
        }
        let nc = data[i];
        i += 1;
        if nc != cc {
            cc = nc;
            continue;
        }
        out.push(nc);
        let mut count = 0u8;
        let mut good = i < data.len();
        if good {
            cc = data[i];
            i += 1;
        }
        while good && nc == cc && count < 255 {
            count += 1;
            if i < data.len() {
                cc = data[i];
                i += 1;
            } else {
                good = false;
            }
        }
        out.push(count);
        if !good {
            break;
        }
    }
    Ok(out)
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
    if size == 0 {
        return Ok(());
    }
    let mut remaining = size;
    let mut cc = src.read1()?;
    out.push(cc);
    remaining -= 1;
    while remaining > 0 {
        let nc = src.read1()?;
        out.push(nc);
        remaining -= 1;
        if cc != nc {
            cc = nc;
            continue;
        }
        let count = src.read1()? as usize;
        if count > remaining {
            return Err(Error::Malformed("snk run overruns the declared size"));
        }
        for _i in 0..count {
            out.push(nc);
        }
        remaining -= count;
        if count == 255 && remaining > 0 {
            // a full count chains through one literal that restarts the
            // pair rule
            cc = src.read1()?;
            out.push(cc);
            remaining -= 1;
        }
    }
    Ok(())
}

#[test]
fn compression_works() {
    assert_eq!(encode(&[]).unwrap(),hex::decode("0000").unwrap());
    assert_eq!(encode(&[0xAA]).unwrap(),hex::decode("0001aa").unwrap());
    assert_eq!(encode(&[0xAA,0xAA,0xAA]).unwrap(),hex::decode("0003aaaa01").unwrap());
    assert_eq!(encode(&[0xAA,0xBB]).unwrap(),hex::decode("0002aabb").unwrap());
    // a pair with no further repeats still owes a zero count
    assert_eq!(encode(&[0xAA,0xAA,0xBB]).unwrap(),hex::decode("0003aaaa00bb").unwrap());
}

#[test]
fn expansion_works() {
    assert_eq!(decode(&hex::decode("0000").unwrap()).unwrap(),Vec::<u8>::new());
    assert_eq!(decode(&hex::decode("0003aaaa01").unwrap()).unwrap(),vec![0xAA;3]);
    assert_eq!(decode(&hex::decode("0003aaaa00bb").unwrap()).unwrap(),vec![0xAA,0xAA,0xBB]);
}

#[test]
fn long_runs_chain_through_full_counts() {
    for n in [257usize,258,300,600] {
        let data = vec![0x55u8;n];
        let compressed = encode(&data).unwrap();
        assert_eq!(decode(&compressed).unwrap(),data);
    }
    // a maximal run followed by a different byte
    let mut data = vec![0x55u8;257];
    data.push(0x56);
    let compressed = encode(&data).unwrap();
    assert_eq!(decode(&compressed).unwrap(),data);
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x00],
        vec![0x00,0x00],
        vec![0x11;512],
        (0..=255u8).collect(),
        b"aa bb cc  dd   ee".to_vec()
    ];
    for data in cases {
        let compressed = encode(&data).unwrap();
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn oversized_input_is_rejected() {
    assert_eq!(encode(&vec![0u8;0x10000]),Err(Error::FileTooLarge));
}
