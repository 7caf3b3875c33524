//! Moduled container
//!
//! Games stream large art into VRAM a little at a time, so the assets are
//! cut into modules (4 KiB by default) that are each compressed on their
//! own.  The container is a big-endian 16-bit total decompressed size
//! followed by the compressed modules back to back, with every module but
//! the last zero-padded so its successor starts on a `padding`-byte
//! boundary.  Boundaries are measured from just after the size field.
//!
//! The underlying encoder learns which kind of module it is compressing
//! through its `pad_mask` argument: `8 * padding - 1` on all but the last
//! module, 7 on the last.  The reference implementation smuggled this
//! through a mutable static; here it is an explicit parameter.

use crate::byteio::{self,ByteReader};
use crate::Error;

/// Chunk `data` and compress each module with `encode`, which receives
/// the pad mask for its position in the container.  A failure from the
/// module encoder aborts the whole container.
pub fn encode<E>(encode: E,data: &[u8],module_size: usize,padding: usize) -> Result<Vec<u8>,Error>
where E: Fn(&[u8],u32) -> Result<Vec<u8>,Error> {
    if data.len() > 0xFFFF {
        return Err(Error::FileTooLarge);
    }
    let pad_mask = padding - 1;
    let mut out = Vec::new();
    byteio::write2_be(&mut out,data.len() as u16);
    let mut body = Vec::new();
    let mut rest = data;
    while rest.len() > module_size {
        body.extend(encode(&rest[0..module_size],(8 * padding - 1) as u32)?);
        rest = &rest[module_size..];
        while body.len() & pad_mask != 0 {
            body.push(0);
        }
    }
    body.extend(encode(rest,7)?);
    out.extend(body);
    Ok(out)
}

/// Decode modules until the declared total size is reached, skipping the
/// inter-module padding.
pub fn decode<D>(decode_module: D,data: &[u8],padding: usize) -> Result<Vec<u8>,Error>
where D: Fn(&mut ByteReader,&mut Vec<u8>) -> Result<(),Error> {
    let mut header = ByteReader::new(data);
    let full_size = header.read2_be()? as usize;
    let mut src = ByteReader::new(header.remaining_slice());
    let pad_mask = padding - 1;
    let mut out = Vec::new();
    while out.len() < full_size {
        decode_module(&mut src,&mut out)?;
        if out.len() >= full_size {
            break;
        }
        let aligned = (src.position() + pad_mask) & !pad_mask;
        src.set_position(aligned)?;
    }
    Ok(out)
}

#[cfg(test)]
use crate::kosinski;

#[test]
fn single_module_matches_plain_stream() {
    let data = b"a single module, padded to nothing".to_vec();
    let wrapped = encode(|chunk,pad_mask| Ok(kosinski::encode_with_padding(chunk,pad_mask)),&data,4096,16).unwrap();
    let plain = kosinski::encode(&data);
    assert_eq!(wrapped[0..2],(data.len() as u16).to_be_bytes());
    assert_eq!(wrapped[2..],plain[..]);
    let expanded = decode(kosinski::decode_stream,&wrapped,16).unwrap();
    assert_eq!(expanded,data);
}

#[test]
fn modules_start_on_padding_boundaries() {
    // two modules of 16 zero bytes each; the first compressed module is 9
    // bytes, so 7 zero bytes of padding precede the second
    let data = vec![0u8;32];
    let wrapped = encode(|chunk,pad_mask| Ok(kosinski::encode_with_padding(chunk,pad_mask)),&data,16,16).unwrap();
    let first = kosinski::encode(&data[0..16]);
    assert_eq!(wrapped[0..2],[0x00,0x20]);
    assert_eq!(wrapped[2..2 + first.len()],first[..]);
    assert!(wrapped[2 + first.len()..18].iter().all(|&b| b == 0));
    let second = kosinski::encode(&data[16..32]);
    assert_eq!(wrapped[18..],second[..]);
    let expanded = decode(kosinski::decode_stream,&wrapped,16).unwrap();
    assert_eq!(expanded,data);
}

#[test]
fn oversized_input_is_rejected() {
    let data = vec![0u8;0x10000];
    assert_eq!(encode(|chunk,pad_mask| Ok(kosinski::encode_with_padding(chunk,pad_mask)),&data,4096,16),Err(Error::FileTooLarge));
}
