//! Enigma compression
//!
//! The tilemap format of the early Sonic games.  Input is a stream of
//! big-endian 16-bit pattern words, of which only the low bits vary much:
//! the top five bits are the VDP flip/priority/palette flags.  The encoder
//! measures the whole input first: which of the five flag bits ever vary
//! (the flag mask), how many bits the largest tile index needs (the packet
//! length), the most frequent word, and the word that starts the longest
//! incrementing run.  The header carries those four values; the bitstream
//! then describes the words as runs of the incrementing word, runs of the
//! common word, constant-delta runs of an explicit word, or buffered lists
//! of explicit words, each packet built from a 4-bit count.
//!
//! Explicit words spend flag bits only where the mask says a flag varies,
//! plus `packet_length` index bits, so a mostly-flat tilemap packs tightly.

use crate::tools::bitstream::{BitReader,BitWriter};
use crate::byteio::{self,ByteReader};
use crate::Error;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// write the masked-in flag bits of `word`, highest first
fn write_bitfield(bits: &mut BitWriter,selector: u8,word: u16) {
    for i in (0..5).rev() {
        if (selector >> i) & 1 != 0 {
            bits.push((word >> (11 + i)) & 1 != 0);
        }
    }
}

/// read back the flag bits selected by the mask
fn read_bitfield(bits: &mut BitReader,selector: u8) -> Result<u16,Error> {
    let mut flags = 0;
    for i in (0..5).rev() {
        if (selector >> i) & 1 != 0 {
            flags |= (bits.get_bit()? as u16) << (11 + i);
        }
    }
    Ok(flags)
}

/// flush the buffered list of explicit words as a %111 packet
fn flush_buffer(buf: &mut Vec<u16>,bits: &mut BitWriter,selector: u8,packet_length: u32) {
    if buf.is_empty() {
        return;
    }
    bits.write(0x70 | (buf.len() as u32 - 1) & 0xF,7);
    for &v in buf.iter() {
        write_bitfield(bits,selector,v);
        bits.write((v & 0x7FF) as u32,packet_length);
    }
    buf.clear();
}

/// Main compression function.  A trailing odd byte cannot be represented
/// and is dropped, as the reference implementation does.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let unpack: Vec<u16> = data.chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0],pair[1]]))
        .collect();

    let mut maskval = 0u16;
    let mut counts: BTreeMap<u16,usize> = BTreeMap::new();
    let mut elems: BTreeSet<u16> = BTreeSet::new();
    for &v in unpack.iter() {
        maskval |= v;
        *counts.entry(v).or_insert(0) += 1;
        elems.insert(v);
    }

    let selector = (maskval >> 11) as u8;
    let packet_length = match maskval & 0x7FF {
        0 => 1,
        v => 16 - v.leading_zeros()
    };

    // most frequent word; the smallest word wins ties
    let mut common_value = 0u16;
    let mut best = 0usize;
    for (&v,&n) in counts.iter() {
        if n > best {
            best = n;
            common_value = v;
        }
    }

    // longest incrementing (not necessarily contiguous) run, checked only
    // for words actually present
    let mut incrementing_value = 0u16;
    let mut best = 0usize;
    for &w in elems.iter() {
        let mut next = w;
        let mut hits = 0;
        for &v in unpack.iter() {
            if v == next {
                next = next.wrapping_add(1);
                hits += 1;
            }
        }
        if hits > best {
            best = hits;
            incrementing_value = w;
        }
    }

    let mut out = Vec::new();
    out.push(packet_length as u8);
    out.push(selector);
    byteio::write2_be(&mut out,incrementing_value);
    byteio::write2_be(&mut out,common_value);

    let mut bits = BitWriter::new();
    let mut buf: Vec<u16> = Vec::new();
    let mut incrementing_value = incrementing_value;
    let mut pos = 0;
    while pos < unpack.len() {
        let v = unpack[pos];
        if v == incrementing_value {
            flush_buffer(&mut buf,&mut bits,selector,packet_length);
            let mut next = v.wrapping_add(1);
            let mut cnt = 0u32;
            for &e in unpack[pos + 1..].iter() {
                if cnt >= 0xF || e != next {
                    break;
                }
                next = next.wrapping_add(1);
                cnt += 1;
            }
            bits.write(cnt,6);
            incrementing_value = next;
            pos += cnt as usize;
        } else if v == common_value {
            flush_buffer(&mut buf,&mut bits,selector,packet_length);
            let mut cnt = 0u32;
            for &e in unpack[pos + 1..].iter() {
                if cnt >= 0xF || e != v {
                    break;
                }
                cnt += 1;
            }
            bits.write(0x10 | cnt,6);
            pos += cnt as usize;
        } else {
            let mut handled = false;
            if pos + 1 < unpack.len() {
                let peek = unpack[pos + 1];
                let delta = peek as i32 - v as i32;
                if peek != incrementing_value && (-1..=1).contains(&delta) {
                    flush_buffer(&mut buf,&mut bits,selector,packet_length);
                    let mut next = (peek as i32 + delta) as u16;
                    let mut cnt = 1u32;
                    for &e in unpack[pos + 2..].iter() {
                        if cnt >= 0xF || e != next || next == incrementing_value {
                            break;
                        }
                        next = (next as i32 + delta) as u16;
                        cnt += 1;
                    }
                    let mode = match delta {
                        0 => 4u32,
                        1 => 5,
                        _ => 6
                    };
                    bits.write((mode << 4) | cnt,7);
                    write_bitfield(&mut bits,selector,v);
                    bits.write((v & 0x7FF) as u32,packet_length);
                    pos += cnt as usize;
                    handled = true;
                }
            }
            if !handled {
                if buf.len() >= 0xF {
                    flush_buffer(&mut buf,&mut bits,selector,packet_length);
                }
                buf.push(v);
            }
        }
        pos += 1;
    }
    flush_buffer(&mut buf,&mut bits,selector,packet_length);

    // terminator
    bits.write(0x7F,7);
    bits.pad_to_word(16);
    out.extend(bits.into_bytes());
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
    let packet_length = src.read1()? as u32;
    let selector = src.read1()? & 0x1F;
    let mut incrementing_value = src.read2_be()?;
    let common_value = src.read2_be()?;
    if packet_length == 0 || packet_length > 16 {
        return Err(Error::Malformed("enigma packet length out of range"));
    }

    let mut bits = BitReader::new(src.remaining_slice());
    loop {
        if bits.get_bit()? != 0 {
            let mode = bits.read(2)?;
            if mode == 3 {
                let cnt = bits.read(4)?;
                // all-ones count ends the stream
                if cnt == 0x0F {
                    break;
                }
                for _i in 0..=cnt {
                    let flags = read_bitfield(&mut bits,selector)?;
                    let v = bits.read(packet_length)? as u16;
                    byteio::write2_be(out,v | flags);
                }
            } else {
                let delta: i32 = [0,1,-1][mode as usize];
                let cnt = bits.read(4)? + 1;
                let flags = read_bitfield(&mut bits,selector)?;
                let mut v = (bits.read(packet_length)? as u16) | flags;
                for _i in 0..cnt {
                    byteio::write2_be(out,v);
                    v = (v as i32 + delta) as u16;
                }
            }
        } else if bits.get_bit()? == 0 {
            let cnt = bits.read(4)? + 1;
            for _i in 0..cnt {
                byteio::write2_be(out,incrementing_value);
                incrementing_value = incrementing_value.wrapping_add(1);
            }
        } else {
            let cnt = bits.read(4)? + 1;
            for _i in 0..cnt {
                byteio::write2_be(out,common_value);
            }
        }
    }
    // the stream is built from whole 16-bit words
    let words = (bits.position() + 15) / 16;
    src.advance(words * 2)?;
    Ok(())
}

/// header statistics as the decoder reads them, exposed for testing and
/// the CLI's info output
pub fn read_header(data: &[u8]) -> Result<(u8,u8,u16,u16),Error> {
    let mut src = ByteReader::new(data);
    let packet_length = src.read1()?;
    let selector = src.read1()? & 0x1F;
    let incrementing = src.read2_be()?;
    let common = src.read2_be()?;
    Ok((packet_length,selector,incrementing,common))
}

#[test]
fn empty_input_is_header_and_terminator() {
    let compressed = encode(&[]);
    // header: packet length 1, no flags, both seeds zero; then %1111111
    assert_eq!(compressed,hex::decode("010000000000fe00").unwrap());
    assert_eq!(decode(&compressed).unwrap(),Vec::<u8>::new());
}

#[test]
fn incrementing_run_packs_to_one_packet() {
    // words 0..10 are a pure incrementing run seeded by the header
    let data: Vec<u8> = (0u16..10).flat_map(|w| w.to_be_bytes()).collect();
    let compressed = encode(&data);
    assert_eq!(decode(&compressed).unwrap(),data);
    // header + one 6-bit packet + terminator fits in one bitstream word
    assert_eq!(compressed.len(),8);
}

#[test]
fn header_statistics_reproduce() {
    let data: Vec<u8> = [0x2005u16,0x2005,0x2005,0x2001,0x2002,0x2003,0x0150]
        .iter().flat_map(|w| w.to_be_bytes()).collect();
    let compressed = encode(&data);
    let (packet_length,selector,incrementing,common) = read_header(&compressed).unwrap();
    // highest low-11-bit value is 0x150, nine bits; flag bit 13 varies
    assert_eq!(packet_length,9);
    assert_eq!(selector,0b00100);
    assert_eq!(incrementing,0x2001);
    assert_eq!(common,0x2005);
    assert_eq!(decode(&compressed).unwrap(),data);
}

#[test]
fn invertibility() {
    let cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0x00,0x01],
        (0u16..256).flat_map(|w| w.to_be_bytes()).collect(),
        [0x8000u16,0x8000,0x8001,0x8002,0x8003,0x1234,0x1234,0x1234].iter()
            .flat_map(|w| w.to_be_bytes()).collect(),
        (0u16..64).map(|i| 64 - i).flat_map(|w| w.to_be_bytes()).collect(),
        [0x07FFu16;100].iter().flat_map(|w| w.to_be_bytes()).collect()
    ];
    for data in cases {
        let compressed = encode(&data);
        let expanded = decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn flag_bits_round_trip() {
    // exercise every flag bit plus an inline list longer than 15 words
    let mut words: Vec<u16> = Vec::new();
    for i in 0..20u16 {
        let flags = [0x8000,0x4000,0x2000,0x1000,0x0800][i as usize % 5];
        words.push(flags | (i * 7 % 0x400));
    }
    let data: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    let compressed = encode(&data);
    assert_eq!(decode(&compressed).unwrap(),data);
}

#[test]
fn truncated_stream_is_an_error() {
    let data: Vec<u8> = (0u16..16).flat_map(|w| w.to_be_bytes()).collect();
    let compressed = encode(&data);
    // drop the final word holding the terminator
    let truncated = &compressed[0..compressed.len() - 2];
    assert_eq!(decode(truncated),Err(Error::Truncated));
}
