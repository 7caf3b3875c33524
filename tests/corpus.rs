//! Round trips over synthetic stand-ins for real game data: tile-like
//! art, tilemap words, and incompressible noise from a fixed-seed
//! generator, so every run sees the same corpus.

use megacomp::format::{self,Format};

/// xorshift32, good enough for repeatable junk
struct Rng(u32);

impl Rng {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
    fn bytes(&mut self,n: usize) -> Vec<u8> {
        (0..n).map(|_| self.next() as u8).collect()
    }
}

/// something like flat-shaded 8x8 tiles: long nibble runs with sporadic
/// detail
fn tile_art(tiles: usize) -> Vec<u8> {
    let mut rng = Rng(0x2E71_8281);
    let mut out = Vec::with_capacity(tiles * 32);
    for _t in 0..tiles {
        let fill = (rng.next() % 4) as u8 * 0x11;
        for row in 0..8u8 {
            for col in 0..4u8 {
                match rng.next() % 8 {
                    0 => out.push(rng.next() as u8),
                    _ => out.push(fill.wrapping_add(row & col))
                }
            }
        }
    }
    out
}

/// something like a tilemap: a handful of pattern words with flags, runs
/// and ascending stretches
fn tilemap(words: usize) -> Vec<u8> {
    let mut rng = Rng(0x0BAD_F00D);
    let mut out = Vec::with_capacity(words * 2);
    let mut base = 0x2100u16;
    let mut i = 0;
    while i < words {
        match rng.next() % 4 {
            0 => {
                let run = (rng.next() % 12 + 1) as usize;
                for _j in 0..run.min(words - i) {
                    out.extend(0x2000u16.to_be_bytes());
                    i += 1;
                }
            },
            1 => {
                let run = (rng.next() % 12 + 1) as usize;
                for _j in 0..run.min(words - i) {
                    out.extend(base.to_be_bytes());
                    base = base.wrapping_add(1);
                    i += 1;
                }
            },
            _ => {
                let w = 0x8000 | (rng.next() as u16 & 0x07FF);
                out.extend(w.to_be_bytes());
                i += 1;
            }
        }
    }
    out
}

#[test]
fn art_like_corpus_round_trips() {
    for tiles in [1usize,4,17,64] {
        let data = tile_art(tiles);
        for f in format::ALL {
            if f == Format::Artc42 {
                continue;
            }
            let compressed = f.encode(&data).expect("compression failed");
            let expanded = f.decode(&compressed).expect("expansion failed");
            assert_eq!(expanded,data,"{} failed on {} tiles",f.name(),tiles);
        }
    }
}

#[test]
fn tilemap_corpus_round_trips() {
    // 608 words is 38 whole tiles, so even nemesis reproduces it exactly
    let data = tilemap(608);
    for f in format::ALL {
        if f == Format::Artc42 {
            continue;
        }
        let compressed = f.encode(&data).expect("compression failed");
        let expanded = f.decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data,"{} failed on the tilemap corpus",f.name());
    }
}

#[test]
fn noise_round_trips() {
    // incompressible input must still survive, if not shrink
    let data = Rng(0xDEAD_BEA7).bytes(2048);
    for f in format::ALL {
        if f == Format::Artc42 {
            continue;
        }
        let compressed = f.encode(&data).expect("compression failed");
        let expanded = f.decode(&compressed).expect("expansion failed");
        assert_eq!(expanded,data,"{} failed on noise",f.name());
    }
}

/// worst case for the LZSS formats is one literal per symbol plus the
/// terminator overhead; the optimal parser can never do worse
#[test]
fn lzss_never_beaten_by_literals() {
    let data = Rng(0x5EED_5EED).bytes(512);
    // per format: literal bits per byte, terminator bits, descriptor width
    let cases: [(Format,usize,usize,usize);5] = [
        (Format::Kosinski,9,26,16),
        (Format::KosPlus,9,26,8),
        (Format::Lzkn1,9,9,8),
        (Format::Saxman,9,0,8),
        (Format::Rocket,9,0,8)
    ];
    for (f,lit_bits,term_bits,desc_width) in cases {
        let bits = data.len() * lit_bits + term_bits;
        let padded = (bits + desc_width - 1) / desc_width * desc_width;
        let header = match f {
            Format::Lzkn1 => 2,
            Format::Rocket => 4,
            Format::Saxman => 2,
            _ => 0
        };
        let compressed = f.encode(&data).expect("compression failed");
        assert!(compressed.len() <= header + padded / 8 + desc_width / 8,
            "{} emitted {} bytes for a {}-byte literal bound",f.name(),compressed.len(),header + padded / 8);
    }
}

#[test]
fn moduled_corpus_round_trips() {
    let data = tile_art(40);
    for f in [Format::Kosinski,Format::Nemesis,Format::KosPlus,Format::Lzkn1] {
        let wrapped = f.moduled_encode(&data,f.module_size(),f.module_padding()).expect("compression failed");
        let expanded = f.moduled_decode(&wrapped,f.module_padding()).expect("expansion failed");
        assert_eq!(expanded,data,"moduled {} failed on the art corpus",f.name());
    }
}
