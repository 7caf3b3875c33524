//! Cross-format properties: round trips over boundary sizes, re-encode
//! stability, and moduled idempotence over several chunkings.

use megacomp::format::{self,Format};

/// what a decoder gives back for `data`: word formats pad to whole words,
/// nemesis to whole tiles
fn expected_expansion(f: Format,data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let unit = match f {
        Format::Comper | Format::ComperX => 2,
        Format::Nemesis => 32,
        _ => 1
    };
    while out.len() % unit != 0 {
        out.push(0);
    }
    out
}

/// enigma can only represent whole words; everything else takes any size
fn representable(f: Format,len: usize) -> bool {
    match f {
        Format::Enigma => len % 2 == 0,
        _ => true
    }
}

fn boundary_cases() -> Vec<Vec<u8>> {
    let mut cases: Vec<Vec<u8>> = vec![
        vec![],
        vec![0xA5],
        vec![0x00;31],
        vec![0x00;32],
        vec![0x00;33],
        vec![0xFF;31],
        vec![0xFF;32],
        vec![0xFF;33],
        vec![0x00;4096],
        vec![0xFF;2048],
        (0..=255u8).collect(),
        (0..=255u8).cycle().take(1536).collect(),
        b"the same phrase again and the same phrase again and again".to_vec()
    ];
    // a buffer with mixed runs, literals and long-range repeats
    let mut mixed: Vec<u8> = Vec::new();
    mixed.extend(vec![0u8;40]);
    mixed.extend(b"header text");
    mixed.extend((0..=255u8).step_by(3));
    mixed.extend(vec![0x20u8;100]);
    mixed.extend(b"header text");
    cases.push(mixed);
    cases
}

#[test]
fn universal_round_trip() {
    for f in format::ALL {
        if f == Format::Artc42 {
            continue;
        }
        for data in boundary_cases() {
            if !representable(f,data.len()) {
                continue;
            }
            let compressed = f.encode(&data).expect("compression failed");
            let expanded = f.decode(&compressed).expect("expansion failed");
            assert_eq!(expanded,expected_expansion(f,&data),
                "{} failed on a {}-byte input",f.name(),data.len());
        }
    }
}

#[test]
fn reencode_is_stable() {
    // whatever the encoder emits must survive a decode-encode cycle
    // byte for byte
    for f in format::ALL {
        if f == Format::Artc42 {
            continue;
        }
        for data in boundary_cases() {
            if !representable(f,data.len()) {
                continue;
            }
            let compressed = f.encode(&data).expect("compression failed");
            let expanded = f.decode(&compressed).expect("expansion failed");
            let again = f.encode(&expanded).expect("recompression failed");
            assert_eq!(again,compressed,"{} is not stable on re-encode",f.name());
        }
    }
}

#[test]
fn moduled_idempotence_over_chunkings() {
    let data: Vec<u8> = (0..=255u8).cycle().take(512).collect();
    // divisors of 512 including the full length, plus a ragged chunking
    for module_size in [512usize,256,128,64,96] {
        for f in [Format::Kosinski,Format::KosPlus,Format::Comper,Format::Saxman,Format::Lzkn1,Format::Rocket,Format::SnkRle] {
            let wrapped = f.moduled_encode(&data,module_size,f.module_padding()).expect("compression failed");
            let expanded = f.moduled_decode(&wrapped,f.module_padding()).expect("expansion failed");
            assert_eq!(expanded,data,"moduled {} failed with {}-byte modules",f.name(),module_size);
        }
    }
}

#[test]
fn moduled_custom_padding() {
    let data: Vec<u8> = (0..=255u8).cycle().take(400).collect();
    for padding in [1usize,2,4,16,32] {
        let wrapped = Format::Kosinski.moduled_encode(&data,128,padding).expect("compression failed");
        let expanded = Format::Kosinski.moduled_decode(&wrapped,padding).expect("expansion failed");
        assert_eq!(expanded,data);
    }
}

#[test]
fn compressed_streams_differ_between_formats() {
    // sanity: the registry actually dispatches to distinct codecs
    let data: Vec<u8> = (0..=255u8).cycle().take(320).collect();
    let kos = Format::Kosinski.encode(&data).unwrap();
    let kosp = Format::KosPlus.encode(&data).unwrap();
    let nem = Format::Nemesis.encode(&data).unwrap();
    assert_ne!(kos,kosp);
    assert_ne!(kos,nem);
}
