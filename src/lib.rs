//! # Megacomp Library
//!
//! Compress or expand the classic compression formats of 16-bit Sega games:
//! * `comper`, `comperx` - word-oriented LZSS, fast to decompress on the 68000
//! * `kosinski`, `kosplus` - the workhorse LZSS family used for level art
//! * `lzkn1` - Konami's LZSS variant with packed literal runs
//! * `nemesis` - run-length coded nibbles under a constrained Huffman code
//! * `enigma` - pattern-word encoder for tilemaps
//! * `rocket` - LZSS over a circular buffer pre-filled with spaces
//! * `saxman` - the Sonic 2 sound-driver LZSS with zero-fill tokens
//! * `snkrle` - byte run-length encoding used by SNK
//!
//! The seven LZSS formats share one optimal parser (`lzss` module) that
//! computes a minimum-bits encoding; each format module supplies the
//! descriptor layout and the token encodings.  All functions transform byte
//! buffers; the moduled container used by games to stream large art in
//! chunks is available through `moduled` and the `Format` registry.
//!
//! ## Buffer Example
//!
//! ```rs
//! use megacomp::*;
//! let test_data: Vec<u8> = "This is the chaunt of the priests.".as_bytes().to_vec();
//! let packed = kosinski::encode(&test_data);
//! let unpacked = kosinski::decode(&packed).expect("expansion failed");
//! assert_eq!(test_data,unpacked);
//! ```
//!
//! ## Registry Example
//!
//! ```rs
//! use megacomp::format::Format;
//! let packed = Format::Nemesis.encode(&[0u8;32]).expect("compression failed");
//! ```

mod tools;
mod byteio;
pub mod lzss;
pub mod comper;
pub mod comperx;
pub mod kosinski;
pub mod kosplus;
pub mod lzkn1;
pub mod rocket;
pub mod saxman;
pub mod nemesis;
pub mod enigma;
pub mod snkrle;
pub mod artc42;
pub mod moduled;
pub mod format;

/// Codec Errors
#[derive(thiserror::Error,Debug,PartialEq,Eq)]
pub enum Error {
    #[error("compressed data ended unexpectedly")]
    Truncated,
    #[error("invalid compressed data: {0}")]
    Malformed(&'static str),
    #[error("expected {expected} bytes, expansion produced {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("input too large for a 16-bit size field")]
    FileTooLarge,
    #[error("format is a placeholder with no defined behavior")]
    Unimplemented
}
