//! Art C42 placeholder
//!
//! The reference tool set reserves a slot for this format but ships no
//! working implementation, so neither do we.  Both directions report
//! `Error::Unimplemented` rather than inventing a stream layout.

use crate::Error;

pub fn encode(_data: &[u8]) -> Result<Vec<u8>,Error> {
    Err(Error::Unimplemented)
}

pub fn decode(_data: &[u8]) -> Result<Vec<u8>,Error> {
    Err(Error::Unimplemented)
}

#[test]
fn both_directions_are_unimplemented() {
    assert_eq!(encode(&[1,2,3]),Err(Error::Unimplemented));
    assert_eq!(decode(&[1,2,3]),Err(Error::Unimplemented));
}
