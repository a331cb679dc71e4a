//! Big-endian integer fields carried in metadata payloads.

use crate::metadata::error::DecodeError;

fn exact<const N: usize>(bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes.try_into().map_err(|_| DecodeError {
        expected: N,
        actual: bytes.len(),
    })
}

pub fn be_u8(bytes: &[u8]) -> Result<u8, DecodeError> {
    exact::<1>(bytes).map(u8::from_be_bytes)
}

pub fn be_u32(bytes: &[u8]) -> Result<u32, DecodeError> {
    exact::<4>(bytes).map(u32::from_be_bytes)
}

pub fn be_u64(bytes: &[u8]) -> Result<u64, DecodeError> {
    exact::<8>(bytes).map(u64::from_be_bytes)
}
