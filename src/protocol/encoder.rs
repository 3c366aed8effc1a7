//! Primitive encoder.
//!
//! Fixed-width big-endian integers and length-prefixed Blocks. Every string,
//! message and field value on the wire is a Block.

use bytes::{BufMut, BytesMut};

use super::{LONG_BLOCK_MARKER, SHORT_BLOCK_LIMIT};

/// Encode a `u32` as 4 big-endian bytes.
pub fn encode_u32_be(n: u32) -> [u8; 4] {
    n.to_be_bytes()
}

/// Encode a `u16` as 2 big-endian bytes.
pub fn encode_u16_be(n: u16) -> [u8; 2] {
    n.to_be_bytes()
}

/// Encode a payload as a standalone Block.
///
/// Wire format:
/// - payload < 254 bytes: length (1 byte), payload
/// - otherwise: 0xFE, length (4 bytes, big-endian), payload
pub fn encode_block(payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(block_len(payload.len()));
    put_block(&mut buf, payload);
    buf
}

/// `n` zero bytes of reserved padding.
pub fn zeros(n: usize) -> BytesMut {
    BytesMut::zeroed(n)
}

/// Append a Block to `buf`.
pub fn put_block(buf: &mut BytesMut, payload: &[u8]) {
    buf.reserve(block_len(payload.len()));
    if payload.len() < SHORT_BLOCK_LIMIT {
        buf.put_u8(payload.len() as u8);
    } else {
        buf.put_u8(LONG_BLOCK_MARKER);
        // LEN is 32 bits: payloads over 4 GiB are not representable.
        buf.put_u32(payload.len() as u32);
    }
    buf.extend_from_slice(payload);
}

/// Append `n` zero bytes to `buf`.
pub fn put_zeros(buf: &mut BytesMut, n: usize) {
    buf.put_bytes(0, n);
}

/// Encoded size of a Block carrying `payload_len` bytes.
pub fn block_len(payload_len: usize) -> usize {
    if payload_len < SHORT_BLOCK_LIMIT {
        1 + payload_len
    } else {
        5 + payload_len
    }
}
