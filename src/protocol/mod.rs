//! Tunnel Wire Protocol (Pure, Sync)
//!
//! No async, no I/O - just values → bytes and bytes → values.
//!
//! ```text
//! ResponseHeader  = MAGIC(4) VERSION(2) ERRNO(4) RESERVED(6)
//! Block(short)    = LEN(1, <254) PAYLOAD(LEN)
//! Block(long)     = 0xFE LEN(4) PAYLOAD(LEN)
//! ResultSetHeader = ERRNO(4) AFFECTED(4) INSERT_ID(4) NUM_FIELDS(4) NUM_ROWS(4) RESERVED(12)
//! FieldDescriptor = NameBlock TableNameBlock TYPE(4) FLAGS(4) LENGTH(4)
//! NullValue       = 0xFF
//! StatementSep    = 0x00 (last) | 0x01 (more follow)
//! ```
//!
//! All integers are big-endian.

pub mod decoder;
pub mod encoder;
pub mod frames;
pub mod types;
pub mod value;

pub use decoder::{decode_connection_response, decode_query_response};
pub use encoder::{encode_block, encode_u16_be, encode_u32_be, zeros};
pub use frames::StatementOutcome;
pub use types::FieldType;
pub use value::Value;

/// Protocol magic at the start of every response header.
pub const MAGIC: u32 = 1111;

/// Protocol version the desktop client expects.
pub const VERSION: u16 = 202;

/// Size of the response header in bytes.
pub const HEADER_LEN: usize = 16;

/// Size of the result-set header in bytes.
pub const RESULT_SET_HEADER_LEN: usize = 32;

/// Payloads of this length or longer use the long Block form.
pub const SHORT_BLOCK_LIMIT: usize = 254;

/// First byte of a long-form Block.
pub const LONG_BLOCK_MARKER: u8 = 0xFE;

/// Stands in for a Block when a row value is NULL.
pub const NULL_MARKER: u8 = 0xFF;

/// Written after a statement group when more groups follow.
pub const SEPARATOR_MORE: u8 = 0x01;

/// Written after the final statement group.
pub const SEPARATOR_LAST: u8 = 0x00;

/// Field flag: column is declared NOT NULL.
pub const FLAG_NOT_NULL: u32 = 1;

/// Display length reported when the driver cannot supply one.
pub const DEFAULT_FIELD_LENGTH: u32 = 255;

/// Protocol version string sent in the connection-info frame.
pub const PROTO_INFO: &str = "10";

/// Error codes carried in the ERRNO slots.
pub mod errno {
    pub const OK: u32 = 0;
    pub const INVALID_PARAMETERS: u32 = 202;
    pub const QUERY: u32 = 1000;
    pub const CONNECT: u32 = 2000;
}
