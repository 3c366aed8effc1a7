//! Frame Builder
//!
//! Assembles primitives and formatted values into the named frames of a
//! tunnel response. Every function appends to a caller-owned buffer so one
//! request produces exactly one contiguous body.

use bytes::{BufMut, BytesMut};

use super::encoder::{put_block, put_zeros};
use super::types::FieldType;
use super::value::Value;
use super::{
    errno, DEFAULT_FIELD_LENGTH, FLAG_NOT_NULL, MAGIC, NULL_MARKER, SEPARATOR_LAST,
    SEPARATOR_MORE, VERSION,
};

/// Column metadata as reported by the database collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Originating table; empty when the driver does not say.
    pub table: String,
    /// Native type name, e.g. `BIGINT UNSIGNED`.
    pub type_name: Option<String>,
    /// `Some(true)` when the column is declared NOT NULL.
    pub not_null: Option<bool>,
    /// Display length, if the driver reports one.
    pub length: Option<u32>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = Some(not_null);
        self
    }
}

/// What one executed statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    /// A read that completed; rows are already buffered.
    ResultSet {
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<Value>>,
    },
    /// A write that completed.
    Affected { rows_affected: u64, last_insert_id: u64 },
    /// Execution failed; the batch continues.
    Failed { message: String },
}

/// Response header: magic, version, errno, 6 reserved bytes.
pub fn header(buf: &mut BytesMut, errno: u32) {
    buf.reserve(super::HEADER_LEN);
    buf.put_u32(MAGIC);
    buf.put_u16(VERSION);
    buf.put_u32(errno);
    put_zeros(buf, 6);
}

/// Connection-info frame: host description, protocol version, server version.
pub fn conn_info(buf: &mut BytesMut, host: &str, proto_version: &str, server_version: &str) {
    put_block(buf, host.as_bytes());
    put_block(buf, proto_version.as_bytes());
    put_block(buf, server_version.as_bytes());
}

/// Result-set header: five counters and 12 reserved bytes.
pub fn result_set_header(
    buf: &mut BytesMut,
    errno: u32,
    affected: u32,
    insert_id: u32,
    num_fields: u32,
    num_rows: u32,
) {
    buf.reserve(super::RESULT_SET_HEADER_LEN);
    buf.put_u32(errno);
    buf.put_u32(affected);
    buf.put_u32(insert_id);
    buf.put_u32(num_fields);
    buf.put_u32(num_rows);
    put_zeros(buf, 12);
}

/// One descriptor per column.
///
/// Columns without a native type name are typed from `first_row`, if any.
pub fn fields_header(buf: &mut BytesMut, columns: &[ColumnInfo], first_row: Option<&[Value]>) {
    for (i, column) in columns.iter().enumerate() {
        let field_type = match &column.type_name {
            Some(name) => FieldType::from_type_name(name),
            None => first_row
                .and_then(|row| row.get(i))
                .map(FieldType::from_value)
                .unwrap_or(FieldType::VarString),
        };
        let flags = if column.not_null == Some(true) {
            FLAG_NOT_NULL
        } else {
            0
        };

        put_block(buf, column.name.as_bytes());
        put_block(buf, column.table.as_bytes());
        buf.put_u32(field_type.code());
        buf.put_u32(flags);
        buf.put_u32(column.length.unwrap_or(DEFAULT_FIELD_LENGTH));
    }
}

/// Row values in row-major order; NULL becomes the single marker byte.
pub fn row_data(buf: &mut BytesMut, rows: &[Vec<Value>]) {
    for value in rows.iter().flatten() {
        match value.to_wire_text() {
            Some(text) => put_block(buf, text.as_bytes()),
            None => buf.put_u8(NULL_MARKER),
        }
    }
}

/// Error response: header with `errno`, then the message.
pub fn error_frame(buf: &mut BytesMut, errno: u32, message: &str) {
    header(buf, errno);
    put_block(buf, message.as_bytes());
}

/// Statement separator: `0x01` if more groups follow, else `0x00`.
pub fn separator(buf: &mut BytesMut, more: bool) {
    buf.put_u8(if more { SEPARATOR_MORE } else { SEPARATOR_LAST });
}

/// Result-set header plus body for one executed statement.
///
/// 64-bit counters are truncated to the 32-bit wire slots. A result set
/// without columns has no field list to carry, so it is framed like a write
/// that touched no rows.
pub fn statement(buf: &mut BytesMut, outcome: &StatementOutcome) {
    match outcome {
        StatementOutcome::ResultSet { columns, .. } if columns.is_empty() => {
            result_set_header(buf, errno::OK, 0, 0, 0, 0);
            put_block(buf, b"Rows affected: 0");
        }
        StatementOutcome::ResultSet { columns, rows } => {
            result_set_header(buf, errno::OK, 0, 0, columns.len() as u32, rows.len() as u32);
            fields_header(buf, columns, rows.first().map(Vec::as_slice));
            row_data(buf, rows);
        }
        StatementOutcome::Affected {
            rows_affected,
            last_insert_id,
        } => {
            let affected = *rows_affected as u32;
            result_set_header(buf, errno::OK, affected, *last_insert_id as u32, 0, 0);
            put_block(buf, format!("Rows affected: {}", affected).as_bytes());
        }
        StatementOutcome::Failed { message } => {
            result_set_header(buf, errno::QUERY, 0, 0, 0, 0);
            put_block(buf, message.as_bytes());
        }
    }
}
