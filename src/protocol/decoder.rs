//! Response decoder.
//!
//! Reads tunnel responses back into typed frames. Used by the `probe`
//! command and by tests that check the encoder from the outside.

use nom::bytes::complete::take;
use nom::error::{Error as NomError, ErrorKind};
use nom::multi::count;
use nom::number::complete::{be_u16, be_u32, be_u8};
use nom::IResult;
use serde::Serialize;

use super::{errno, LONG_BLOCK_MARKER, NULL_MARKER, SEPARATOR_LAST, SEPARATOR_MORE};
use crate::error::{TunnelError, TunnelResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseHeader {
    pub magic: u32,
    pub version: u16,
    pub errno: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub host_info: String,
    pub proto_info: String,
    pub server_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSetHeader {
    pub errno: u32,
    pub affected_rows: u32,
    pub insert_id: u32,
    pub num_fields: u32,
    pub num_rows: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub table: String,
    pub type_code: u32,
    pub flags: u32,
    pub length: u32,
}

/// Body following a result-set header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementBody {
    Rows {
        fields: Vec<FieldDescriptor>,
        rows: Vec<Vec<Option<String>>>,
    },
    /// Info text on success, error text on failure.
    Message { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementGroup {
    pub header: ResultSetHeader,
    pub body: StatementBody,
}

/// Decoded answer to a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionResponse {
    Connected { header: ResponseHeader, info: ConnectionInfo },
    Error { header: ResponseHeader, message: String },
}

/// Decoded answer to a query request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResponse {
    Statements { header: ResponseHeader, statements: Vec<StatementGroup> },
    Error { header: ResponseHeader, message: String },
}

fn verify_failure<T>(input: &[u8]) -> IResult<&[u8], T> {
    Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)))
}

/// One Block. A leading `0xFF` is rejected: that byte only ever means NULL.
pub fn block(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (rest, len) = be_u8(input)?;
    match len {
        LONG_BLOCK_MARKER => {
            let (rest, len) = be_u32(rest)?;
            take(len)(rest)
        }
        NULL_MARKER => verify_failure(input),
        short => take(short)(rest),
    }
}

/// A row value: either the NULL marker or a Block.
pub fn nullable_block(input: &[u8]) -> IResult<&[u8], Option<&[u8]>> {
    match input.first() {
        Some(&NULL_MARKER) => Ok((&input[1..], None)),
        _ => block(input).map(|(rest, b)| (rest, Some(b))),
    }
}

fn text_block(input: &[u8]) -> IResult<&[u8], String> {
    let (rest, b) = block(input)?;
    Ok((rest, String::from_utf8_lossy(b).into_owned()))
}

fn nullable_text(input: &[u8]) -> IResult<&[u8], Option<String>> {
    let (rest, b) = nullable_block(input)?;
    Ok((rest, b.map(|b| String::from_utf8_lossy(b).into_owned())))
}

pub fn response_header(input: &[u8]) -> IResult<&[u8], ResponseHeader> {
    let (input, magic) = be_u32(input)?;
    let (input, version) = be_u16(input)?;
    let (input, errno) = be_u32(input)?;
    let (input, _) = take(6usize)(input)?;
    Ok((
        input,
        ResponseHeader {
            magic,
            version,
            errno,
        },
    ))
}

pub fn connection_info(input: &[u8]) -> IResult<&[u8], ConnectionInfo> {
    let (input, host_info) = text_block(input)?;
    let (input, proto_info) = text_block(input)?;
    let (input, server_version) = text_block(input)?;
    Ok((
        input,
        ConnectionInfo {
            host_info,
            proto_info,
            server_version,
        },
    ))
}

pub fn result_set_header(input: &[u8]) -> IResult<&[u8], ResultSetHeader> {
    let (input, errno) = be_u32(input)?;
    let (input, affected_rows) = be_u32(input)?;
    let (input, insert_id) = be_u32(input)?;
    let (input, num_fields) = be_u32(input)?;
    let (input, num_rows) = be_u32(input)?;
    let (input, _) = take(12usize)(input)?;
    Ok((
        input,
        ResultSetHeader {
            errno,
            affected_rows,
            insert_id,
            num_fields,
            num_rows,
        },
    ))
}

pub fn field_descriptor(input: &[u8]) -> IResult<&[u8], FieldDescriptor> {
    let (input, name) = text_block(input)?;
    let (input, table) = text_block(input)?;
    let (input, type_code) = be_u32(input)?;
    let (input, flags) = be_u32(input)?;
    let (input, length) = be_u32(input)?;
    Ok((
        input,
        FieldDescriptor {
            name,
            table,
            type_code,
            flags,
            length,
        },
    ))
}

fn statement_group(input: &[u8]) -> IResult<&[u8], StatementGroup> {
    let (input, header) = result_set_header(input)?;
    if header.errno != errno::OK || header.num_fields == 0 {
        let (input, text) = text_block(input)?;
        return Ok((
            input,
            StatementGroup {
                header,
                body: StatementBody::Message { text },
            },
        ));
    }

    let num_fields = header.num_fields as usize;
    let (input, fields) = count(field_descriptor, num_fields)(input)?;
    let (input, rows) = count(count(nullable_text, num_fields), header.num_rows as usize)(input)?;
    Ok((
        input,
        StatementGroup {
            header,
            body: StatementBody::Rows { fields, rows },
        },
    ))
}

fn offset_of(full: &[u8], err: nom::Err<NomError<&[u8]>>) -> TunnelError {
    match err {
        nom::Err::Incomplete(_) => TunnelError::decode(full.len(), "unexpected end of input"),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = full.len() - e.input.len();
            TunnelError::decode(offset, format!("{:?}", e.code))
        }
    }
}

fn expect_magic(header: &ResponseHeader) -> TunnelResult<()> {
    if header.magic != super::MAGIC {
        return Err(TunnelError::decode(0, format!("bad magic {}", header.magic)));
    }
    Ok(())
}

/// Decode the answer to action `C`.
pub fn decode_connection_response(full: &[u8]) -> TunnelResult<ConnectionResponse> {
    let (input, header) = response_header(full).map_err(|e| offset_of(full, e))?;
    expect_magic(&header)?;

    if header.errno != errno::OK {
        let (_, message) = text_block(input).map_err(|e| offset_of(full, e))?;
        return Ok(ConnectionResponse::Error { header, message });
    }
    let (_, info) = connection_info(input).map_err(|e| offset_of(full, e))?;
    Ok(ConnectionResponse::Connected { header, info })
}

/// Decode the answer to action `Q`, stopping after the final separator.
pub fn decode_query_response(full: &[u8]) -> TunnelResult<QueryResponse> {
    let (mut input, header) = response_header(full).map_err(|e| offset_of(full, e))?;
    expect_magic(&header)?;

    if header.errno != errno::OK {
        let (_, message) = text_block(input).map_err(|e| offset_of(full, e))?;
        return Ok(QueryResponse::Error { header, message });
    }

    let mut statements = Vec::new();
    while !input.is_empty() {
        let (rest, group) = statement_group(input).map_err(|e| offset_of(full, e))?;
        statements.push(group);

        let (rest, sep) = be_u8(rest).map_err(|e| offset_of(full, e))?;
        input = rest;
        match sep {
            SEPARATOR_LAST => break,
            SEPARATOR_MORE => continue,
            other => {
                let offset = full.len() - rest.len() - 1;
                return Err(TunnelError::decode(offset, format!("bad separator {:#04x}", other)));
            }
        }
    }

    Ok(QueryResponse::Statements { header, statements })
}
