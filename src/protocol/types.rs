//! Field Type Codes
//!
//! The client renders every column according to one of these codes, so the
//! native type name reported by the database has to be folded onto them.

use super::value::Value;

/// Protocol field types (MySQL `enum_field_types` numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FieldType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    VarChar = 15,
    Bit = 16,
    Json = 245,
    NewDecimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

/// Substring rules, checked top to bottom. First hit wins.
///
/// Order matters: `BIGINT` before `INT`, `POINT` before `INT`,
/// `DATETIME`/`TIMESTAMP` before `DATE` and `TIME`, `VARCHAR` before `CHAR`,
/// sized blobs before bare `BLOB`/`TEXT`.
const NAME_RULES: &[(&[&str], FieldType)] = &[
    (&["BOOL"], FieldType::Tiny),
    (&["TINYINT"], FieldType::Tiny),
    (&["SMALLINT"], FieldType::Short),
    (&["MEDIUMINT"], FieldType::Int24),
    (&["BIGINT"], FieldType::LongLong),
    (&["POINT", "LINESTRING", "POLYGON", "GEOMETRY"], FieldType::Geometry),
    (&["INT"], FieldType::Long),
    (&["FLOAT"], FieldType::Float),
    (&["DOUBLE", "REAL"], FieldType::Double),
    (&["DECIMAL", "NUMERIC"], FieldType::NewDecimal),
    (&["DATETIME", "TIMESTAMP"], FieldType::DateTime),
    (&["DATE"], FieldType::Date),
    (&["TIME"], FieldType::Time),
    (&["YEAR"], FieldType::Year),
    (&["VARCHAR"], FieldType::VarString),
    (&["CHAR"], FieldType::String),
    (&["TINYBLOB", "TINYTEXT"], FieldType::TinyBlob),
    (&["MEDIUMBLOB", "MEDIUMTEXT"], FieldType::MediumBlob),
    (&["LONGBLOB", "LONGTEXT"], FieldType::LongBlob),
    (&["TEXT", "BLOB"], FieldType::Blob),
    (&["JSON"], FieldType::Json),
    (&["ENUM"], FieldType::Enum),
    (&["SET"], FieldType::Set),
    (&["BIT"], FieldType::Bit),
    (&["NULL"], FieldType::Null),
];

impl FieldType {
    /// Classify a native column type name (case-insensitive).
    ///
    /// Unmatched names fall back to `VarString`, which the client shows as text.
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        NAME_RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| upper.contains(n)))
            .map(|(_, ty)| *ty)
            .unwrap_or(FieldType::VarString)
    }

    /// Infer a type from a scanned value when no type name is available.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(_) => FieldType::Tiny,
            Value::Int(_) | Value::UInt(_) => FieldType::LongLong,
            Value::Float(_) => FieldType::Double,
            Value::Timestamp(_) => FieldType::DateTime,
            Value::Date(_) => FieldType::Date,
            Value::Text(_) | Value::Bytes(_) | Value::Null => FieldType::VarString,
        }
    }

    /// Numeric code written in the descriptor's TYPE slot.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Map a wire code back to a type, if it is one we know.
    pub fn from_code(code: u32) -> Option<Self> {
        let ty = match code {
            0 => FieldType::Decimal,
            1 => FieldType::Tiny,
            2 => FieldType::Short,
            3 => FieldType::Long,
            4 => FieldType::Float,
            5 => FieldType::Double,
            6 => FieldType::Null,
            7 => FieldType::Timestamp,
            8 => FieldType::LongLong,
            9 => FieldType::Int24,
            10 => FieldType::Date,
            11 => FieldType::Time,
            12 => FieldType::DateTime,
            13 => FieldType::Year,
            15 => FieldType::VarChar,
            16 => FieldType::Bit,
            245 => FieldType::Json,
            246 => FieldType::NewDecimal,
            247 => FieldType::Enum,
            248 => FieldType::Set,
            249 => FieldType::TinyBlob,
            250 => FieldType::MediumBlob,
            251 => FieldType::LongBlob,
            252 => FieldType::Blob,
            253 => FieldType::VarString,
            254 => FieldType::String,
            255 => FieldType::Geometry,
            _ => return None,
        };
        Some(ty)
    }

    /// Upper-case name as MySQL spells it.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Decimal => "DECIMAL",
            FieldType::Tiny => "TINY",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Null => "NULL",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::LongLong => "LONGLONG",
            FieldType::Int24 => "INT24",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::DateTime => "DATETIME",
            FieldType::Year => "YEAR",
            FieldType::VarChar => "VARCHAR",
            FieldType::Bit => "BIT",
            FieldType::Json => "JSON",
            FieldType::NewDecimal => "NEWDECIMAL",
            FieldType::Enum => "ENUM",
            FieldType::Set => "SET",
            FieldType::TinyBlob => "TINY_BLOB",
            FieldType::MediumBlob => "MEDIUM_BLOB",
            FieldType::LongBlob => "LONG_BLOB",
            FieldType::Blob => "BLOB",
            FieldType::VarString => "VAR_STRING",
            FieldType::String => "STRING",
            FieldType::Geometry => "GEOMETRY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_priority() {
        assert_eq!(FieldType::from_type_name("BIGINT"), FieldType::LongLong);
        assert_eq!(FieldType::from_type_name("bigint unsigned"), FieldType::LongLong);
        assert_eq!(FieldType::from_type_name("INT"), FieldType::Long);
        assert_eq!(FieldType::from_type_name("INT UNSIGNED"), FieldType::Long);
        assert_eq!(FieldType::from_type_name("TINYINT"), FieldType::Tiny);
        assert_eq!(FieldType::from_type_name("SMALLINT"), FieldType::Short);
        assert_eq!(FieldType::from_type_name("MEDIUMINT"), FieldType::Int24);
        assert_eq!(FieldType::from_type_name("BOOLEAN"), FieldType::Tiny);
    }

    #[test]
    fn test_temporal_priority() {
        assert_eq!(FieldType::from_type_name("TIMESTAMP"), FieldType::DateTime);
        assert_eq!(FieldType::from_type_name("DATETIME"), FieldType::DateTime);
        assert_eq!(FieldType::from_type_name("DATE"), FieldType::Date);
        assert_eq!(FieldType::from_type_name("TIME"), FieldType::Time);
        assert_eq!(FieldType::from_type_name("YEAR"), FieldType::Year);
    }

    #[test]
    fn test_geometry_is_not_an_int() {
        assert_eq!(FieldType::from_type_name("POINT"), FieldType::Geometry);
        assert_eq!(FieldType::from_type_name("MULTIPOINT"), FieldType::Geometry);
        assert_eq!(FieldType::from_type_name("GEOMETRY"), FieldType::Geometry);
    }

    #[test]
    fn test_string_and_blob_families() {
        assert_eq!(FieldType::from_type_name("VARCHAR"), FieldType::VarString);
        assert_eq!(FieldType::from_type_name("CHAR"), FieldType::String);
        assert_eq!(FieldType::from_type_name("TINYTEXT"), FieldType::TinyBlob);
        assert_eq!(FieldType::from_type_name("MEDIUMBLOB"), FieldType::MediumBlob);
        assert_eq!(FieldType::from_type_name("LONGTEXT"), FieldType::LongBlob);
        assert_eq!(FieldType::from_type_name("TEXT"), FieldType::Blob);
        assert_eq!(FieldType::from_type_name("BLOB"), FieldType::Blob);
        assert_eq!(FieldType::from_type_name("JSON"), FieldType::Json);
        assert_eq!(FieldType::from_type_name("ENUM"), FieldType::Enum);
        assert_eq!(FieldType::from_type_name("SET"), FieldType::Set);
        assert_eq!(FieldType::from_type_name("BIT"), FieldType::Bit);
        assert_eq!(FieldType::from_type_name("DECIMAL"), FieldType::NewDecimal);
        assert_eq!(FieldType::from_type_name("DOUBLE"), FieldType::Double);
        assert_eq!(FieldType::from_type_name("FLOAT"), FieldType::Float);
    }

    #[test]
    fn test_unknown_defaults_to_var_string() {
        assert_eq!(FieldType::from_type_name("VARBINARY"), FieldType::VarString);
        assert_eq!(FieldType::from_type_name(""), FieldType::VarString);
        assert_eq!(FieldType::from_type_name("UUID"), FieldType::VarString);
    }

    #[test]
    fn test_from_value_fallback() {
        assert_eq!(FieldType::from_value(&Value::Bool(true)), FieldType::Tiny);
        assert_eq!(FieldType::from_value(&Value::Int(-1)), FieldType::LongLong);
        assert_eq!(FieldType::from_value(&Value::Float(0.5)), FieldType::Double);
        assert_eq!(FieldType::from_value(&Value::Text("a".into())), FieldType::VarString);
        assert_eq!(FieldType::from_value(&Value::Null), FieldType::VarString);
    }

    #[test]
    fn test_code_round_trip() {
        for code in 0..=255u32 {
            if let Some(ty) = FieldType::from_code(code) {
                assert_eq!(ty.code(), code);
            }
        }
        assert_eq!(FieldType::from_code(14), None);
        assert_eq!(FieldType::VarString.code(), 253);
    }
}
