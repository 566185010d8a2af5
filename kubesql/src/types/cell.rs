use chrono::{DateTime, Utc};
use std::fmt;

/// The type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    I32,
    I64,
    F64,
    TimestampTz,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::F64 => "f64",
            ColumnType::TimestampTz => "timestamptz",
        };
        f.write_str(name)
    }
}

/// A single typed value in a table row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    String(String),
    I32(i32),
    I64(i64),
    F64(f64),
    TimestampTz(DateTime<Utc>),
}

impl Cell {
    /// Returns whether this cell can be stored in a column of the given type.
    ///
    /// [`Cell::Null`] is compatible with every column type; nullability of the
    /// target column is checked separately by the store.
    pub fn is_compatible_with(&self, typ: ColumnType) -> bool {
        match self {
            Cell::Null => true,
            Cell::String(_) => typ == ColumnType::Text,
            Cell::I32(_) => typ == ColumnType::I32,
            Cell::I64(_) => typ == ColumnType::I64,
            Cell::F64(_) => typ == ColumnType::F64,
            Cell::TimestampTz(_) => typ == ColumnType::TimestampTz,
        }
    }

    /// Returns whether this cell is [`Cell::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::String(s) => write!(f, "{s}"),
            Cell::I32(v) => write!(f, "{v}"),
            Cell::I64(v) => write!(f, "{v}"),
            Cell::F64(v) => write!(f, "{v}"),
            Cell::TimestampTz(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_owned())
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I32(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::F64(value)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::TimestampTz(value)
    }
}
