use std::fmt;

use crate::types::ColumnType;

/// The name of a table managed by the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(pub String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// The schema of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub typ: ColumnType,
    pub nullable: bool,
    /// Whether this column is part of the table's identity.
    pub primary: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, typ: ColumnType, nullable: bool, primary: bool) -> Self {
        Self {
            name: name.into(),
            typ,
            nullable,
            primary,
        }
    }
}

/// The schema of a table: its name plus ordered column definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: TableName,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(name: TableName, columns: Vec<ColumnSchema>) -> Self {
        Self { name, columns }
    }

    /// Returns whether the schema declares at least one primary key column.
    pub fn has_primary_keys(&self) -> bool {
        self.columns.iter().any(|c| c.primary)
    }

    /// Returns the index of the column with the given name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
