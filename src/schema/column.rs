//! Column definitions
//!
//! A [`Column`] carries an abstract [`ColumnType`] that each
//! [`crate::platform::Platform`] maps to a native type. Columns are nullable
//! unless marked otherwise; marking a column primary also makes it not-null.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default length for `string` columns.
pub const DEFAULT_STRING_LENGTH: u32 = 255;
/// Default length for `char` columns.
pub const DEFAULT_CHAR_LENGTH: u32 = 1;
/// Default precision for `decimal` columns.
pub const DEFAULT_DECIMAL_PRECISION: u32 = 10;
/// Default scale for `decimal` columns.
pub const DEFAULT_DECIMAL_SCALE: u32 = 2;

/// Abstract column type understood by every dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Serial,
    Integer,
    Smallint,
    Bigint,
    Text,
    String,
    Char,
    Decimal,
    Float,
    Date,
    Time,
    Timestamp,
    Boolean,
    Blob,
}

impl ColumnType {
    pub const ALL: [ColumnType; 14] = [
        ColumnType::Serial,
        ColumnType::Integer,
        ColumnType::Smallint,
        ColumnType::Bigint,
        ColumnType::Text,
        ColumnType::String,
        ColumnType::Char,
        ColumnType::Decimal,
        ColumnType::Float,
        ColumnType::Date,
        ColumnType::Time,
        ColumnType::Timestamp,
        ColumnType::Boolean,
        ColumnType::Blob,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Serial => "serial",
            ColumnType::Integer => "integer",
            ColumnType::Smallint => "smallint",
            ColumnType::Bigint => "bigint",
            ColumnType::Text => "text",
            ColumnType::String => "string",
            ColumnType::Char => "char",
            ColumnType::Decimal => "decimal",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Boolean => "boolean",
            ColumnType::Blob => "blob",
        }
    }

    /// Integer-family types, the only ones an `unsigned` flag applies to.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Serial | ColumnType::Integer | ColumnType::Smallint | ColumnType::Bigint
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownColumnType(s.to_string()))
    }
}

/// Type-specific options. Unset values fall back to the per-type defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOptions {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
}

impl ColumnOptions {
    pub fn with_length(length: u32) -> Self {
        ColumnOptions {
            length: Some(length),
            ..Default::default()
        }
    }

    pub fn with_precision(precision: u32, scale: u32) -> Self {
        ColumnOptions {
            precision: Some(precision),
            scale: Some(scale),
            ..Default::default()
        }
    }
}

/// A column default: a literal value or a bare SQL expression token.
///
/// Text values that look like `CURRENT_TIMESTAMP` or `NOW()` (uppercase letters and
/// underscores, optionally followed by `()`) are rendered as expressions, anything
/// else as a quoted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for DefaultValue {
    fn from(v: bool) -> Self {
        DefaultValue::Bool(v)
    }
}

impl From<i32> for DefaultValue {
    fn from(v: i32) -> Self {
        DefaultValue::Int(v.into())
    }
}

impl From<i64> for DefaultValue {
    fn from(v: i64) -> Self {
        DefaultValue::Int(v)
    }
}

impl From<f64> for DefaultValue {
    fn from(v: f64) -> Self {
        DefaultValue::Float(v)
    }
}

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        DefaultValue::Text(v.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(v: String) -> Self {
        DefaultValue::Text(v)
    }
}

impl<T: Into<DefaultValue>> From<Option<T>> for DefaultValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(DefaultValue::Null)
    }
}

/// A single column of a table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    options: ColumnOptions,
    nullable: bool,
    primary: bool,
    default: Option<DefaultValue>,
}

impl Column {
    pub fn new(name: &str, column_type: ColumnType, options: ColumnOptions) -> Self {
        Column {
            name: name.to_string(),
            column_type,
            options,
            nullable: true,
            primary: false,
            default: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// True for the auto-increment primary key produced by `Table::serial`.
    pub fn is_serial_primary(&self) -> bool {
        self.primary && self.column_type == ColumnType::Serial
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    pub fn default(&mut self, value: impl Into<DefaultValue>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.options.unsigned = true;
        self
    }
}
