//! Output formatting for command results

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "display")]
use serde::Serialize;
#[cfg(feature = "display")]
use tabled::{settings::Style, Table, Tabled};

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Rounded table (default)
    #[default]
    Table,
    Markdown,
    /// One JSON array
    Json,
    JsonPretty,
    /// One JSON object per line
    JsonLine,
    /// Pipe-separated values with a header line
    Psv,
}

/// Accepted names per format; the first is the canonical one.
const NAMES: &[(OutputFormat, &[&str])] = &[
    (OutputFormat::Table, &["table", "pretty"]),
    (OutputFormat::Markdown, &["markdown", "md"]),
    (OutputFormat::Json, &["json"]),
    (OutputFormat::JsonPretty, &["json-pretty", "jsonpretty"]),
    (OutputFormat::JsonLine, &["json-line", "jsonline", "jsonl", "ndjson"]),
    (OutputFormat::Psv, &["psv", "pipe"]),
];

impl OutputFormat {
    /// Canonical name, as accepted by `--format`.
    pub fn as_str(self) -> &'static str {
        NAMES
            .iter()
            .find(|(format, _)| *format == self)
            .and_then(|(_, names)| names.first())
            .copied()
            .unwrap_or("table")
    }

    pub fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    /// Canonical names of every format.
    pub fn names() -> impl Iterator<Item = &'static str> {
        NAMES.iter().map(|(format, _)| format.as_str())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(_, names)| names.iter().any(|n| n.eq_ignore_ascii_case(s)))
            .map(|(format, _)| *format)
            .ok_or_else(|| {
                format!(
                    "unknown output format '{}', expected one of: {}",
                    s,
                    Self::names().collect::<Vec<_>>().join(", ")
                )
            })
    }
}

/// Serialize `rows` when `format` is one of the JSON formats.
///
/// Returns `None` for the tabular formats.
#[cfg(feature = "display")]
pub fn to_json<T: Serialize>(rows: &[T], format: OutputFormat) -> serde_json::Result<Option<String>> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string(rows)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(rows)?,
        OutputFormat::JsonLine => rows
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        OutputFormat::Table | OutputFormat::Markdown | OutputFormat::Psv => return Ok(None),
    };
    Ok(Some(out))
}

/// Render rows in the given format.
///
/// Table formats and PSV use the row's [`Tabled`] headers and fields; JSON
/// formats go through [`to_json`].
#[cfg(feature = "display")]
pub fn render<T>(rows: &[T], format: OutputFormat) -> anyhow::Result<String>
where
    T: Serialize + Tabled,
{
    if let Some(json) = to_json(rows, format)? {
        return Ok(json);
    }

    let out = match format {
        OutputFormat::Markdown => Table::new(rows).with(Style::markdown()).to_string(),
        OutputFormat::Psv => {
            let mut lines = vec![T::headers().join("|")];
            lines.extend(rows.iter().map(|r| r.fields().join("|")));
            lines.join("\n")
        }
        _ => Table::new(rows).with(Style::rounded()).to_string(),
    };
    Ok(out)
}
