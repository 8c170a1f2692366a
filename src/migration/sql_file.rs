//! Migrations written as plain SQL files
//!
//! A migration file is named after its identifier,
//! `Version<digits>[_<name>].sql`, and holds an up and a down section:
//!
//! ```sql
//! -- migrate:up
//! CREATE TABLE dtb_note (note_id INTEGER PRIMARY KEY, body TEXT);
//!
//! -- migrate:up pgsql
//! CREATE TABLE dtb_note (note_id SERIAL PRIMARY KEY, body TEXT);
//!
//! -- migrate:down
//! DROP TABLE dtb_note;
//! ```
//!
//! A section tagged with a dialect name replaces the untagged section on that
//! dialect. Statements are separated by `;` outside of quotes and comments.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::{Migration, MigrationContext, MigrationFactory, MigrationRegistry};
use crate::error::{Error, Result};
use crate::platform::DialectName;
use crate::version::{MigrationId, VERSION_PREFIX};

const UP_MARKER: &str = "-- migrate:up";
const DOWN_MARKER: &str = "-- migrate:down";
const SQL_EXTENSION: &str = "sql";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Statements of one direction: the untagged default plus dialect overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Section {
    present: bool,
    default: Vec<String>,
    overrides: Vec<(DialectName, Vec<String>)>,
}

impl Section {
    fn statements(&self, dialect: DialectName) -> &[String] {
        self.overrides
            .iter()
            .find(|(d, _)| *d == dialect)
            .map(|(_, s)| s.as_slice())
            .unwrap_or(&self.default)
    }
}

/// A migration loaded from a `.sql` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFileMigration {
    id: MigrationId,
    up: Section,
    down: Section,
}

impl SqlFileMigration {
    /// Parse the contents of a migration file.
    pub fn parse(identifier: &str, content: &str) -> Result<Self> {
        let id = MigrationId::parse(identifier)?;
        let mut up = Section::default();
        let mut down = Section::default();

        // (direction, dialect) of the section being read, and its raw text
        let mut current: Option<(Direction, Option<DialectName>)> = None;
        let mut buffer = String::new();

        for line in content.lines() {
            if let Some(marker) = parse_marker(identifier, line)? {
                if let Some(section) = current.take() {
                    store(&mut up, &mut down, section, &buffer);
                }
                buffer.clear();
                current = Some(marker);
                continue;
            }

            if current.is_none() {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with("--") {
                    return Err(Error::invalid_migration(
                        identifier,
                        "SQL found before the first '-- migrate:up' or '-- migrate:down' marker",
                    ));
                }
                continue;
            }

            buffer.push_str(line);
            buffer.push('\n');
        }
        if let Some(section) = current {
            store(&mut up, &mut down, section, &buffer);
        }

        if !up.present {
            return Err(Error::invalid_migration(identifier, "missing '-- migrate:up' section"));
        }
        if !down.present {
            return Err(Error::invalid_migration(
                identifier,
                "missing '-- migrate:down' section",
            ));
        }

        Ok(SqlFileMigration { id, up, down })
    }

    /// Load a migration file; the identifier is the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let identifier = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidMigrationId(path.display().to_string()))?;
        let content = fs::read_to_string(path)?;
        Self::parse(identifier, &content)
    }

    pub fn id(&self) -> &MigrationId {
        &self.id
    }

    pub fn up_statements(&self, dialect: DialectName) -> &[String] {
        self.up.statements(dialect)
    }

    pub fn down_statements(&self, dialect: DialectName) -> &[String] {
        self.down.statements(dialect)
    }
}

impl Migration for SqlFileMigration {
    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        for sql in self.up_statements(ctx.dialect()) {
            ctx.execute(sql)?;
        }
        Ok(())
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        for sql in self.down_statements(ctx.dialect()) {
            ctx.execute(sql)?;
        }
        Ok(())
    }
}

fn parse_marker(
    identifier: &str,
    line: &str,
) -> Result<Option<(Direction, Option<DialectName>)>> {
    let trimmed = line.trim();
    let (direction, rest) = if let Some(rest) = trimmed.strip_prefix(UP_MARKER) {
        (Direction::Up, rest)
    } else if let Some(rest) = trimmed.strip_prefix(DOWN_MARKER) {
        (Direction::Down, rest)
    } else {
        return Ok(None);
    };

    // `-- migrate:upgrade` is an ordinary comment
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Ok(None);
    }

    let tag = rest.trim();
    if tag.is_empty() {
        return Ok(Some((direction, None)));
    }
    let dialect = tag.parse::<DialectName>().map_err(|_| {
        Error::invalid_migration(identifier, format!("unknown dialect '{}' in section marker", tag))
    })?;
    Ok(Some((direction, Some(dialect))))
}

fn store(
    up: &mut Section,
    down: &mut Section,
    (direction, dialect): (Direction, Option<DialectName>),
    text: &str,
) {
    let section = match direction {
        Direction::Up => up,
        Direction::Down => down,
    };
    section.present = true;

    let statements = split_statements(text);
    match dialect {
        None => section.default.extend(statements),
        Some(d) => match section.overrides.iter_mut().find(|(x, _)| *x == d) {
            Some((_, existing)) => existing.extend(statements),
            None => section.overrides.push((d, statements)),
        },
    }
}

/// Split SQL text into statements on `;`, ignoring separators inside quoted
/// strings (with `''` or `\'` escapes), quoted identifiers, `$$` bodies and
/// comments. Comments are dropped
/// and statements are returned trimmed, without the trailing `;`.
pub fn split_statements(sql: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Quoted(char),
        Dollar,
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                ';' => {
                    push_statement(&mut statements, &mut current);
                }
                '\'' | '"' | '`' => {
                    state = State::Quoted(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '$' if chars.peek() == Some(&'$') => {
                    chars.next();
                    current.push_str("$$");
                    state = State::Dollar;
                }
                _ => current.push(c),
            },
            State::Quoted(quote) => {
                current.push(c);
                if c == '\\' && quote != '`' {
                    // MySQL escape: the next character never closes the string
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if c == quote {
                    // a doubled quote closes and reopens, which leaves us inside
                    state = State::Code;
                }
            }
            State::Dollar => {
                current.push(c);
                if c == '$' && chars.peek() == Some(&'$') {
                    chars.next();
                    current.push('$');
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    current.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    current.push(' ');
                    state = State::Code;
                }
            }
        }
    }
    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// Load every `Version*.sql` file in `dir` into a registry.
///
/// A missing directory yields an empty registry. Other files are ignored.
pub fn discover_directory(dir: &Path) -> Result<MigrationRegistry> {
    let mut registry = MigrationRegistry::new();
    if !dir.is_dir() {
        debug!(path = %dir.display(), "migrations directory not found");
        return Ok(registry);
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_sql = path.extension().is_some_and(|ext| ext == SQL_EXTENSION);
        let is_migration = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(VERSION_PREFIX));
        if path.is_file() && is_sql && is_migration {
            paths.push(path);
        }
    }
    // registration order does not matter, but errors should be reproducible
    paths.sort();

    for path in paths {
        let migration = Arc::new(SqlFileMigration::load(&path)?);
        let identifier = migration.id().to_string();
        let factory: MigrationFactory =
            Arc::new(move || Box::new(migration.as_ref().clone()) as Box<dyn Migration>);
        registry.register_factory(&identifier, factory)?;
    }

    debug!(path = %dir.display(), count = registry.len(), "discovered SQL migrations");
    Ok(registry)
}

/// Write an empty migration file named `Version<YYYYMMDDHHMMSS>_<name>.sql`.
///
/// Characters other than ASCII letters, digits and `_` in `name` become `_`.
/// An existing file is never overwritten.
pub fn create_migration_file(dir: &Path, name: &str, now: NaiveDateTime) -> Result<PathBuf> {
    let name: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        return Err(Error::InvalidMigrationId(format!(
            "{}{}_",
            VERSION_PREFIX,
            now.format("%Y%m%d%H%M%S")
        )));
    }

    let identifier = format!("{}{}_{}", VERSION_PREFIX, now.format("%Y%m%d%H%M%S"), name);
    let id = MigrationId::parse(&identifier)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", id, SQL_EXTENSION));
    if path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("migration file already exists: {}", path.display()),
        )));
    }

    let template = format!(
        "-- {}\n\
         -- Created: {}\n\
         \n\
         {}\n\
         \n\
         \n\
         {}\n\
         \n",
        id,
        now.format("%Y-%m-%d %H:%M:%S"),
        UP_MARKER,
        DOWN_MARKER
    );
    fs::write(&path, template)?;

    info!(path = %path.display(), "created migration file");
    Ok(path)
}
