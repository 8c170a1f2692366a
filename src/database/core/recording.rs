//! Statement recorder
//!
//! [`RecordingHandle`] executes nothing. It keeps every statement and query it
//! receives, answers queries from scripted responses, and can be told to fail on
//! statements matching a pattern. The CLI uses it for dry runs; tests use it to
//! observe exactly which SQL the engine issues.

use std::cell::RefCell;

use super::handle::{DatabaseHandle, Row};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct RecordingHandle {
    statements: RefCell<Vec<String>>,
    queries: RefCell<Vec<String>>,
    responses: RefCell<Vec<(String, Vec<Row>)>>,
    failures: RefCell<Vec<String>>,
}

impl RecordingHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any query containing `pattern` with `rows`. Earlier patterns win.
    pub fn respond(&self, pattern: &str, rows: Vec<Row>) {
        self.responses
            .borrow_mut()
            .push((pattern.to_string(), rows));
    }

    /// Fail any statement or query containing `pattern`.
    pub fn fail_on(&self, pattern: &str) {
        self.failures.borrow_mut().push(pattern.to_string());
    }

    /// Statements executed so far, in order. Failed statements are included.
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// Queries run so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    /// Drain the recorded statements.
    pub fn take_statements(&self) -> Vec<String> {
        std::mem::take(&mut *self.statements.borrow_mut())
    }

    fn failure_for(&self, sql: &str) -> Option<String> {
        self.failures
            .borrow()
            .iter()
            .find(|pattern| sql.contains(pattern.as_str()))
            .map(|pattern| format!("simulated failure on statement matching '{}'", pattern))
    }
}

impl DatabaseHandle for RecordingHandle {
    fn execute(&self, sql: &str) -> Result<()> {
        self.statements.borrow_mut().push(sql.to_string());
        match self.failure_for(sql) {
            Some(message) => Err(Error::execution(sql, message)),
            None => Ok(()),
        }
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.queries.borrow_mut().push(sql.to_string());
        if let Some(message) = self.failure_for(sql) {
            return Err(Error::query(sql, message));
        }

        Ok(self
            .responses
            .borrow()
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}
