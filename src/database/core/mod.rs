//! Core database infrastructure
//!
//! - `DatabaseHandle`: the execute/query capability every backend provides
//! - `DatabaseConn`: SQLite backend
//! - `RecordingHandle`: statement recorder for dry runs and tests

mod connection;
mod handle;
mod recording;

pub use connection::DatabaseConn;
pub use handle::{DatabaseHandle, Row};
pub use recording::RecordingHandle;
