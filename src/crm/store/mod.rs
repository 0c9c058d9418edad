//! # Storage Layer
//!
//! The repository keeps its whole customer graph in memory and persists it as
//! a single text document. This module splits that into two concerns:
//!
//! - [`format`]: turning customers into lines of text and back.
//! - [`DataStore`]: where that text lives.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: Production file-based storage
//!   - One flat file (`customers.txt` by default), rewritten on every save
//!   - Optional write-to-temp-then-rename so a crash mid-save cannot leave a
//!     half-written file behind
//!
//! - [`memory::InMemoryStore`]: In-memory storage for testing
//!   - No persistence
//!   - Can simulate write failures

use crate::error::Result;

pub mod format;
pub mod fs;
pub mod memory;

/// Abstract interface for the persisted document.
pub trait DataStore {
    /// Read the full document. Returns `Ok(None)` if nothing has been saved yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the full document.
    fn write(&mut self, contents: &str) -> Result<()>;

    /// Human readable location, used in user-facing messages.
    fn location(&self) -> String;
}
