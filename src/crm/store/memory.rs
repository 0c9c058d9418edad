use super::DataStore;
use crate::error::{CrmError, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// In-memory document store for testing.
///
/// Clones share the same document, so a test can keep a handle to inspect
/// what the repository wrote or to seed what it will read.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    document: Rc<RefCell<Option<String>>>,
    writes: Rc<Cell<usize>>,
    simulate_write_error: Rc<Cell<bool>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `contents`, as if a previous run saved it.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::new();
        *store.document.borrow_mut() = Some(contents.into());
        store
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Current document, if any.
    pub fn contents(&self) -> Option<String> {
        self.document.borrow().clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl DataStore for InMemoryStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.document.borrow().clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(CrmError::Store("Simulated write error".to_string()));
        }
        *self.document.borrow_mut() = Some(contents.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
