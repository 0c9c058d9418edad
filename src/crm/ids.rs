//! # Identity Allocation
//!
//! Every entity kind draws its IDs from its own monotonic counter. Counters
//! start at 1 and only move forward: [`IdAllocator::next`] hands out the
//! current value and bumps it, [`IdAllocator::reseed`] jumps it after a reload
//! so that no ID found in the data file is ever handed out again.
//!
//! The three counters are independent, so a customer, a communication and a
//! task may share the same numeric ID.
//!
//! IDs stop at [`MAX_ID`]. Once a counter is past it, [`IdAllocator::next`]
//! fails instead of wrapping around.
//!
//! An allocator belongs to a single repository instance. Two repositories
//! (e.g. in tests) never see each other's counters.

use crate::error::{CrmError, Result};
use std::fmt;

const FIRST_ID: u32 = 1;

/// Largest ID that can be allocated or read back from a data file.
pub const MAX_ID: u32 = u32::MAX - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Customer,
    Communication,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Customer => write!(f, "customer"),
            EntityKind::Communication => write!(f, "communication"),
            EntityKind::Task => write!(f, "task"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    customer: u32,
    communication: u32,
    task: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            customer: FIRST_ID,
            communication: FIRST_ID,
            task: FIRST_ID,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current counter for `kind`, then advances it.
    pub fn next(&mut self, kind: EntityKind) -> Result<u32> {
        let counter = self.counter_mut(kind);
        let id = *counter;
        if id > MAX_ID {
            return Err(CrmError::IdsExhausted(kind));
        }
        *counter += 1;
        Ok(id)
    }

    /// The value the next call to [`IdAllocator::next`] will return.
    pub fn peek(&self, kind: EntityKind) -> u32 {
        match kind {
            EntityKind::Customer => self.customer,
            EntityKind::Communication => self.communication,
            EntityKind::Task => self.task,
        }
    }

    /// Sets the counter for `kind` so the next allocation returns `value`.
    pub fn reseed(&mut self, kind: EntityKind, value: u32) {
        *self.counter_mut(kind) = value;
    }

    fn counter_mut(&mut self, kind: EntityKind) -> &mut u32 {
        match kind {
            EntityKind::Customer => &mut self.customer,
            EntityKind::Communication => &mut self.communication,
            EntityKind::Task => &mut self.task,
        }
    }
}
