use crate::ids::EntityKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(u32),

    #[error("Task {task_id} not found for customer {customer_id}")]
    TaskNotFound { customer_id: u32, task_id: u32 },

    #[error("Record belongs to customer {found}, not customer {expected}")]
    OwnerMismatch { expected: u32, found: u32 },

    #[error("No {0} IDs left to allocate")]
    IdsExhausted(EntityKind),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, CrmError>;
