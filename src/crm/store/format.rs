//! The pipe-delimited line format of the data file.
//!
//! ```text
//! CUSTOMER|<id>|<name>|<email>|<phone>|<notes>
//! COMMUNICATION|<id>|<customerId>|<type>|<description>|<timestamp>|<tags>
//! TASK|<id>|<customerId>|<description>|<dueDate>|<priority>|<completed>
//! ```
//!
//! Customers are written in order, each followed by its communications and
//! then its tasks. Free text is written verbatim: a `|` inside a field
//! shifts the columns and the file will no longer load.

use crate::error::{CrmError, Result};
use crate::ids::{EntityKind, MAX_ID};
use crate::model::{Communication, Customer, Task, STORAGE_DATETIME_FORMAT};
use chrono::NaiveDateTime;

pub const FIELD_SEPARATOR: char = '|';

const CUSTOMER_TAG: &str = "CUSTOMER";
const COMMUNICATION_TAG: &str = "COMMUNICATION";
const TASK_TAG: &str = "TASK";

const CUSTOMER_FIELDS: usize = 6;
const COMMUNICATION_FIELDS: usize = 7;
const TASK_FIELDS: usize = 7;

/// Serializes the whole customer graph.
pub fn encode(customers: &[Customer]) -> String {
    let mut out = String::new();
    for customer in customers {
        encode_customer(customer, &mut out);
    }
    out
}

/// Appends one customer line followed by all of its children.
pub fn encode_customer(customer: &Customer, out: &mut String) {
    push_record(
        out,
        &[
            CUSTOMER_TAG,
            &customer.id().to_string(),
            customer.name(),
            customer.email(),
            customer.phone(),
            customer.notes(),
        ],
    );
    for comm in customer.communications() {
        push_record(
            out,
            &[
                COMMUNICATION_TAG,
                &comm.id().to_string(),
                &comm.customer_id().to_string(),
                comm.channel(),
                comm.description(),
                &comm.timestamp().format(STORAGE_DATETIME_FORMAT).to_string(),
                comm.tags(),
            ],
        );
    }
    for task in customer.tasks() {
        push_record(
            out,
            &[
                TASK_TAG,
                &task.id().to_string(),
                &task.customer_id().to_string(),
                task.description(),
                &task.due_date().format(STORAGE_DATETIME_FORMAT).to_string(),
                task.priority(),
                if task.is_completed() { "true" } else { "false" },
            ],
        );
    }
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(FIELD_SEPARATOR);
        }
        out.push_str(field);
    }
    out.push('\n');
}

/// A single parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Customer(Customer),
    Communication(Communication),
    Task(Task),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Customer(_) => EntityKind::Customer,
            Record::Communication(_) => EntityKind::Communication,
            Record::Task(_) => EntityKind::Task,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Record::Customer(c) => c.id(),
            Record::Communication(c) => c.id(),
            Record::Task(t) => t.id(),
        }
    }
}

/// Parses one line. `line_no` is 1-based and only used in error messages.
///
/// Blank lines and lines with an unknown record tag yield `Ok(None)`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Record>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let record = match parts[0] {
        CUSTOMER_TAG => {
            expect_fields(&parts, CUSTOMER_FIELDS, line_no)?;
            Record::Customer(Customer::new(
                parse_id(parts[1], line_no)?,
                parts[2],
                parts[3],
                parts[4],
                parts[5],
            ))
        }
        COMMUNICATION_TAG => {
            expect_fields(&parts, COMMUNICATION_FIELDS, line_no)?;
            Record::Communication(Communication::with_timestamp(
                parse_id(parts[1], line_no)?,
                parse_id(parts[2], line_no)?,
                parts[3],
                parts[4],
                parts[6],
                parse_datetime(parts[5], line_no)?,
            ))
        }
        TASK_TAG => {
            expect_fields(&parts, TASK_FIELDS, line_no)?;
            let mut task = Task::new(
                parse_id(parts[1], line_no)?,
                parse_id(parts[2], line_no)?,
                parts[3],
                parse_datetime(parts[4], line_no)?,
                parts[5],
            );
            task.set_completed(parse_flag(parts[6]));
            Record::Task(task)
        }
        other => {
            log::warn!(
                "event=load_skip line={} reason=unknown_record tag={:?}",
                line_no,
                other
            );
            return Ok(None);
        }
    };
    Ok(Some(record))
}

fn expect_fields(parts: &[&str], expected: usize, line_no: usize) -> Result<()> {
    if parts.len() != expected {
        return Err(CrmError::Parse {
            line: line_no,
            message: format!(
                "expected {} fields for {} record, found {}",
                expected,
                parts[0],
                parts.len()
            ),
        });
    }
    Ok(())
}

fn parse_id(raw: &str, line_no: usize) -> Result<u32> {
    let id = raw.parse::<u32>().map_err(|e| CrmError::Parse {
        line: line_no,
        message: format!("invalid id {:?}: {}", raw, e),
    })?;
    if id > MAX_ID {
        return Err(CrmError::Parse {
            line: line_no,
            message: format!("id {} is above the maximum of {}", id, MAX_ID),
        });
    }
    Ok(id)
}

fn parse_datetime(raw: &str, line_no: usize) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, STORAGE_DATETIME_FORMAT).map_err(|e| CrmError::Parse {
        line: line_no,
        message: format!("invalid date {:?} (expected yyyy-MM-dd HH:mm:ss): {}", raw, e),
    })
}

// Anything other than a case-insensitive "true" reads as false.
fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Highest ID seen per kind while decoding, orphans included.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaxIds {
    pub customer: u32,
    pub communication: u32,
    pub task: u32,
}

impl MaxIds {
    fn observe(&mut self, kind: EntityKind, id: u32) {
        let slot = match kind {
            EntityKind::Customer => &mut self.customer,
            EntityKind::Communication => &mut self.communication,
            EntityKind::Task => &mut self.task,
        };
        if id > *slot {
            *slot = id;
        }
    }

    pub fn get(&self, kind: EntityKind) -> u32 {
        match kind {
            EntityKind::Customer => self.customer,
            EntityKind::Communication => self.communication,
            EntityKind::Task => self.task,
        }
    }
}

/// Result of decoding a whole file.
#[derive(Debug, Default)]
pub struct Decoded {
    pub customers: Vec<Customer>,
    pub max_ids: MaxIds,
    /// Child records whose customer had not been seen yet.
    pub orphans: usize,
}

/// Rebuilds the customer graph from file contents.
///
/// Children attach to the first already-decoded customer with a matching
/// ID. A child whose customer has not appeared yet is dropped.
pub fn decode(text: &str) -> Result<Decoded> {
    let mut decoded = Decoded::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let Some(record) = parse_line(line, line_no)? else {
            continue;
        };
        decoded.max_ids.observe(record.kind(), record.id());

        match record {
            Record::Customer(customer) => decoded.customers.push(customer),
            Record::Communication(comm) => {
                match find_owner(&mut decoded.customers, comm.customer_id()) {
                    Some(owner) => owner.add_communication(comm),
                    None => decoded.drop_orphan(EntityKind::Communication, comm.id(), line_no),
                }
            }
            Record::Task(task) => match find_owner(&mut decoded.customers, task.customer_id()) {
                Some(owner) => owner.add_task(task),
                None => decoded.drop_orphan(EntityKind::Task, task.id(), line_no),
            },
        }
    }

    Ok(decoded)
}

impl Decoded {
    fn drop_orphan(&mut self, kind: EntityKind, id: u32, line_no: usize) {
        log::debug!(
            "event=load_orphan kind={} id={} line={}",
            kind,
            id,
            line_no
        );
        self.orphans += 1;
    }
}

fn find_owner(customers: &mut [Customer], customer_id: u32) -> Option<&mut Customer> {
    customers.iter_mut().find(|c| c.id() == customer_id)
}
