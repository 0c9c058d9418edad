use chrono::{Local, NaiveDateTime, Timelike};
use std::fmt;

/// Pattern used for timestamps and due dates in the data file.
pub const STORAGE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Pattern used when showing timestamps to the user.
pub const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Drops sub-second precision so a value survives the storage format unchanged.
pub fn whole_seconds(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

/// Current local time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    whole_seconds(Local::now().naive_local())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: u32,
    name: String,
    email: String,
    phone: String,
    notes: String,
    communications: Vec<Communication>,
    tasks: Vec<Task>,
}

impl Customer {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            notes: notes.into(),
            communications: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn set_phone(&mut self, phone: impl Into<String>) {
        self.phone = phone.into();
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Communications in insertion order.
    pub fn communications(&self) -> &[Communication] {
        &self.communications
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add_communication(&mut self, communication: Communication) {
        self.communications.push(communication);
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn task(&self, task_id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Name: {} | Email: {} | Phone: {} | Notes: {}",
            self.id, self.name, self.email, self.phone, self.notes
        )
    }
}

/// A logged interaction with a customer.
///
/// `channel` is free text; "phone", "email" and "meeting" are the
/// conventional values but nothing enforces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Communication {
    id: u32,
    customer_id: u32,
    channel: String,
    description: String,
    tags: String,
    timestamp: NaiveDateTime,
}

impl Communication {
    /// Creates a communication stamped with the current time.
    pub fn new(
        id: u32,
        customer_id: u32,
        channel: impl Into<String>,
        description: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(id, customer_id, channel, description, tags, now())
    }

    /// Rebuilds a communication whose timestamp is already known.
    pub fn with_timestamp(
        id: u32,
        customer_id: u32,
        channel: impl Into<String>,
        description: impl Into<String>,
        tags: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            customer_id,
            channel: channel.into(),
            description: description.into(),
            tags: tags.into(),
            timestamp: whole_seconds(timestamp),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn customer_id(&self) -> u32 {
        self.customer_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl fmt::Display for Communication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Type: {} | Time: {} | Description: {} | Tags: {}",
            self.id,
            self.channel,
            self.timestamp.format(DISPLAY_DATETIME_FORMAT),
            self.description,
            self.tags
        )
    }
}

/// A follow-up item for a customer. Only `completed` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: u32,
    customer_id: u32,
    description: String,
    due_date: NaiveDateTime,
    priority: String,
    completed: bool,
}

impl Task {
    pub fn new(
        id: u32,
        customer_id: u32,
        description: impl Into<String>,
        due_date: NaiveDateTime,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            id,
            customer_id,
            description: description.into(),
            due_date: whole_seconds(due_date),
            priority: priority.into(),
            completed: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn customer_id(&self) -> u32 {
        self.customer_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_date(&self) -> NaiveDateTime {
        self.due_date
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "COMPLETED" } else { "PENDING" };
        write!(
            f,
            "ID: {} | {} | Due: {} | Priority: {} | Description: {}",
            self.id,
            status,
            self.due_date.format(DISPLAY_DATETIME_FORMAT),
            self.priority,
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn john() -> Customer {
        Customer::new(1, "John Doe", "john@example.com", "123-456-7890", "VIP Customer")
    }

    #[test]
    fn new_customer_has_fields_and_no_children() {
        let customer = john();
        assert_eq!(customer.id(), 1);
        assert_eq!(customer.name(), "John Doe");
        assert_eq!(customer.email(), "john@example.com");
        assert_eq!(customer.phone(), "123-456-7890");
        assert_eq!(customer.notes(), "VIP Customer");
        assert!(customer.communications().is_empty());
        assert!(customer.tasks().is_empty());
    }

    #[test]
    fn setters_update_fields() {
        let mut customer = john();
        customer.set_name("John Smith");
        customer.set_email("johnsmith@example.com");
        customer.set_phone("555-555-5555");
        customer.set_notes("Updated notes");

        assert_eq!(customer.name(), "John Smith");
        assert_eq!(customer.email(), "johnsmith@example.com");
        assert_eq!(customer.phone(), "555-555-5555");
        assert_eq!(customer.notes(), "Updated notes");
        assert_eq!(customer.id(), 1);
    }

    #[test]
    fn empty_fields_are_kept_as_is() {
        let customer = Customer::new(7, "", "", "", "");
        assert_eq!(customer.name(), "");
        assert_eq!(customer.notes(), "");
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut customer = john();
        customer.add_communication(Communication::new(1, 1, "email", "Follow-up call", "urgent"));
        customer.add_communication(Communication::new(2, 1, "phone", "Initial contact", "sales"));
        customer.add_task(Task::new(1, 1, "Call customer", at(9, 0, 0), "high"));
        customer.add_task(Task::new(2, 1, "Send proposal", at(10, 0, 0), "medium"));

        let comm_ids: Vec<u32> = customer.communications().iter().map(|c| c.id()).collect();
        let task_ids: Vec<u32> = customer.tasks().iter().map(|t| t.id()).collect();
        assert_eq!(comm_ids, vec![1, 2]);
        assert_eq!(task_ids, vec![1, 2]);
    }

    #[test]
    fn task_defaults_to_pending_and_can_complete() {
        let mut customer = john();
        customer.add_task(Task::new(3, 1, "Call customer", now() + Duration::days(1), "high"));
        assert!(!customer.task(3).unwrap().is_completed());

        customer.task_mut(3).unwrap().set_completed(true);
        assert!(customer.task(3).unwrap().is_completed());
        assert!(customer.task_mut(99).is_none());
    }

    #[test]
    fn timestamps_drop_sub_second_precision() {
        let precise = at(8, 30, 15) + Duration::milliseconds(750);
        let comm = Communication::with_timestamp(1, 1, "meeting", "Kickoff", "", precise);
        assert_eq!(comm.timestamp(), at(8, 30, 15));

        let task = Task::new(1, 1, "Prep", precise, "low");
        assert_eq!(task.due_date(), at(8, 30, 15));
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            john().to_string(),
            "ID: 1 | Name: John Doe | Email: john@example.com | Phone: 123-456-7890 | Notes: VIP Customer"
        );

        let comm = Communication::with_timestamp(4, 1, "email", "Sent quote", "sales", at(14, 5, 59));
        assert_eq!(
            comm.to_string(),
            "ID: 4 | Type: email | Time: 2024-03-15 14:05 | Description: Sent quote | Tags: sales"
        );

        let mut task = Task::new(2, 1, "Call back", at(9, 0, 0), "high");
        assert_eq!(
            task.to_string(),
            "ID: 2 | PENDING | Due: 2024-03-15 09:00 | Priority: high | Description: Call back"
        );
        task.set_completed(true);
        assert!(task.to_string().contains("| COMPLETED |"));
    }
}
