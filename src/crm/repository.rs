//! # Repository
//!
//! The repository owns every customer (and, through them, every
//! communication and task), the identity allocator, and the notification
//! hub. It is the only thing that mutates persisted state.
//!
//! Every mutation follows the same sequence:
//!
//! 1. Change the in-memory graph.
//! 2. Rewrite the whole data file.
//! 3. Publish one notification describing the change.
//!
//! A failed save does not undo step 1 and does not stop step 3. It is handed
//! back as [`SaveStatus::Failed`] so the caller can tell the user, and a later
//! save can still succeed.
//!
//! Exactly one repository should exist per process. That is the caller's job:
//! nothing here is global.

use crate::error::{CrmError, Result};
use crate::ids::{EntityKind, IdAllocator};
use crate::model::{Communication, Customer, Task};
use crate::notify::{NotificationHub, Subscriber, SubscriptionId};
use crate::report::{CustomerReport, OverallReport};
use crate::store::format;
use crate::store::DataStore;
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};

pub const DEFAULT_USER: &str = "Default User";

/// Outcome of the save that follows a mutation.
#[derive(Debug)]
#[must_use]
pub enum SaveStatus {
    Saved,
    Failed(CrmError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No data file yet.
    Fresh,
    Loaded { customers: usize, orphans: usize },
}

pub struct Repository<S: DataStore> {
    store: S,
    customers: Vec<Customer>,
    ids: IdAllocator,
    hub: NotificationHub,
    current_user: String,
}

impl<S: DataStore> Repository<S> {
    /// Creates an empty repository without reading the store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            customers: Vec::new(),
            ids: IdAllocator::new(),
            hub: NotificationHub::new(),
            current_user: DEFAULT_USER.to_string(),
        }
    }

    /// Creates a repository and loads whatever the store holds.
    pub fn open(store: S) -> Result<Self> {
        let mut repo = Self::new(store);
        repo.load()?;
        Ok(repo)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    // --- Factories ---

    /// Builds a customer with the next customer ID. It is not added yet.
    pub fn new_customer(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<Customer> {
        let id = self.ids.next(EntityKind::Customer)?;
        Ok(Customer::new(id, name, email, phone, notes))
    }

    /// Builds a communication stamped with the current time.
    pub fn new_communication(
        &mut self,
        customer_id: u32,
        channel: impl Into<String>,
        description: impl Into<String>,
        tags: impl Into<String>,
    ) -> Result<Communication> {
        let id = self.ids.next(EntityKind::Communication)?;
        Ok(Communication::new(
            id,
            customer_id,
            channel,
            description,
            tags,
        ))
    }

    pub fn new_task(
        &mut self,
        customer_id: u32,
        description: impl Into<String>,
        due_date: NaiveDateTime,
        priority: impl Into<String>,
    ) -> Result<Task> {
        let id = self.ids.next(EntityKind::Task)?;
        Ok(Task::new(id, customer_id, description, due_date, priority))
    }

    // --- Session ---

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn set_current_user(&mut self, user: impl Into<String>) {
        self.current_user = user.into();
    }

    // --- Notifications ---

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) -> SubscriptionId {
        self.hub.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Publishes a message to every subscriber.
    pub fn notify(&mut self, message: &str) -> usize {
        self.hub.publish(message)
    }

    // --- Queries ---

    /// All customers in insertion order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn find_customer_by_id(&self, id: u32) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id() == id)
    }

    /// Customers whose name or email contains `keyword` ignoring case, or
    /// whose phone contains it exactly. Source order is kept.
    pub fn search_customers(&self, keyword: &str) -> Vec<&Customer> {
        let needle = keyword.to_lowercase();
        self.customers
            .iter()
            .filter(|c| {
                c.name().to_lowercase().contains(&needle)
                    || c.email().to_lowercase().contains(&needle)
                    || c.phone().contains(keyword)
            })
            .collect()
    }

    pub fn generate_customer_report(&self, id: u32) -> Option<CustomerReport<'_>> {
        self.find_customer_by_id(id).map(CustomerReport::new)
    }

    pub fn generate_overall_report(&self) -> OverallReport {
        OverallReport::from_customers(&self.customers)
    }

    // --- Mutations ---

    pub fn add_customer(&mut self, customer: Customer) -> SaveStatus {
        let message = format!("New customer added: {}", customer.name());
        info!(
            "event=customer_add id={} user={:?}",
            customer.id(),
            self.current_user
        );
        self.customers.push(customer);
        let status = self.persist();
        self.hub.publish(&message);
        status
    }

    /// Appends `comm` to the customer's history.
    ///
    /// Returns [`CrmError::OwnerMismatch`] if `comm` was built for another
    /// customer, or [`CrmError::CustomerNotFound`] if no such customer exists.
    /// Either way nothing is changed, saved or published.
    pub fn add_communication_to_customer(
        &mut self,
        customer_id: u32,
        comm: Communication,
    ) -> Result<SaveStatus> {
        if comm.customer_id() != customer_id {
            warn!(
                "event=communication_add status=rejected id={} owner={} target={} reason=owner_mismatch",
                comm.id(),
                comm.customer_id(),
                customer_id
            );
            return Err(CrmError::OwnerMismatch {
                expected: customer_id,
                found: comm.customer_id(),
            });
        }
        let customer = self.customer_mut(customer_id)?;
        let message = format!("Communication logged for {}", customer.name());
        info!(
            "event=communication_add id={} customer={}",
            comm.id(),
            customer_id
        );
        customer.add_communication(comm);

        let status = self.persist();
        self.hub.publish(&message);
        Ok(status)
    }

    /// Appends `task` to the customer's follow-ups. Fails like
    /// [`Repository::add_communication_to_customer`].
    pub fn add_task_to_customer(&mut self, customer_id: u32, task: Task) -> Result<SaveStatus> {
        if task.customer_id() != customer_id {
            warn!(
                "event=task_add status=rejected id={} owner={} target={} reason=owner_mismatch",
                task.id(),
                task.customer_id(),
                customer_id
            );
            return Err(CrmError::OwnerMismatch {
                expected: customer_id,
                found: task.customer_id(),
            });
        }
        let customer = self.customer_mut(customer_id)?;
        let message = format!(
            "Task created for {}: {}",
            customer.name(),
            task.description()
        );
        info!("event=task_add id={} customer={}", task.id(), customer_id);
        customer.add_task(task);

        let status = self.persist();
        self.hub.publish(&message);
        Ok(status)
    }

    /// Marks one of the customer's tasks as completed.
    pub fn complete_task(&mut self, customer_id: u32, task_id: u32) -> Result<SaveStatus> {
        let customer = self.customer_mut(customer_id)?;
        let name = customer.name().to_string();
        let task = customer.task_mut(task_id).ok_or(CrmError::TaskNotFound {
            customer_id,
            task_id,
        })?;
        task.set_completed(true);
        let message = format!("Task completed for {}: {}", name, task.description());
        info!(
            "event=task_complete id={} customer={}",
            task_id, customer_id
        );

        let status = self.persist();
        self.hub.publish(&message);
        Ok(status)
    }

    fn customer_mut(&mut self, id: u32) -> Result<&mut Customer> {
        self.customers
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(CrmError::CustomerNotFound(id))
    }

    // --- Persistence ---

    /// Rewrites the whole data file from the in-memory graph.
    pub fn save(&mut self) -> Result<()> {
        let document = format::encode(&self.customers);
        self.store.write(&document)?;
        debug!(
            "event=save status=ok customers={} bytes={} location={}",
            self.customers.len(),
            document.len(),
            self.store.location()
        );
        Ok(())
    }

    /// Saves and logs a failure instead of returning it.
    pub fn persist(&mut self) -> SaveStatus {
        match self.save() {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                error!(
                    "event=save status=error location={} err={}",
                    self.store.location(),
                    e
                );
                SaveStatus::Failed(e)
            }
        }
    }

    /// Replaces the in-memory graph with the store's contents.
    ///
    /// A missing data file is not an error. A malformed line aborts the
    /// whole load and leaves the repository as it was.
    pub fn load(&mut self) -> Result<LoadOutcome> {
        let Some(document) = self.store.read()? else {
            info!(
                "event=load status=fresh location={}",
                self.store.location()
            );
            self.customers.clear();
            return Ok(LoadOutcome::Fresh);
        };

        let decoded = format::decode(&document)?;
        for kind in [
            EntityKind::Customer,
            EntityKind::Communication,
            EntityKind::Task,
        ] {
            self.ids
                .reseed(kind, decoded.max_ids.get(kind).saturating_add(1));
        }
        self.customers = decoded.customers;

        info!(
            "event=load status=ok customers={} orphans={} location={}",
            self.customers.len(),
            decoded.orphans,
            self.store.location()
        );
        Ok(LoadOutcome::Loaded {
            customers: self.customers.len(),
            orphans: decoded.orphans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MAX_ID;
    use crate::model::now;
    use crate::store::memory::InMemoryStore;
    use chrono::Duration;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn repo() -> Repository<InMemoryStore> {
        Repository::new(InMemoryStore::new())
    }

    fn listen(repo: &mut Repository<InMemoryStore>) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        repo.subscribe(Box::new(move |m: &str| sink.borrow_mut().push(m.to_string())));
        log
    }

    fn add(repo: &mut Repository<InMemoryStore>, name: &str, email: &str, phone: &str) -> u32 {
        let customer = repo.new_customer(name, email, phone, "").unwrap();
        let id = customer.id();
        assert!(repo.add_customer(customer).is_saved());
        id
    }

    #[test]
    fn customer_ids_increase_from_one() {
        let mut repo = repo();
        let ids: Vec<u32> = (0..4)
            .map(|i| add(&mut repo, &format!("C{i}"), "", ""))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(repo.customers().iter().all(|c| c.tasks().is_empty()));
    }

    #[test]
    fn add_customer_saves_and_notifies() {
        let mut repo = repo();
        let log = listen(&mut repo);
        add(&mut repo, "John Doe", "john@example.com", "123");

        assert_eq!(*log.borrow(), vec!["New customer added: John Doe"]);
        assert_eq!(repo.store().write_count(), 1);
        assert!(repo
            .store()
            .contents()
            .unwrap()
            .starts_with("CUSTOMER|1|John Doe|john@example.com|123|"));
    }

    #[test]
    fn find_customer_by_id_misses_with_none() {
        let mut repo = repo();
        add(&mut repo, "A", "", "");
        assert_eq!(repo.find_customer_by_id(1).map(|c| c.name()), Some("A"));
        assert!(repo.find_customer_by_id(2).is_none());
    }

    #[test]
    fn search_is_case_insensitive_on_name_and_email_only() {
        let mut repo = repo();
        add(&mut repo, "John Doe", "john@example.com", "555-0100");
        add(&mut repo, "Jane Smith", "JANE@Example.com", "555-0199");
        add(&mut repo, "Bob", "bob@work.org", "x-ABC");

        let names = |hits: Vec<&Customer>| hits.iter().map(|c| c.name().to_string()).collect::<Vec<_>>();

        assert_eq!(names(repo.search_customers("doe")), vec!["John Doe"]);
        assert_eq!(names(repo.search_customers("EXAMPLE")), vec!["John Doe", "Jane Smith"]);
        assert_eq!(names(repo.search_customers("0199")), vec!["Jane Smith"]);
        assert_eq!(names(repo.search_customers("x-ABC")), vec!["Bob"]);
        assert!(repo.search_customers("x-abc").is_empty());
        assert_eq!(repo.search_customers("").len(), 3);
    }

    #[test]
    fn communication_and_task_flow() {
        let mut repo = repo();
        let log = listen(&mut repo);
        let id = add(&mut repo, "John Doe", "john@example.com", "123-456-7890");
        assert_eq!(id, 1);

        let comm = repo
            .new_communication(id, "email", "Follow-up call", "urgent")
            .unwrap();
        assert!(repo.add_communication_to_customer(id, comm).unwrap().is_saved());

        let task = repo
            .new_task(id, "Call customer", now() + Duration::days(1), "high")
            .unwrap();
        let task_id = task.id();
        assert!(repo.add_task_to_customer(id, task).unwrap().is_saved());

        let customer = repo.find_customer_by_id(id).unwrap();
        assert_eq!(customer.communications()[0].customer_id(), 1);
        assert_eq!(customer.communications()[0].description(), "Follow-up call");
        assert!(!customer.tasks()[0].is_completed());

        assert!(repo.complete_task(id, task_id).unwrap().is_saved());
        let report = repo.generate_customer_report(id).unwrap();
        assert_eq!(report.completed_tasks, 1);
        assert_eq!(repo.generate_overall_report().completion_rate(), Some(100.0));

        assert_eq!(
            *log.borrow(),
            vec![
                "New customer added: John Doe",
                "Communication logged for John Doe",
                "Task created for John Doe: Call customer",
                "Task completed for John Doe: Call customer",
            ]
        );
    }

    #[test]
    fn mutating_missing_customer_is_an_observable_noop() {
        let mut repo = repo();
        let log = listen(&mut repo);

        let comm = repo.new_communication(9, "email", "x", "").unwrap();
        assert!(matches!(
            repo.add_communication_to_customer(9, comm),
            Err(CrmError::CustomerNotFound(9))
        ));
        let task = repo.new_task(9, "x", now(), "low").unwrap();
        assert!(matches!(
            repo.add_task_to_customer(9, task),
            Err(CrmError::CustomerNotFound(9))
        ));

        assert!(log.borrow().is_empty());
        assert_eq!(repo.store().write_count(), 0);
        assert!(repo.customers().is_empty());
    }

    #[test]
    fn child_built_for_another_customer_is_rejected() {
        let store = InMemoryStore::new();
        let mut repo = Repository::new(store.clone());
        let log = listen(&mut repo);
        let first = add(&mut repo, "A", "", "");
        let second = add(&mut repo, "B", "", "");
        let writes = repo.store().write_count();

        let comm = repo.new_communication(second, "email", "x", "").unwrap();
        assert!(matches!(
            repo.add_communication_to_customer(first, comm),
            Err(CrmError::OwnerMismatch {
                expected: 1,
                found: 2
            })
        ));
        let task = repo.new_task(99, "x", now(), "low").unwrap();
        assert!(matches!(
            repo.add_task_to_customer(first, task),
            Err(CrmError::OwnerMismatch {
                expected: 1,
                found: 99
            })
        ));

        assert_eq!(repo.store().write_count(), writes);
        assert_eq!(log.borrow().len(), 2);
        assert!(repo
            .customers()
            .iter()
            .all(|c| c.communications().is_empty() && c.tasks().is_empty()));

        let again = Repository::open(store).unwrap();
        assert_eq!(again.customers(), repo.customers());
    }

    #[test]
    fn complete_unknown_task_fails() {
        let mut repo = repo();
        let id = add(&mut repo, "A", "", "");
        assert!(matches!(
            repo.complete_task(id, 5),
            Err(CrmError::TaskNotFound {
                customer_id: 1,
                task_id: 5
            })
        ));
        assert!(matches!(
            repo.complete_task(2, 1),
            Err(CrmError::CustomerNotFound(2))
        ));
    }

    #[test]
    fn failed_save_keeps_memory_state_and_still_notifies() {
        let mut repo = repo();
        let log = listen(&mut repo);
        repo.store().set_simulate_write_error(true);

        let customer = repo.new_customer("A", "", "", "").unwrap();
        let status = repo.add_customer(customer);
        assert!(matches!(status, SaveStatus::Failed(CrmError::Store(_))));
        assert_eq!(repo.customers().len(), 1);
        assert_eq!(log.borrow().len(), 1);

        repo.store().set_simulate_write_error(false);
        repo.save().unwrap();
        assert!(repo.store().contents().unwrap().contains("CUSTOMER|1|A"));
    }

    #[test]
    fn load_missing_file_starts_fresh() {
        let mut repo = repo();
        assert_eq!(repo.load().unwrap(), LoadOutcome::Fresh);
        assert!(repo.customers().is_empty());
    }

    #[test]
    fn reload_restores_graph_and_reseeds_ids() {
        let store = InMemoryStore::new();
        let mut first = Repository::new(store.clone());
        let id = add(&mut first, "John Doe", "john@example.com", "1");
        add(&mut first, "Jane", "jane@example.com", "2");
        for desc in ["one", "two"] {
            let comm = first.new_communication(id, "phone", desc, "t").unwrap();
            let _ = first.add_communication_to_customer(id, comm).unwrap();
        }
        let task = first.new_task(id, "Call", now(), "high").unwrap();
        let _ = first.add_task_to_customer(id, task).unwrap();

        let mut second = Repository::open(store).unwrap();
        assert_eq!(second.customers(), first.customers());

        assert_eq!(second.ids().peek(EntityKind::Customer), 3);
        assert_eq!(second.ids().peek(EntityKind::Communication), 3);
        assert_eq!(second.ids().peek(EntityKind::Task), 2);
        assert_eq!(second.new_customer("New", "", "", "").unwrap().id(), 3);
    }

    #[test]
    fn reload_drops_orphans_and_never_reuses_their_ids() {
        let store = InMemoryStore::with_contents(
            "CUSTOMER|1|John Doe|john@example.com|1|\n\
             COMMUNICATION|7|2|email|Lost|2024-01-01 10:00:00|\n",
        );
        let mut repo = Repository::new(store);
        assert_eq!(
            repo.load().unwrap(),
            LoadOutcome::Loaded {
                customers: 1,
                orphans: 1
            }
        );
        assert!(repo.customers()[0].communications().is_empty());
        assert_eq!(repo.new_communication(1, "email", "x", "").unwrap().id(), 8);
    }

    #[test]
    fn malformed_file_aborts_load_without_changes() {
        let store = InMemoryStore::with_contents("CUSTOMER|1|A|a|1|\nTASK|1|1|x\n");
        let mut repo = Repository::new(store);
        assert!(matches!(repo.load(), Err(CrmError::Parse { line: 2, .. })));
        assert!(repo.customers().is_empty());
        assert_eq!(repo.ids().peek(EntityKind::Customer), 1);
    }

    #[test]
    fn highest_storable_id_loads_and_exhausts_the_counter() {
        let store = InMemoryStore::with_contents(format!("CUSTOMER|{}|A|a@x|1|\n", MAX_ID));
        let mut repo = Repository::open(store).unwrap();
        assert_eq!(repo.customers()[0].id(), MAX_ID);
        assert!(matches!(
            repo.new_customer("B", "", "", ""),
            Err(CrmError::IdsExhausted(EntityKind::Customer))
        ));
        assert_eq!(repo.new_task(MAX_ID, "x", now(), "low").unwrap().id(), 1);
    }

    #[test]
    fn id_above_the_maximum_aborts_load() {
        let store = InMemoryStore::with_contents(format!("CUSTOMER|{}|A|a@x|1|\n", u32::MAX));
        let mut repo = Repository::new(store);
        assert!(matches!(repo.load(), Err(CrmError::Parse { line: 1, .. })));
        assert!(repo.customers().is_empty());
    }

    #[test]
    fn persist_reports_failure_without_erroring() {
        let mut repo = repo();
        repo.store().set_simulate_write_error(true);
        assert!(matches!(repo.persist(), SaveStatus::Failed(CrmError::Store(_))));
        repo.store().set_simulate_write_error(false);
        assert!(repo.persist().is_saved());
    }

    #[test]
    fn current_user_defaults_and_changes() {
        let mut repo = repo();
        assert_eq!(repo.current_user(), DEFAULT_USER);
        repo.set_current_user("Alice");
        assert_eq!(repo.current_user(), "Alice");
    }

    #[test]
    fn unsubscribed_listener_is_silent() {
        let mut repo = repo();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = repo.subscribe(Box::new(move |m: &str| sink.borrow_mut().push(m.to_string())));
        assert!(repo.unsubscribe(sub));
        add(&mut repo, "A", "", "");
        assert_eq!(repo.notify("manual"), 0);
        assert!(log.borrow().is_empty());
    }
}
