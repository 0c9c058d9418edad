use super::render;
use chrono::{Duration, NaiveDateTime};
use crm::error::CrmError;
use crm::model;
use crm::repository::{Repository, SaveStatus};
use crm::store::DataStore;
use std::io::{self, BufRead, Write};

enum Step {
    Continue,
    Quit,
}

/// Menu-driven loop over a repository.
///
/// Reads lines from `input` and writes everything to `out`. Running out of
/// input behaves like choosing Exit.
pub struct Shell<'r, S: DataStore, R: BufRead, W: Write> {
    repo: &'r mut Repository<S>,
    input: R,
    out: W,
}

impl<'r, S: DataStore, R: BufRead, W: Write> Shell<'r, S, R, W> {
    pub fn new(repo: &'r mut Repository<S>, input: R, out: W) -> Self {
        Self { repo, input, out }
    }

    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "=== Welcome to Simple CRM System ===")?;
        if let Some(user) = self.prompt("Enter your name: ")? {
            self.repo.set_current_user(user);
        } else {
            return self.exit();
        }

        loop {
            render::menu(&mut self.out)?;
            let Some(choice) = self.prompt_int("Enter your choice: ")? else {
                break;
            };
            let step = match choice {
                1 => self.create_customer()?,
                2 => self.view_all_customers()?,
                3 => self.search_customers()?,
                4 => self.add_communication()?,
                5 => self.add_task()?,
                6 => self.view_customer_details()?,
                7 => self.mark_task_complete()?,
                8 => self.generate_reports()?,
                9 => {
                    writeln!(self.out, "Thank you for using Simple CRM System!")?;
                    Step::Quit
                }
                _ => {
                    render::warning(&mut self.out, "Invalid choice. Please try again.")?;
                    Step::Continue
                }
            };
            if let Step::Quit = step {
                break;
            }
        }
        self.exit()
    }

    fn exit(&mut self) -> io::Result<()> {
        let status = self.repo.persist();
        self.show_save(&status)?;
        self.out.flush()
    }

    // --- Input ---

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        self.read_line()
    }

    /// Re-prompts until the reply parses as a number. `None` means input ended.
    fn prompt_int(&mut self, label: &str) -> io::Result<Option<i32>> {
        loop {
            let Some(reply) = self.prompt(label)? else {
                return Ok(None);
            };
            match reply.trim().parse::<i32>() {
                Ok(n) => return Ok(Some(n)),
                Err(_) => writeln!(self.out, "Please enter a valid number.")?,
            }
        }
    }

    /// Prompts for a customer ID; `Some(None)` when no such customer exists.
    fn prompt_customer(&mut self) -> io::Result<Option<Option<u32>>> {
        let Some(raw) = self.prompt_int("Enter Customer ID: ")? else {
            return Ok(None);
        };
        let found = u32::try_from(raw)
            .ok()
            .filter(|id| self.repo.find_customer_by_id(*id).is_some());
        if found.is_none() {
            render::warning(&mut self.out, "Customer not found!")?;
        }
        Ok(Some(found))
    }

    /// Re-prompts until the day offset gives a representable date.
    fn prompt_due_date(&mut self) -> io::Result<Option<NaiveDateTime>> {
        loop {
            let Some(days) = self.prompt_int("Days from now for due date: ")? else {
                return Ok(None);
            };
            let due = Duration::try_days(i64::from(days))
                .and_then(|offset| model::now().checked_add_signed(offset));
            match due {
                Some(due) => return Ok(Some(due)),
                None => writeln!(self.out, "That date is out of range.")?,
            }
        }
    }

    fn show_save(&mut self, status: &SaveStatus) -> io::Result<()> {
        let location = self.repo.location();
        render::save_status(&mut self.out, status, &location)
    }

    // --- Actions ---

    fn create_customer(&mut self) -> io::Result<Step> {
        writeln!(self.out, "\n--- Create New Customer ---")?;
        let Some(name) = self.prompt("Name: ")? else {
            return Ok(Step::Quit);
        };
        let Some(email) = self.prompt("Email: ")? else {
            return Ok(Step::Quit);
        };
        let Some(phone) = self.prompt("Phone: ")? else {
            return Ok(Step::Quit);
        };
        let Some(notes) = self.prompt("Notes: ")? else {
            return Ok(Step::Quit);
        };

        let customer = match self.repo.new_customer(name, email, phone, notes) {
            Ok(customer) => customer,
            Err(e) => {
                self.report_error(&e)?;
                return Ok(Step::Continue);
            }
        };
        let id = customer.id();
        let status = self.repo.add_customer(customer);
        self.show_save(&status)?;
        render::success(
            &mut self.out,
            &format!("Customer created successfully with ID: {}", id),
        )?;
        Ok(Step::Continue)
    }

    fn view_all_customers(&mut self) -> io::Result<Step> {
        writeln!(self.out, "\n--- All Customers ---")?;
        if self.repo.customers().is_empty() {
            writeln!(self.out, "No customers found.")?;
        } else {
            render::customers(&mut self.out, self.repo.customers())?;
        }
        Ok(Step::Continue)
    }

    fn search_customers(&mut self) -> io::Result<Step> {
        let Some(keyword) = self.prompt("Enter search partial keyword (name, email, or phone): ")?
        else {
            return Ok(Step::Quit);
        };
        let results = self.repo.search_customers(&keyword);

        writeln!(self.out, "\n--- Search Results ---")?;
        if results.is_empty() {
            writeln!(self.out, "No customers found matching: {}", keyword)?;
        } else {
            render::customers(&mut self.out, results)?;
        }
        Ok(Step::Continue)
    }

    fn add_communication(&mut self) -> io::Result<Step> {
        writeln!(self.out, "\n--- Add Communication ---")?;
        let customer_id = match self.prompt_customer()? {
            None => return Ok(Step::Quit),
            Some(None) => return Ok(Step::Continue),
            Some(Some(id)) => id,
        };

        writeln!(self.out, "Communication types: phone, email, meeting")?;
        let Some(channel) = self.prompt("Type: ")? else {
            return Ok(Step::Quit);
        };
        let Some(description) = self.prompt("Description: ")? else {
            return Ok(Step::Quit);
        };
        let Some(tags) = self.prompt("Tags (optional): ")? else {
            return Ok(Step::Quit);
        };

        let added = self
            .repo
            .new_communication(customer_id, channel, description, tags)
            .and_then(|comm| self.repo.add_communication_to_customer(customer_id, comm));
        match added {
            Ok(status) => {
                self.show_save(&status)?;
                render::success(&mut self.out, "Communication added successfully!")?;
            }
            Err(e) => self.report_error(&e)?,
        }
        Ok(Step::Continue)
    }

    fn add_task(&mut self) -> io::Result<Step> {
        writeln!(self.out, "\n--- Add Task ---")?;
        let customer_id = match self.prompt_customer()? {
            None => return Ok(Step::Quit),
            Some(None) => return Ok(Step::Continue),
            Some(Some(id)) => id,
        };

        let Some(description) = self.prompt("Task description: ")? else {
            return Ok(Step::Quit);
        };
        let Some(due_date) = self.prompt_due_date()? else {
            return Ok(Step::Quit);
        };
        writeln!(self.out, "Priority levels: high, medium, low")?;
        let Some(priority) = self.prompt("Priority: ")? else {
            return Ok(Step::Quit);
        };

        let added = self
            .repo
            .new_task(customer_id, description, due_date, priority)
            .and_then(|task| self.repo.add_task_to_customer(customer_id, task));
        match added {
            Ok(status) => {
                self.show_save(&status)?;
                render::success(&mut self.out, "Task added successfully!")?;
            }
            Err(e) => self.report_error(&e)?,
        }
        Ok(Step::Continue)
    }

    fn view_customer_details(&mut self) -> io::Result<Step> {
        let Some(raw) = self.prompt_int("Enter Customer ID: ")? else {
            return Ok(Step::Quit);
        };
        self.customer_report(raw)?;
        Ok(Step::Continue)
    }

    fn customer_report(&mut self, raw_id: i32) -> io::Result<()> {
        let report = u32::try_from(raw_id)
            .ok()
            .and_then(|id| self.repo.generate_customer_report(id));
        match report {
            Some(report) => render::customer_report(&mut self.out, &report),
            None => render::warning(&mut self.out, "Customer not found!"),
        }
    }

    fn mark_task_complete(&mut self) -> io::Result<Step> {
        writeln!(self.out, "\n--- Mark Task Complete ---")?;
        let customer_id = match self.prompt_customer()? {
            None => return Ok(Step::Quit),
            Some(None) => return Ok(Step::Continue),
            Some(Some(id)) => id,
        };

        if let Some(customer) = self.repo.find_customer_by_id(customer_id) {
            if customer.tasks().is_empty() {
                writeln!(self.out, "No tasks found for this customer.")?;
                return Ok(Step::Continue);
            }
            writeln!(self.out, "Tasks for {}:", customer.name())?;
            for task in customer.tasks() {
                writeln!(self.out, "{}", task)?;
            }
        }

        let Some(raw_task_id) = self.prompt_int("Enter Task ID to mark complete: ")? else {
            return Ok(Step::Quit);
        };
        let Ok(task_id) = u32::try_from(raw_task_id) else {
            render::warning(&mut self.out, "Task not found!")?;
            return Ok(Step::Continue);
        };

        match self.repo.complete_task(customer_id, task_id) {
            Ok(status) => {
                self.show_save(&status)?;
                render::success(&mut self.out, "Task marked as completed!")?;
            }
            Err(CrmError::TaskNotFound { .. }) => {
                render::warning(&mut self.out, "Task not found!")?;
            }
            Err(e) => self.report_error(&e)?,
        }
        Ok(Step::Continue)
    }

    fn generate_reports(&mut self) -> io::Result<Step> {
        writeln!(self.out, "\n--- Reports ---")?;
        writeln!(self.out, "1. Customer Report")?;
        writeln!(self.out, "2. Overall Report")?;
        let Some(choice) = self.prompt_int("Choose report type: ")? else {
            return Ok(Step::Quit);
        };

        match choice {
            1 => {
                let Some(raw) = self.prompt_int("Enter Customer ID: ")? else {
                    return Ok(Step::Quit);
                };
                self.customer_report(raw)?;
            }
            2 => {
                let report = self.repo.generate_overall_report();
                render::overall_report(&mut self.out, &report)?;
            }
            _ => render::warning(&mut self.out, "Invalid choice.")?,
        }
        Ok(Step::Continue)
    }

    fn report_error(&mut self, error: &CrmError) -> io::Result<()> {
        match error {
            CrmError::CustomerNotFound(_) => render::warning(&mut self.out, "Customer not found!"),
            other => render::warning(&mut self.out, &other.to_string()),
        }
    }
}
