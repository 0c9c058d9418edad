//! Read-only aggregation over customers. Rendering lives in the CLI.

use crate::model::Customer;

fn rate(completed: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(completed as f64 / total as f64 * 100.0)
}

#[derive(Debug, Clone, Copy)]
pub struct CustomerReport<'a> {
    pub customer: &'a Customer,
    pub communication_count: usize,
    pub task_count: usize,
    pub completed_tasks: usize,
}

impl<'a> CustomerReport<'a> {
    pub fn new(customer: &'a Customer) -> Self {
        Self {
            customer,
            communication_count: customer.communications().len(),
            task_count: customer.tasks().len(),
            completed_tasks: customer.tasks().iter().filter(|t| t.is_completed()).count(),
        }
    }

    /// Percentage of completed tasks, `None` when the customer has no tasks.
    pub fn completion_rate(&self) -> Option<f64> {
        rate(self.completed_tasks, self.task_count)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverallReport {
    pub total_customers: usize,
    pub total_communications: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

impl OverallReport {
    pub fn from_customers(customers: &[Customer]) -> Self {
        customers
            .iter()
            .map(CustomerReport::new)
            .fold(Self::default(), |mut acc, r| {
                acc.total_customers += 1;
                acc.total_communications += r.communication_count;
                acc.total_tasks += r.task_count;
                acc.completed_tasks += r.completed_tasks;
                acc
            })
    }

    /// Percentage of completed tasks, `None` when there are no tasks at all.
    pub fn completion_rate(&self) -> Option<f64> {
        rate(self.completed_tasks, self.total_tasks)
    }
}
