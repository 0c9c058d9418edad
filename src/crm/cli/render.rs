use colored::Colorize;
use crm::model::Customer;
use crm::report::{CustomerReport, OverallReport};
use crm::repository::{LoadOutcome, SaveStatus};
use std::io::{self, Write};

pub const MENU_ITEMS: [&str; 9] = [
    "Create Customer",
    "View All Customers",
    "Search Customers",
    "Add Communication",
    "Add Task",
    "View Customer Details",
    "Mark Task Complete",
    "Generate Reports",
    "Exit",
];

pub fn menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\n{}", "=== CRM MENU ===".bold())?;
    for (i, item) in MENU_ITEMS.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, item)?;
    }
    Ok(())
}

pub fn customers<'a, W, I>(out: &mut W, customers: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Customer>,
{
    for customer in customers {
        writeln!(out, "{}", customer)?;
    }
    Ok(())
}

pub fn customer_report<W: Write>(out: &mut W, report: &CustomerReport<'_>) -> io::Result<()> {
    writeln!(out, "\n{}", "=== CUSTOMER REPORT ===".bold())?;
    writeln!(out, "{}", report.customer)?;

    writeln!(out, "\nCommunications ({}):", report.communication_count)?;
    for comm in report.customer.communications() {
        writeln!(out, "  {}", comm)?;
    }

    writeln!(out, "\nTasks ({}):", report.task_count)?;
    for task in report.customer.tasks() {
        writeln!(out, "  {}", task)?;
    }
    Ok(())
}

pub fn overall_report<W: Write>(out: &mut W, report: &OverallReport) -> io::Result<()> {
    writeln!(out, "\n{}", "=== OVERALL CRM REPORT ===".bold())?;
    writeln!(out, "Total Customers: {}", report.total_customers)?;
    writeln!(out, "Total Communications: {}", report.total_communications)?;
    writeln!(out, "Total Tasks: {}", report.total_tasks)?;
    writeln!(out, "Completed Tasks: {}", report.completed_tasks)?;
    if let Some(rate) = report.completion_rate() {
        writeln!(out, "Task Completion Rate: {:.1}%", rate)?;
    }
    Ok(())
}

pub fn save_status<W: Write>(out: &mut W, status: &SaveStatus, location: &str) -> io::Result<()> {
    match status {
        SaveStatus::Saved => writeln!(out, "{}", format!("Data saved to {}", location).dimmed()),
        SaveStatus::Failed(e) => writeln!(out, "{}", format!("Error saving data: {}", e).red()),
    }
}

pub fn load_outcome<W: Write>(out: &mut W, outcome: &LoadOutcome, location: &str) -> io::Result<()> {
    match outcome {
        LoadOutcome::Fresh => writeln!(out, "{}", "No data file found. Starting fresh.".dimmed()),
        LoadOutcome::Loaded { customers, .. } => writeln!(
            out,
            "{}",
            format!("Loaded {} customers from {}", customers, location).dimmed()
        ),
    }
}

pub fn success<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.green())
}

pub fn warning<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.yellow())
}
