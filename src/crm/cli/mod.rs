//! Console front end: menus, prompts and rendering. Binary only.

use colored::Colorize;
use crm::notify::Subscriber;

pub mod render;
pub mod shell;

/// Prints every repository notification to stdout.
pub struct ConsoleNotifier {
    name: String,
}

impl ConsoleNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Subscriber for ConsoleNotifier {
    fn handle(&mut self, message: &str) {
        let prefix = format!("[NOTIFICATION - {}]", self.name);
        println!("{} {}", prefix.cyan(), message);
    }
}
