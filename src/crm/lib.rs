//! # CRM Architecture
//!
//! `crm` is a small customer relationship manager: customers, the history of
//! communications with them, and follow-up tasks, all kept in one flat text
//! file. The library holds every rule; the `crm` binary is a thin console
//! shell over it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Menus, prompts, report rendering, console notifications  │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repository (repository.rs, report.rs)                      │
//! │  - Owns customers, identity allocation, notifications       │
//! │  - Saves the whole graph after every mutation               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Line format codec                                        │
//! │  - DataStore trait: FileStore (production), InMemoryStore   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//!
//! Customers, communications and tasks each have their own counter (see
//! [`ids`]). After a reload the counters continue past the highest ID found
//! in the file, including IDs of records that were dropped as orphans.
//!
//! ## Module Overview
//!
//! - [`repository`]: The core: queries, mutations, save and load
//! - [`model`]: `Customer`, `Communication`, `Task`
//! - [`ids`]: Per-kind identity allocator
//! - [`notify`]: Publish/subscribe hub for change announcements
//! - [`report`]: Per-customer and overall aggregates
//! - [`store`]: Storage abstraction, file format, implementations
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod notify;
pub mod report;
pub mod repository;
pub mod store;
