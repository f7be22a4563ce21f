//! Monarch — a guild-based AI workforce orchestrator.
//!
//! Requests are routed to guilds by keyword, staffed from a persistent
//! roster of workers that gain experience and rank with use, executed as
//! fixed multi-step workflows (or a best-effort single call when staffing
//! falls short), and settled against a shared treasury.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod job;
pub mod memory;
pub mod monarch;
pub mod openai;
pub mod persist;
pub mod planner;
pub mod tools;
pub mod treasury;
pub mod ui;
pub mod worker;

pub use config::GuildBook;
pub use error::MonarchError;
pub use monarch::Monarch;
