#![forbid(unsafe_code)]

//! Core domain model and business logic for the medtrack medication schedule.
//!
//! This crate provides:
//! - Domain types (frequencies, time slots, medicine entries, schedules)
//! - Recurrence resolution and entry validation
//! - The per-day taken ledger
//! - Daily views and status updates
//! - Persistence (schedule store, status log, CSV export)
//! - Adherence reporting

pub mod types;
pub mod error;
pub mod dates;
pub mod config;
pub mod logging;
pub mod recurrence;
pub mod validator;
pub mod ledger;
pub mod daily_view;
pub mod status;
pub mod store;
pub mod status_log;
pub mod service;
pub mod adherence;
pub mod export;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use ledger::TakenLedger;
pub use recurrence::{resolve, Resolution};
pub use validator::{validate, EntryLimits};
pub use daily_view::{build_daily_view, DailyView, DoseItem};
pub use status::{update_status, StatusRequest, StatusUpdate, UpdateOptions};
pub use store::{JsonScheduleStore, MemoryScheduleStore, ScheduleRepository};
pub use status_log::{JsonlStatusSink, StatusSink};
