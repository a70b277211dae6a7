//! # Hospital Common Library
//!
//! Schema, fixtures and verification for the hospital schema check:
//! - Connection configuration and resolution
//! - DDL for the doctor, patient and treatment tables
//! - Fixture rows and literal inserts
//! - Metadata introspection (PostgreSQL and SQLite)
//! - The ordered setup / seed / verify / teardown suite

pub mod config;
pub mod db;
pub mod error;
pub mod suite;
pub mod verify;

pub use config::{DatabaseConfig, Dialect};
pub use error::{Error, Mismatch, Result};
pub use suite::{run_cycle, run_cycles, CheckOutcome, SuiteReport};
