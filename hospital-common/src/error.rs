//! Common error types for the hospital schema check

use std::fmt;
use thiserror::Error;

/// Common result type for hospital schema operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the check
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store answered, but with data or metadata that differs from the fixtures
    #[error("Mismatch: {0}")]
    Mismatch(Mismatch),
}

impl From<Mismatch> for Error {
    fn from(mismatch: Mismatch) -> Self {
        Error::Mismatch(mismatch)
    }
}

impl Error {
    /// True when the store returned an answer that disagrees with expectations,
    /// as opposed to failing to answer at all.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::Mismatch(_))
    }
}

/// A single expected-vs-actual difference
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// Affected or returned row count differs
    RowCount {
        table: String,
        expected: u64,
        actual: u64,
    },
    /// A column value of the row with the given id differs
    Value {
        table: String,
        id: i32,
        column: String,
        expected: String,
        actual: String,
    },
    /// Row at a given position has a different id than expected
    RowOrder {
        table: String,
        position: usize,
        expected_id: i32,
        actual_id: i32,
    },
    /// Column metadata differs from the declared schema
    Schema { table: String, details: Vec<String> },
    /// Primary key columns differ
    PrimaryKey {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// Foreign key constraints differ
    ForeignKey {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// Store accepted a row that violates a foreign key
    ConstraintNotEnforced { table: String, constraint: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::RowCount { table, expected, actual } => write!(
                f,
                "{}: expected {} rows, got {}",
                table, expected, actual
            ),
            Mismatch::Value { table, id, column, expected, actual } => write!(
                f,
                "{}[id={}].{}: expected <{}>, got <{}>",
                table, id, column, expected, actual
            ),
            Mismatch::RowOrder { table, position, expected_id, actual_id } => write!(
                f,
                "{}: row {} expected id {}, got id {}",
                table, position, expected_id, actual_id
            ),
            Mismatch::Schema { table, details } => {
                write!(f, "{}: schema differs ({})", table, details.join("; "))
            }
            Mismatch::PrimaryKey { table, expected, actual } => write!(
                f,
                "{}: expected primary key {:?}, got {:?}",
                table, expected, actual
            ),
            Mismatch::ForeignKey { table, expected, actual } => write!(
                f,
                "{}: expected foreign keys {:?}, got {:?}",
                table, expected, actual
            ),
            Mismatch::ConstraintNotEnforced { table, constraint } => write!(
                f,
                "{}: store accepted a row violating {}",
                table, constraint
            ),
        }
    }
}
