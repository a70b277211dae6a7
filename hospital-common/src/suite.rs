//! Ordered check suite
//!
//! One cycle is: connect, create schema, seed, verify rows, verify metadata,
//! verify foreign key enforcement, drop schema, close. The steps are plain
//! sequential calls; later checks rely on the seed checks having run first.
//!
//! A failed check is recorded and the cycle continues. Only a connection or
//! schema creation failure ends a cycle early.

use crate::config::DatabaseConfig;
use crate::db::connect::{close_quietly, connect, Connection};
use crate::db::fixtures::{doctors, patients, treatments};
use crate::db::schema::{create_schema, drop_schema};
use crate::db::table_schemas::{DoctorTableSchema, PatientTableSchema, TreatmentTableSchema};
use crate::verify::{verify_foreign_key_enforcement, verify_metadata, verify_rows, verify_seed};
use crate::{Error, Result};
use serde::Serialize;
use tracing::{error, info, warn};

/// Result of one named check
#[derive(Debug)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub result: Result<()>,
}

impl CheckOutcome {
    fn record(name: &'static str, result: Result<()>) -> Self {
        match &result {
            Ok(()) => info!("✓ {}", name),
            Err(e) if e.is_mismatch() => error!("✗ {}: {}", name, e),
            Err(e) => error!("✗ {} (query failed): {}", name, e),
        }
        Self { name, result }
    }

    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of one full cycle
#[derive(Debug)]
pub struct SuiteReport {
    pub checks: Vec<CheckOutcome>,
    /// Errors from best-effort teardown; reported, never fatal
    pub teardown_failures: Vec<Error>,
}

impl SuiteReport {
    /// True when every check passed
    ///
    /// Teardown failures do not fail the suite.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckOutcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed())
    }

    /// Serializable view of the report
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            passed: self.passed(),
            checks: self
                .checks
                .iter()
                .map(|c| CheckSummary {
                    name: c.name.to_string(),
                    status: match &c.result {
                        Ok(()) => CheckStatus::Passed,
                        Err(e) if e.is_mismatch() => CheckStatus::Mismatch,
                        Err(_) => CheckStatus::Error,
                    },
                    message: c.result.as_ref().err().map(ToString::to_string),
                })
                .collect(),
            teardown_failures: self.teardown_failures.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Mismatch,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub status: CheckStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub passed: bool,
    pub checks: Vec<CheckSummary>,
    pub teardown_failures: Vec<String>,
}

/// Run one full cycle on a fresh connection
///
/// Returns `Err` only for fatal failures: the connection cannot be opened or
/// the schema cannot be created. The connection is closed on every path.
pub async fn run_cycle(config: &DatabaseConfig) -> Result<SuiteReport> {
    let mut conn = connect(config).await?;
    let result = run_with_connection(&mut conn).await;
    close_quietly(conn).await;
    result
}

/// Run create, checks and teardown on an already open connection
pub async fn run_with_connection(conn: &mut Connection) -> Result<SuiteReport> {
    if let Err(e) = create_schema(conn).await {
        error!("Schema creation failed: {}", e);
        return Err(e);
    }

    let checks = run_checks(conn).await;
    let teardown_failures = drop_schema(conn).await;
    if !teardown_failures.is_empty() {
        warn!("Teardown finished with {} failures", teardown_failures.len());
    }

    Ok(SuiteReport {
        checks,
        teardown_failures,
    })
}

async fn run_checks(conn: &mut Connection) -> Vec<CheckOutcome> {
    let mut checks = Vec::new();

    // Seed
    let result = verify_seed(conn, &doctors()).await.map(|_| ());
    checks.push(CheckOutcome::record("insert_doctors", result));
    let result = verify_seed(conn, &patients()).await.map(|_| ());
    checks.push(CheckOutcome::record("insert_patients", result));
    let result = verify_seed(conn, &treatments()).await.map(|_| ());
    checks.push(CheckOutcome::record("insert_treatments", result));

    // Data
    let result = verify_rows(conn, &doctors()).await;
    checks.push(CheckOutcome::record("verify_doctor_data", result));
    let result = verify_rows(conn, &patients()).await;
    checks.push(CheckOutcome::record("verify_patient_data", result));
    let result = verify_rows(conn, &treatments()).await;
    checks.push(CheckOutcome::record("verify_treatment_data", result));

    // Metadata
    let result = verify_metadata::<DoctorTableSchema>(conn).await;
    checks.push(CheckOutcome::record("verify_doctor_metadata", result));
    let result = verify_metadata::<PatientTableSchema>(conn).await;
    checks.push(CheckOutcome::record("verify_patient_metadata", result));
    let result = verify_metadata::<TreatmentTableSchema>(conn).await;
    checks.push(CheckOutcome::record("verify_treatment_metadata", result));

    let result = verify_foreign_key_enforcement(conn).await;
    checks.push(CheckOutcome::record("verify_foreign_key_enforcement", result));

    checks
}

/// Run `cycles` full cycles back to back, each on a fresh schema
///
/// Stops at the first fatal error. Cycles share nothing, so every report is
/// expected to carry the same summary.
pub async fn run_cycles(config: &DatabaseConfig, cycles: usize) -> Result<Vec<SuiteReport>> {
    let mut reports = Vec::with_capacity(cycles);

    for cycle in 1..=cycles {
        info!("=== Cycle {}/{} ===", cycle, cycles);
        reports.push(run_cycle(config).await?);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mismatch;

    #[test]
    fn test_report_passed_ignores_teardown_failures() {
        let report = SuiteReport {
            checks: vec![CheckOutcome::record("insert_doctors", Ok(()))],
            teardown_failures: vec![Error::Config("drop failed".to_string())],
        };

        assert!(report.passed());
        assert_eq!(report.summary().teardown_failures, vec!["Configuration error: drop failed"]);
    }

    #[test]
    fn test_summary_distinguishes_mismatch_from_error() {
        let report = SuiteReport {
            checks: vec![
                CheckOutcome::record("insert_doctors", Ok(())),
                CheckOutcome::record(
                    "verify_doctor_data",
                    Err(Mismatch::RowCount {
                        table: "doctor".to_string(),
                        expected: 3,
                        actual: 0,
                    }
                    .into()),
                ),
                CheckOutcome::record("verify_patient_data", Err(sqlx::Error::RowNotFound.into())),
            ],
            teardown_failures: Vec::new(),
        };

        assert!(!report.passed());
        assert_eq!(report.failures().count(), 2);

        let summary = report.summary();
        let statuses: Vec<CheckStatus> = summary.checks.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![CheckStatus::Passed, CheckStatus::Mismatch, CheckStatus::Error]
        );
        assert_eq!(
            summary.checks[1].message.as_deref(),
            Some("Mismatch: doctor: expected 3 rows, got 0")
        );
    }

    #[tokio::test]
    async fn test_failed_checks_do_not_stop_later_checks() {
        let config = DatabaseConfig::new("sqlite::memory:").unwrap();
        let mut conn = connect(&config).await.unwrap();
        create_schema(&mut conn).await.unwrap();

        // Doctor 2 never lands, so treatment 1 (doctor_fk 2) is rejected
        sqlx::query(
            "CREATE TRIGGER skip_doctor_2 BEFORE INSERT ON doctor \
             WHEN NEW.id = 2 BEGIN SELECT RAISE(IGNORE); END",
        )
        .execute(conn.inner())
        .await
        .unwrap();

        let checks = run_checks(&mut conn).await;
        let report = SuiteReport {
            checks,
            teardown_failures: drop_schema(&mut conn).await,
        };
        close_quietly(conn).await;

        let statuses: Vec<(&str, CheckStatus)> = report
            .summary()
            .checks
            .iter()
            .zip(&report.checks)
            .map(|(summary, check)| (check.name, summary.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("insert_doctors", CheckStatus::Mismatch),
                ("insert_patients", CheckStatus::Passed),
                ("insert_treatments", CheckStatus::Error),
                ("verify_doctor_data", CheckStatus::Mismatch),
                ("verify_patient_data", CheckStatus::Passed),
                ("verify_treatment_data", CheckStatus::Mismatch),
                ("verify_doctor_metadata", CheckStatus::Passed),
                ("verify_patient_metadata", CheckStatus::Passed),
                ("verify_treatment_metadata", CheckStatus::Passed),
                ("verify_foreign_key_enforcement", CheckStatus::Passed),
            ]
        );
        assert!(report.teardown_failures.is_empty());
    }
}
