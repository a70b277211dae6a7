//! Fixture rows and seeding
//!
//! Rows are inserted with one literal INSERT each, in ascending id order.

use super::connect::Connection;
use super::models::{Doctor, Entity, Patient, Treatment};
use crate::Result;
use rust_decimal::Decimal;
use tracing::debug;

pub fn doctors() -> Vec<Doctor> {
    vec![
        Doctor {
            id: 1,
            name: "Dr. Stephen Strange".to_string(),
            occupation: "Surgeon".to_string(),
            salary: Decimal::new(1000000002, 2),
        },
        Doctor {
            id: 2,
            name: "Dr. Wilhelm Mayor".to_string(),
            occupation: "Cardiologist".to_string(),
            salary: Decimal::new(30000032, 2),
        },
        Doctor {
            id: 3,
            name: "Dr. Casey Washington".to_string(),
            occupation: "Veterinary physician".to_string(),
            salary: Decimal::new(6000062, 2),
        },
    ]
}

pub fn patients() -> Vec<Patient> {
    vec![
        Patient {
            id: 1,
            name: "Dr. Dre".to_string(),
            salary: Decimal::new(1000000002, 2),
        },
        Patient {
            id: 2,
            name: "Sir Albert Humbug McMiller".to_string(),
            salary: Decimal::new(5376832, 2),
        },
        Patient {
            id: 3,
            name: "Dr. Stephen Strange".to_string(),
            salary: Decimal::new(1000000002, 2),
        },
    ]
}

pub fn treatments() -> Vec<Treatment> {
    vec![
        Treatment {
            id: 1,
            name: "Bioelectromagnetic therapy".to_string(),
            doctor_fk: 2,
            patient_fk: 1,
            outcome: Some("Success, but 6 feet under".to_string()),
        },
        Treatment {
            id: 2,
            name: "General Checkup".to_string(),
            doctor_fk: 3,
            patient_fk: 2,
            outcome: Some("Mostly alive".to_string()),
        },
        Treatment {
            id: 3,
            name: "Treatment with Daytrana".to_string(),
            doctor_fk: 3,
            patient_fk: 2,
            outcome: Some("Fine".to_string()),
        },
        Treatment {
            id: 4,
            name: "Surgery".to_string(),
            doctor_fk: 1,
            patient_fk: 3,
            outcome: Some("Alive".to_string()),
        },
    ]
}

/// Insert rows one statement at a time, returning the summed affected-row count
///
/// Stops at the first failing statement.
pub async fn seed_table<E: Entity>(conn: &mut Connection, rows: &[E]) -> Result<u64> {
    let mut affected = 0;

    for row in rows {
        let sql = row.insert_sql();
        debug!("{}", sql);
        affected += sqlx::query(&sql).execute(conn.inner()).await?.rows_affected();
    }

    Ok(affected)
}
