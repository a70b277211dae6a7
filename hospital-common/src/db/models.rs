//! Database models

use rust_decimal::Decimal;
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};
use std::fmt;

/// A single column value, as inserted or as read back
///
/// Decimal values compare numerically, so `10000000.02` equals `10000000.020`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i32),
    Text(String),
    Decimal(Decimal),
    Null,
}

impl FieldValue {
    /// Render as a literal suitable for inlining into SQL text
    pub fn to_sql_literal(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Null => "NULL".to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Null => write!(f, "NULL"),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Text(v.clone())
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<&Option<String>> for FieldValue {
    fn from(v: &Option<String>) -> Self {
        v.as_ref().map_or(FieldValue::Null, FieldValue::from)
    }
}

/// A fixture row type stored in one table
///
/// `values()` is aligned with `COLUMNS`.
pub trait Entity: for<'r> FromRow<'r, AnyRow> + Send + Unpin + Clone + fmt::Debug {
    /// Table name in database
    const TABLE: &'static str;

    /// Column names in insert order
    const COLUMNS: &'static [&'static str];

    /// Query returning all rows ordered by ascending id
    const SELECT_SQL: &'static str;

    fn id(&self) -> i32;

    fn values(&self) -> Vec<FieldValue>;

    /// Literal INSERT statement for this row (no parameter binding)
    fn insert_sql(&self) -> String {
        let literals: Vec<String> = self.values().iter().map(FieldValue::to_sql_literal).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Self::TABLE,
            Self::COLUMNS.join(", "),
            literals.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub id: i32,
    pub name: String,
    pub occupation: String,
    pub salary: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: i32,
    pub name: String,
    pub salary: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Treatment {
    pub id: i32,
    pub name: String,
    pub doctor_fk: i32,
    pub patient_fk: i32,
    pub outcome: Option<String>,
}

impl Entity for Doctor {
    const TABLE: &'static str = "doctor";
    const COLUMNS: &'static [&'static str] = &["id", "name", "occupation", "salary"];
    const SELECT_SQL: &'static str =
        "SELECT id, name, occupation, CAST(salary AS TEXT) AS salary FROM doctor ORDER BY id";

    fn id(&self) -> i32 {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            (&self.name).into(),
            (&self.occupation).into(),
            self.salary.into(),
        ]
    }
}

impl Entity for Patient {
    const TABLE: &'static str = "patient";
    const COLUMNS: &'static [&'static str] = &["id", "name", "salary"];
    const SELECT_SQL: &'static str =
        "SELECT id, name, CAST(salary AS TEXT) AS salary FROM patient ORDER BY id";

    fn id(&self) -> i32 {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![self.id.into(), (&self.name).into(), self.salary.into()]
    }
}

impl Entity for Treatment {
    const TABLE: &'static str = "treatment";
    const COLUMNS: &'static [&'static str] = &["id", "name", "doctor_fk", "patient_fk", "outcome"];
    const SELECT_SQL: &'static str =
        "SELECT id, name, doctor_fk, patient_fk, outcome FROM treatment ORDER BY id";

    fn id(&self) -> i32 {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            (&self.name).into(),
            self.doctor_fk.into(),
            self.patient_fk.into(),
            (&self.outcome).into(),
        ]
    }
}

// Salaries are selected as text; neither the Any driver nor SQLite carries
// an exact decimal type through.
fn decimal_column(row: &AnyRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(column)?;
    text.trim()
        .parse::<Decimal>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

impl<'r> FromRow<'r, AnyRow> for Doctor {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            occupation: row.try_get("occupation")?,
            salary: decimal_column(row, "salary")?,
        })
    }
}

impl<'r> FromRow<'r, AnyRow> for Patient {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            salary: decimal_column(row, "salary")?,
        })
    }
}

impl<'r> FromRow<'r, AnyRow> for Treatment {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            doctor_fk: row.try_get("doctor_fk")?,
            patient_fk: row.try_get("patient_fk")?,
            outcome: row.try_get("outcome")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_is_literal() {
        let doctor = Doctor {
            id: 1,
            name: "Dr. Stephen Strange".to_string(),
            occupation: "Surgeon".to_string(),
            salary: Decimal::new(1000000002, 2),
        };

        assert_eq!(
            doctor.insert_sql(),
            "INSERT INTO doctor (id, name, occupation, salary) \
             VALUES (1, 'Dr. Stephen Strange', 'Surgeon', 10000000.02)"
        );
    }

    #[test]
    fn test_text_literal_escapes_quotes() {
        let value = FieldValue::from("O'Brien");
        assert_eq!(value.to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn test_null_outcome_literal() {
        let treatment = Treatment {
            id: 9,
            name: "Observation".to_string(),
            doctor_fk: 1,
            patient_fk: 1,
            outcome: None,
        };
        assert!(treatment.insert_sql().ends_with("VALUES (9, 'Observation', 1, 1, NULL)"));
    }

    #[test]
    fn test_decimal_values_compare_numerically() {
        let a = FieldValue::Decimal("10000000.02".parse().unwrap());
        let b = FieldValue::Decimal("10000000.020".parse().unwrap());
        let c = FieldValue::Decimal("10000000.03".parse().unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
