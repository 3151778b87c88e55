use relocation_core::{FieldValue, RecordKind, RepositoryError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::Query;
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};

use crate::schema::{Column, ColumnType};

/// A value ready to be bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn bind<'q>(
        self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            Self::Null => query.bind(None::<String>),
            Self::Integer(i) => query.bind(i),
            Self::Real(r) => query.bind(r),
            Self::Text(s) => query.bind(s),
        }
    }
}

/// Convert a Decimal to f64 for SQLite storage.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Coerce an edited value to the column's storage type.
///
/// Blank input clears non-text columns. Text is parsed the same way the
/// forms parse it, so `"1,250"` lands in a REAL column as 1250.
pub fn to_sql(
    kind: RecordKind,
    column: Column,
    value: &FieldValue,
) -> Result<SqlValue, RepositoryError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    if column.ty != ColumnType::Text && value.is_blank() {
        return Ok(SqlValue::Null);
    }

    let invalid = |expected: &str| RepositoryError::InvalidField {
        kind,
        field: column.name.to_string(),
        reason: format!("expected {expected}, got '{value}'"),
    };

    match column.ty {
        ColumnType::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid("a whole number")),
        ColumnType::Real => value
            .as_decimal()
            .map(|d| SqlValue::Real(decimal_to_f64(d)))
            .ok_or_else(|| invalid("a number")),
        ColumnType::Bool => value
            .as_bool()
            .map(|b| SqlValue::Integer(i64::from(b)))
            .ok_or_else(|| invalid("true or false")),
        ColumnType::Text => Ok(match value {
            FieldValue::Text(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }),
    }
}

/// Get a decimal value from a row, handling both INTEGER and REAL SQLite types.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val)
                .map(|d| d.normalize())
                .map_err(|e| {
                    RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
                })
        }
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            val.trim().parse::<Decimal>().map_err(|e| {
                RepositoryError::Database(format!("Failed to parse decimal '{}': {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Read one column of `row` as a [`FieldValue`] shaped by the schema.
pub fn read_field(
    row: &SqliteRow,
    column: Column,
) -> Result<FieldValue, RepositoryError> {
    let name = column.name;
    let value_ref = row
        .try_get_raw(name)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", name, e)))?;
    if value_ref.is_null() {
        return Ok(FieldValue::Null);
    }

    let db_err = |e: sqlx::Error| RepositoryError::Database(format!("Failed to read '{}': {}", name, e));
    Ok(match column.ty {
        ColumnType::Integer => FieldValue::Integer(row.try_get::<i64, _>(name).map_err(db_err)?),
        ColumnType::Bool => FieldValue::Bool(row.try_get::<i64, _>(name).map_err(db_err)? != 0),
        ColumnType::Real => FieldValue::Decimal(get_decimal(row, name)?),
        ColumnType::Text => FieldValue::Text(row.try_get::<String, _>(name).map_err(db_err)?),
    })
}
