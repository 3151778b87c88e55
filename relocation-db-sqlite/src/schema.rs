use relocation_core::{ID_KEY, RecordKind, RepositoryError};

/// Storage type of a column, as declared in the migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// INTEGER 0/1 read back as a boolean.
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn col(
    name: &'static str,
    ty: ColumnType,
) -> Column {
    Column { name, ty }
}

use ColumnType::{Bool, Integer, Real, Text};

const PROFILES: &[Column] = &[
    col("id", Integer),
    col("email", Text),
    col("full_name", Text),
    col("nationality", Text),
    col("family_size", Integer),
    col("phone", Text),
    col("occupation", Text),
    col("photo_url", Text),
    col("avatar_url", Text),
    col("created_at", Text),
];

const CHILDREN: &[Column] = &[
    col("id", Integer),
    col("user_id", Integer),
    col("full_name", Text),
    col("age", Real),
    col("current_grade", Text),
    col("education_stage", Text),
    col("preferred_curriculum", Text),
    col("created_at", Text),
];

const PREFERENCES: &[Column] = &[
    col("id", Integer),
    col("user_id", Integer),
    col("budget_min", Real),
    col("budget_max", Real),
    col("owns_car", Bool),
    col("workplace_id", Integer),
    col("created_at", Text),
];

const WORKPLACES: &[Column] = &[
    col("id", Integer),
    col("name", Text),
    col("city", Text),
    col("industry", Text),
    col("latitude", Real),
    col("longitude", Real),
    col("created_at", Text),
];

const PROPERTIES: &[Column] = &[
    col("id", Integer),
    col("name", Text),
    col("city", Text),
    col("type", Text),
    col("listing_type", Text),
    col("price", Real),
    col("bedrooms", Integer),
    col("latitude", Real),
    col("longitude", Real),
    col("created_at", Text),
];

const SCHOOLS: &[Column] = &[
    col("id", Integer),
    col("name", Text),
    col("location", Text),
    col("type", Text),
    col("curriculum", Text),
    col("grades", Text),
    col("fees_range", Text),
    col("rating", Real),
    col("transport", Bool),
    col("contact", Text),
    col("website", Text),
    col("latitude", Real),
    col("longitude", Real),
    col("created_at", Text),
];

/// Columns of the table backing `kind`, in declaration order.
pub fn columns(kind: RecordKind) -> &'static [Column] {
    match kind {
        RecordKind::Profiles => PROFILES,
        RecordKind::Children => CHILDREN,
        RecordKind::Preferences => PREFERENCES,
        RecordKind::Workplaces => WORKPLACES,
        RecordKind::Properties => PROPERTIES,
        RecordKind::Schools => SCHOOLS,
    }
}

pub fn column(
    kind: RecordKind,
    name: &str,
) -> Result<Column, RepositoryError> {
    columns(kind)
        .iter()
        .copied()
        .find(|c| c.name == name)
        .ok_or_else(|| RepositoryError::InvalidField {
            kind,
            field: name.to_string(),
            reason: "no such column".to_string(),
        })
}

/// Like [`column`], but refuses the store-assigned `id`.
pub fn writable_column(
    kind: RecordKind,
    name: &str,
) -> Result<Column, RepositoryError> {
    if name == ID_KEY {
        return Err(RepositoryError::InvalidField {
            kind,
            field: name.to_string(),
            reason: "assigned by the store".to_string(),
        });
    }
    column(kind, name)
}

/// `SELECT <every column> FROM <table>`.
pub fn select_all(kind: RecordKind) -> String {
    let names: Vec<&str> = columns(kind).iter().map(|c| c.name).collect();
    format!("SELECT {} FROM {}", names.join(", "), kind.as_str())
}
