//! Glue between the command line and the relocation engine.

use std::fmt;
use std::str::FromStr;

use relocation_core::card::{CommitReport, EditableCard};
use relocation_core::db::{DataSource, DataSourceRegistry, RepositoryError};
use relocation_core::listing::{
    ListingFilter, ListingOutcome, SchoolQuery, property_summary, school_summary,
};
use relocation_core::profile::{ProfileError, ProfilePage, ProfileSection, child_summary};
use relocation_core::wizard::{
    ChildField, FieldErrors, FormField, FormFlag, Navigator, Wizard, WizardError, WizardSnapshot,
    WizardStep,
};
use relocation_core::{FieldValue, Record, RecordId, RecordKind, RelocationProfile, Session};
use relocation_db_sqlite::SqliteDataSourceFactory;
use thiserror::Error;
use tracing::{debug, info};

/// Registry with every backend this binary ships.
pub fn build_registry() -> DataSourceRegistry {
    let mut registry = DataSourceRegistry::new();
    registry.register(Box::new(SqliteDataSourceFactory));
    registry
}

/// Looks the user up and reports the resulting session. An unknown id is
/// a logged-out session, not an error.
pub async fn sign_in(
    source: &dyn DataSource,
    user_id: RecordId,
) -> Result<Session, RepositoryError> {
    match source.get_by_id(RecordKind::Profiles, user_id).await {
        Ok(profile) => Ok(Session::from_parts(Some(profile), false)),
        Err(RepositoryError::NotFound) => {
            debug!(user = user_id, "no such profile");
            Ok(Session::from_parts(None, false))
        }
        Err(e) => Err(e),
    }
}

// ─── wizard answers ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AnswersError {
    #[error("invalid answers document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown question '{0}'")]
    UnknownKey(String),

    #[error("'{0}' must be a string, number or boolean")]
    UnsupportedValue(String),

    #[error("'{0}' must be true or false")]
    NotAFlag(String),

    #[error("'children' must be an array of tables")]
    ChildrenShape,
}

/// Answers to the questionnaire, read from a TOML document.
///
/// ```toml
/// nationality = "Portuguese"
/// family_size = 3
/// has_partner = true
/// occupation = "Engineer"
/// work_city = "Dubai"
/// budget_min = 5000
/// budget_max = 9000
///
/// [[children]]
/// full_name = "Noah"
/// age = 6
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardAnswers {
    pub texts: Vec<(FormField, String)>,
    pub flags: Vec<(FormFlag, bool)>,
    pub children: Vec<Vec<(ChildField, String)>>,
}

impl WizardAnswers {
    pub fn from_toml_str(text: &str) -> Result<Self, AnswersError> {
        let table: toml::Table = toml::from_str(text)?;
        let mut answers = Self::default();

        for (key, value) in &table {
            if key == "children" {
                let rows = value.as_array().ok_or(AnswersError::ChildrenShape)?;
                for row in rows {
                    let row = row.as_table().ok_or(AnswersError::ChildrenShape)?;
                    answers.children.push(child_answers(row)?);
                }
            } else if let Some(flag) = FormFlag::parse(key) {
                let value = value
                    .as_bool()
                    .ok_or_else(|| AnswersError::NotAFlag(key.clone()))?;
                answers.flags.push((flag, value));
            } else if let Some(field) = FormField::parse(key) {
                answers.texts.push((field, answer_text(key, value)?));
            } else {
                return Err(AnswersError::UnknownKey(key.clone()));
            }
        }
        Ok(answers)
    }
}

fn child_answers(row: &toml::Table) -> Result<Vec<(ChildField, String)>, AnswersError> {
    row.iter()
        .map(|(key, value)| {
            let field = ChildField::parse(key)
                .ok_or_else(|| AnswersError::UnknownKey(format!("children.{key}")))?;
            Ok((field, answer_text(key, value)?))
        })
        .collect()
}

// Inputs are text fields; numbers are typed as the user would type them.
fn answer_text(
    key: &str,
    value: &toml::Value,
) -> Result<String, AnswersError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        _ => Err(AnswersError::UnsupportedValue(key.to_string())),
    }
}

/// Holds the snapshot handed over on submit.
#[derive(Debug, Default)]
pub struct CollectingNavigator {
    pub snapshot: Option<WizardSnapshot>,
    pub closed: bool,
}

impl Navigator for CollectingNavigator {
    fn submitted(
        &mut self,
        snapshot: WizardSnapshot,
    ) {
        self.snapshot = Some(snapshot);
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Walks the questionnaire page by page, filling each page's answers
/// before moving on, then adds the children and submits.
pub fn run_wizard(answers: &WizardAnswers) -> Result<WizardSnapshot, WizardError> {
    let mut wizard = Wizard::new();
    let mut step = WizardStep::Household;
    loop {
        for (field, value) in answers.texts.iter().filter(|(f, _)| f.step() == step) {
            wizard.set_text(*field, value.as_str())?;
        }
        for (flag, value) in answers.flags.iter().filter(|(f, _)| f.step() == step) {
            wizard.set_flag(*flag, *value)?;
        }
        if step.next().is_none() {
            break;
        }
        step = wizard.next()?;
    }

    for child in &answers.children {
        let index = wizard.add_child()?;
        for (field, value) in child {
            wizard.update_child(index, *field, value.as_str())?;
        }
    }

    let mut navigator = CollectingNavigator::default();
    wizard.submit(&mut navigator)?;
    navigator.snapshot.ok_or(WizardError::Closed)
}

/// "key: message" per line, sorted by key.
pub fn render_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(key, message)| format!("  {key}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows written by [`persist_submission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub workplace_id: RecordId,
    pub preferences_id: RecordId,
    pub children: Vec<RecordId>,
}

/// Stores a submitted questionnaire for `user_id`.
///
/// The profile row is updated, a workplace row is added, the user's
/// preferences row is updated (or created) to point at it, and one row is
/// added per child. Writes are not transactional; the first failure stops
/// the sequence.
pub async fn persist_submission(
    source: &dyn DataSource,
    user_id: RecordId,
    profile: &RelocationProfile,
) -> Result<PersistSummary, RepositoryError> {
    source
        .update(RecordKind::Profiles, user_id, &profile.profile_changes())
        .await?;

    let workplace_id = source
        .insert(RecordKind::Workplaces, &profile.workplace_fields())
        .await?;

    let preferences = profile.preference_fields(user_id, Some(workplace_id));
    let existing = source
        .list_where(
            RecordKind::Preferences,
            "user_id",
            &FieldValue::Integer(user_id),
        )
        .await?;
    let preferences_id = match existing.first().and_then(|row| row.id()) {
        Some(id) => {
            source
                .update(RecordKind::Preferences, id, &preferences)
                .await?;
            id
        }
        None => {
            source
                .insert(RecordKind::Preferences, &preferences)
                .await?
        }
    };

    let mut children = Vec::with_capacity(profile.children.len());
    for fields in profile.child_fields(user_id) {
        children.push(source.insert(RecordKind::Children, &fields).await?);
    }

    info!(
        user = user_id,
        workplace = workplace_id,
        preferences = preferences_id,
        children = children.len(),
        "relocation profile stored"
    );
    Ok(PersistSummary {
        workplace_id,
        preferences_id,
        children,
    })
}

// ─── profile editing ─────────────────────────────────────────────────────────

/// `key=value` from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in '{s}'"));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Assignment {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// One edit session on `section`: open it, buffer every assignment and
/// commit. A rejected assignment cancels the session before any save.
pub async fn edit_section(
    page: &mut ProfilePage,
    source: &dyn DataSource,
    section: ProfileSection,
    assignments: &[Assignment],
    record_id: Option<RecordId>,
) -> Result<CommitReport, ProfileError> {
    page.begin_edit(section)?;
    for assignment in assignments {
        if let Err(e) = page.set_field(section, &assignment.key, assignment.value.clone(), record_id)
        {
            page.cancel(section)?;
            return Err(e);
        }
    }
    page.commit(section, source).await
}

// ─── rendering ───────────────────────────────────────────────────────────────

pub fn render_profile(
    session: &Session,
    page: Option<&ProfilePage>,
) -> String {
    let mut lines = vec![session.greeting()];
    let Some(page) = page else {
        return lines.join("\n");
    };

    for section in page.sections() {
        let Some(card) = page.card(section) else {
            continue;
        };
        lines.push(String::new());
        lines.push(format!("== {} ==", card.title()));
        render_card(&mut lines, card, page.is_editing(section));
    }
    lines.join("\n")
}

fn render_card(
    lines: &mut Vec<String>,
    card: &EditableCard,
    editing: bool,
) {
    for record in card.records() {
        let indent = if card.is_multi_item() {
            lines.push(format!("- {}", child_summary(record)));
            "    "
        } else {
            ""
        };
        for view in card.field_views(record, editing) {
            if view.input {
                lines.push(format!("{indent}{}: [{}]", view.label, view.value));
            } else {
                lines.push(format!("{indent}{}: {}", view.label, view.value));
            }
        }
    }
}

pub fn render_properties(
    properties: &[Record],
    filter: ListingFilter,
) -> String {
    let outcome = filter.apply(properties);
    if let Some(notice) = outcome.notice() {
        return notice.to_string();
    }
    match outcome {
        ListingOutcome::Items(items) => items
            .into_iter()
            .map(property_summary)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

pub fn render_schools(
    schools: &[Record],
    query: &SchoolQuery,
) -> String {
    let found = query.run(schools);
    if found.is_empty() {
        return "No schools match the search.".to_string();
    }
    found
        .into_iter()
        .map(school_summary)
        .collect::<Vec<_>>()
        .join("\n")
}
