//! Profile page assembly: one editable card per section of the user's
//! profile, each with its own edit flag.

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::card::{CardError, CommitReport, DataSourceSaver, EditOutcome, EditableCard};
use crate::db::{DataSource, RepositoryError};
use crate::models::{FieldValue, Record, RecordId, RecordKind};
use crate::session::Session;

/// Keys shown as text even while their card is being edited.
pub const ALWAYS_TEXT_KEYS: [&str; 4] = ["full_name", "nationality", "Budget", "Workplace"];

pub const USER_EXCLUDED_KEYS: [&str; 7] = [
    "id",
    "email",
    "photo_url",
    "avatar_url",
    "created_at",
    "user_id",
    "family_size",
];
pub const CHILD_EXCLUDED_KEYS: [&str; 3] = ["id", "user_id", "created_at"];
pub const PREFERENCE_EXCLUDED_KEYS: [&str; 3] = ["id", "user_id", "workplace_id"];

const BUDGET_KEY: &str = "Budget";
const WORKPLACE_KEY: &str = "Workplace";
const NO_WORKPLACE: &str = "Not selected";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("the logged-in profile has no id")]
    MissingUserId,

    #[error("the {0} card is not shown")]
    CardNotShown(ProfileSection),

    #[error(transparent)]
    Card(#[from] CardError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The cards of the profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileSection {
    User,
    Children,
    Preferences,
}

impl ProfileSection {
    pub fn all() -> &'static [ProfileSection] {
        &[Self::User, Self::Children, Self::Preferences]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::User => "User Information",
            Self::Children => "Children",
            Self::Preferences => "Preferences",
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::User => RecordKind::Profiles,
            Self::Children => RecordKind::Children,
            Self::Preferences => RecordKind::Preferences,
        }
    }

    /// Notice shown to the user when a save for this card fails.
    pub fn failure_notice(&self) -> &'static str {
        match self {
            Self::User => "Failed to update user data.",
            Self::Children => "Failed to update child data.",
            Self::Preferences => "Failed to update preferences.",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "profile" => Some(Self::User),
            "children" | "child" => Some(Self::Children),
            "preferences" | "prefs" => Some(Self::Preferences),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileSection {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One edit flag per card; toggling one never touches another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditModes {
    pub user: bool,
    pub children: bool,
    pub preferences: bool,
}

impl EditModes {
    pub fn get(
        &self,
        section: ProfileSection,
    ) -> bool {
        match section {
            ProfileSection::User => self.user,
            ProfileSection::Children => self.children,
            ProfileSection::Preferences => self.preferences,
        }
    }

    pub fn set(
        &mut self,
        section: ProfileSection,
        editing: bool,
    ) {
        let flag = match section {
            ProfileSection::User => &mut self.user,
            ProfileSection::Children => &mut self.children,
            ProfileSection::Preferences => &mut self.preferences,
        };
        *flag = editing;
    }

    pub fn toggle(
        &mut self,
        section: ProfileSection,
    ) {
        self.set(section, !self.get(section));
    }
}

/// "Noah (6, Grade 1)".
pub fn child_summary(child: &Record) -> String {
    let show = |key: &str| {
        child
            .get(key)
            .map_or_else(|| FieldValue::Null.to_string(), ToString::to_string)
    };
    format!(
        "{} ({}, {})",
        show("full_name"),
        show("age"),
        show("current_grade")
    )
}

#[derive(Debug, Clone)]
pub struct ProfilePage {
    user_id: RecordId,
    full_name: String,
    nationality: String,
    user: EditableCard,
    children: Option<EditableCard>,
    preferences: Option<EditableCard>,
    modes: EditModes,
}

impl ProfilePage {
    /// Fetches the user's sections and builds their cards.
    ///
    /// Only the session is required. Failed lookups for children,
    /// preferences, or the workplace are logged and the section is shown
    /// as empty.
    pub async fn load(
        source: &dyn DataSource,
        session: &Session,
    ) -> Result<Self, ProfileError> {
        let profile = session.profile().ok_or(ProfileError::NotLoggedIn)?;
        let user_id = profile.id().ok_or(ProfileError::MissingUserId)?;
        let owner = FieldValue::Integer(user_id);

        let children = match source
            .list_where(RecordKind::Children, "user_id", &owner)
            .await
        {
            Ok(children) => children,
            Err(e) => {
                error!(user = user_id, error = %e, "Error fetching children");
                Vec::new()
            }
        };

        let preferences = match source
            .list_where(RecordKind::Preferences, "user_id", &owner)
            .await
        {
            Ok(rows) => {
                if rows.len() > 1 {
                    warn!(user = user_id, rows = rows.len(), "more than one preferences row");
                }
                rows.into_iter().next()
            }
            Err(e) => {
                error!(user = user_id, error = %e, "Error fetching preferences");
                None
            }
        };

        let workplace = match preferences
            .as_ref()
            .and_then(|p| p.get("workplace_id"))
            .and_then(FieldValue::as_i64)
        {
            Some(id) => match source.get_by_id(RecordKind::Workplaces, id).await {
                Ok(workplace) => Some(workplace),
                Err(e) => {
                    error!(user = user_id, workplace = id, error = %e, "Error fetching workplace");
                    None
                }
            },
            None => None,
        };

        debug!(
            user = user_id,
            children = children.len(),
            has_preferences = preferences.is_some(),
            "profile loaded"
        );

        let user = EditableCard::single(ProfileSection::User.title(), profile.clone())
            .with_excluded_keys(USER_EXCLUDED_KEYS)
            .with_read_only_keys(ALWAYS_TEXT_KEYS);

        let children = if children.is_empty() {
            None
        } else {
            Some(
                EditableCard::multi(ProfileSection::Children.title(), children)?
                    .with_excluded_keys(CHILD_EXCLUDED_KEYS)
                    .with_read_only_keys(ALWAYS_TEXT_KEYS),
            )
        };

        let preferences = preferences.map(|prefs| {
            EditableCard::single(
                ProfileSection::Preferences.title(),
                with_derived_preferences(prefs, workplace.as_ref()),
            )
            .with_excluded_keys(PREFERENCE_EXCLUDED_KEYS)
            .with_read_only_keys(ALWAYS_TEXT_KEYS)
        });

        Ok(Self {
            user_id,
            full_name: profile.text("full_name").unwrap_or_default().to_string(),
            nationality: profile.text("nationality").unwrap_or_default().to_string(),
            user,
            children,
            preferences,
            modes: EditModes::default(),
        })
    }

    pub fn user_id(&self) -> RecordId {
        self.user_id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn nationality(&self) -> &str {
        &self.nationality
    }

    pub fn modes(&self) -> EditModes {
        self.modes
    }

    pub fn is_editing(
        &self,
        section: ProfileSection,
    ) -> bool {
        self.modes.get(section)
    }

    /// Sections that have a card, in page order.
    pub fn sections(&self) -> Vec<ProfileSection> {
        ProfileSection::all()
            .iter()
            .copied()
            .filter(|s| self.card(*s).is_some())
            .collect()
    }

    pub fn card(
        &self,
        section: ProfileSection,
    ) -> Option<&EditableCard> {
        match section {
            ProfileSection::User => Some(&self.user),
            ProfileSection::Children => self.children.as_ref(),
            ProfileSection::Preferences => self.preferences.as_ref(),
        }
    }

    fn card_mut(
        &mut self,
        section: ProfileSection,
    ) -> Result<&mut EditableCard, ProfileError> {
        match section {
            ProfileSection::User => Some(&mut self.user),
            ProfileSection::Children => self.children.as_mut(),
            ProfileSection::Preferences => self.preferences.as_mut(),
        }
        .ok_or(ProfileError::CardNotShown(section))
    }

    /// Turns the section's edit flag on with an empty change buffer.
    pub fn begin_edit(
        &mut self,
        section: ProfileSection,
    ) -> Result<(), ProfileError> {
        self.card_mut(section)?.begin_edit();
        self.modes.set(section, true);
        Ok(())
    }

    pub fn set_field(
        &mut self,
        section: ProfileSection,
        key: &str,
        value: impl Into<FieldValue>,
        record_id: Option<RecordId>,
    ) -> Result<(), ProfileError> {
        self.card_mut(section)?
            .set_field(key, value, record_id)
            .map_err(ProfileError::from)
    }

    /// Saves the section's edits and leaves edit mode whatever the outcome.
    pub async fn commit(
        &mut self,
        section: ProfileSection,
        source: &dyn DataSource,
    ) -> Result<CommitReport, ProfileError> {
        let saver = DataSourceSaver::new(source, section.kind());
        let card = self.card_mut(section)?;
        let outcome = card.commit(&saver).await;
        self.modes.set(section, false);
        match outcome {
            EditOutcome::Committed(report) => {
                if section == ProfileSection::Preferences && !report.saved.is_empty() {
                    if let Some(prefs) = self.preferences.as_mut() {
                        prefs.records_mut().iter_mut().for_each(set_budget_entry);
                    }
                }
                if !report.all_saved() {
                    warn!(section = %section, failed = report.failed.len(), "{}", section.failure_notice());
                }
                Ok(report)
            }
            EditOutcome::Cancelled => Ok(CommitReport::default()),
        }
    }

    pub fn cancel(
        &mut self,
        section: ProfileSection,
    ) -> Result<(), ProfileError> {
        let _ = self.card_mut(section)?.cancel();
        self.modes.set(section, false);
        Ok(())
    }
}

/// Preferences row plus the read-only `Budget` and `Workplace` entries.
fn with_derived_preferences(
    mut prefs: Record,
    workplace: Option<&Record>,
) -> Record {
    let workplace = workplace
        .and_then(|w| w.text("name"))
        .filter(|name| !name.is_empty())
        .unwrap_or(NO_WORKPLACE)
        .to_string();
    set_budget_entry(&mut prefs);
    prefs.set(WORKPLACE_KEY, workplace);
    prefs
}

/// Rewrites `Budget` from the stored `budget_min` and `budget_max`.
fn set_budget_entry(prefs: &mut Record) {
    let show = |key: &str| {
        prefs
            .get(key)
            .map_or_else(|| FieldValue::Null.to_string(), ToString::to_string)
    };
    let budget = format!("{} - {}", show("budget_min"), show("budget_max"));
    prefs.set(BUDGET_KEY, budget);
}
