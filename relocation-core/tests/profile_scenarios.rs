use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use relocation_core::card::{CardError, CardSaver, EditOutcome, EditableCard};
use relocation_core::profile::{ProfileError, ProfilePage, ProfileSection};
use relocation_core::wizard::{CapacityError, FormField, FormFlag, Wizard, WizardError, WizardStep};
use relocation_core::{
    DataSource, FieldChanges, FieldValue, Record, RecordId, RecordKind, RepositoryError, Session,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// In-memory rows per kind; updates for the listed rows fail.
#[derive(Default)]
struct MemorySource {
    rows: Mutex<Vec<(RecordKind, Record)>>,
    updates: Mutex<Vec<(RecordKind, RecordId, FieldChanges)>>,
    failing_updates: Vec<(RecordKind, RecordId)>,
    failing_lists: bool,
}

impl MemorySource {
    fn with_row(
        self,
        kind: RecordKind,
        record: Record,
    ) -> Self {
        self.rows.lock().unwrap().push((kind, record));
        self
    }

    fn updates(&self) -> Vec<(RecordKind, RecordId, FieldChanges)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn list(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<Record>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn list_where(
        &self,
        kind: RecordKind,
        column: &str,
        value: &FieldValue,
    ) -> Result<Vec<Record>, RepositoryError> {
        if self.failing_lists {
            return Err(RepositoryError::Connection("offline".into()));
        }
        let rows = self.list(kind).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.get(column) == Some(value))
            .collect())
    }

    async fn get_by_id(
        &self,
        kind: RecordKind,
        id: RecordId,
    ) -> Result<Record, RepositoryError> {
        self.list(kind)
            .await?
            .into_iter()
            .find(|r| r.id() == Some(id))
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: RecordId,
        fields: &FieldChanges,
    ) -> Result<(), RepositoryError> {
        self.updates
            .lock()
            .unwrap()
            .push((kind, id, fields.clone()));
        if self.failing_updates.contains(&(kind, id)) {
            return Err(RepositoryError::Database("write rejected".into()));
        }
        Ok(())
    }

    async fn insert(
        &self,
        _kind: RecordKind,
        _fields: &FieldChanges,
    ) -> Result<RecordId, RepositoryError> {
        Err(RepositoryError::Configuration("read-only".into()))
    }
}

fn ana() -> Record {
    Record::new()
        .with("id", 1_i64)
        .with("email", "ana@example.com")
        .with("full_name", "Ana")
        .with("nationality", "Portuguese")
        .with("family_size", 3_i64)
        .with("occupation", "Nurse")
}

fn child(
    id: RecordId,
    name: &str,
    age: i64,
) -> Record {
    Record::new()
        .with("id", id)
        .with("user_id", 1_i64)
        .with("full_name", name)
        .with("age", age)
        .with("current_grade", FieldValue::Null)
}

fn family_source() -> MemorySource {
    MemorySource::default()
        .with_row(RecordKind::Profiles, ana())
        .with_row(RecordKind::Children, child(7, "Noah", 6))
        .with_row(RecordKind::Children, child(8, "Mia", 3))
        .with_row(
            RecordKind::Preferences,
            Record::new()
                .with("id", 3_i64)
                .with("user_id", 1_i64)
                .with("budget_min", 5000_i64)
                .with("budget_max", 9000_i64)
                .with("owns_car", false)
                .with("workplace_id", FieldValue::Null),
        )
}

fn logged_in() -> Session {
    Session::from_parts(Some(ana()), false)
}

#[test]
fn household_of_three_without_partner_allows_two_children() {
    init_tracing();
    let mut wizard = Wizard::new();
    wizard.set_text(FormField::FamilySize, "3").unwrap();
    wizard.set_flag(FormFlag::HasPartner, false).unwrap();

    assert_eq!(wizard.max_children(), Ok(2));
    wizard.add_child().unwrap();
    wizard.add_child().unwrap();
    assert!(!wizard.can_add_child());
    assert_eq!(
        wizard.add_child(),
        Err(WizardError::Capacity(CapacityError::LimitReached { max: 2 }))
    );
    assert_eq!(wizard.children().len(), 2);
}

#[test]
fn invalid_household_stays_on_first_step() {
    let mut wizard = Wizard::new();
    wizard.set_text(FormField::FamilySize, "0").unwrap();

    for _ in 0..2 {
        assert!(matches!(wizard.next(), Err(WizardError::Validation { .. })));
        assert_eq!(wizard.current_step(), Some(WizardStep::Household));
        let keys: Vec<_> = wizard.field_errors().keys().collect();
        assert_eq!(keys, vec!["family_size", "nationality"]);
    }
}

#[tokio::test]
async fn cancelled_edit_reverts_to_stored_value() {
    let mut card = EditableCard::single("User Information", ana());
    card.begin_edit();
    card.set_field("full_name", "Ana Lee", None).unwrap();
    assert_eq!(
        card.resolve_display_value(&ana(), "full_name"),
        Some(&FieldValue::from("Ana Lee"))
    );

    assert!(matches!(card.cancel(), EditOutcome::Cancelled));
    assert!(card.pending().is_empty());
    assert_eq!(
        card.resolve_display_value(&ana(), "full_name"),
        Some(&FieldValue::from("Ana"))
    );
}

#[tokio::test]
async fn editing_one_child_saves_only_that_child() {
    init_tracing();
    let source = family_source();
    let mut page = ProfilePage::load(&source, &logged_in()).await.unwrap();

    page.begin_edit(ProfileSection::Children).unwrap();
    assert!(!page.is_editing(ProfileSection::User));
    page.set_field(ProfileSection::Children, "current_grade", "Grade 1", Some(7))
        .unwrap();

    let report = page
        .commit(ProfileSection::Children, &source)
        .await
        .unwrap();

    assert_eq!(report.calls(), 1);
    let updates = source.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, RecordKind::Children);
    assert_eq!(updates[0].1, 7);
    assert_eq!(updates[0].2["current_grade"], FieldValue::from("Grade 1"));
    assert!(!page.is_editing(ProfileSection::Children));
}

#[tokio::test]
async fn failed_child_save_does_not_block_the_others() {
    let source = MemorySource {
        failing_updates: vec![(RecordKind::Children, 7)],
        ..family_source()
    };
    let mut page = ProfilePage::load(&source, &logged_in()).await.unwrap();

    page.begin_edit(ProfileSection::Children).unwrap();
    page.set_field(ProfileSection::Children, "age", 7_i64, Some(7))
        .unwrap();
    page.set_field(ProfileSection::Children, "age", 4_i64, Some(8))
        .unwrap();
    let report = page
        .commit(ProfileSection::Children, &source)
        .await
        .unwrap();

    assert_eq!(report.saved, vec![Some(8)]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].record_id, Some(7));
    assert!(!page.is_editing(ProfileSection::Children));

    let card = page.card(ProfileSection::Children).unwrap();
    assert!(card.pending().is_empty());
    let ages: Vec<_> = card.records().iter().map(|r| r.get("age").cloned()).collect();
    assert_eq!(
        ages,
        vec![Some(FieldValue::Integer(6)), Some(FieldValue::Integer(4))]
    );
}

#[tokio::test]
async fn derived_preference_entries_are_read_only() {
    let source = family_source();
    let mut page = ProfilePage::load(&source, &logged_in()).await.unwrap();
    let card = page.card(ProfileSection::Preferences).unwrap();
    let prefs = &card.records()[0];

    let views = card.field_views(prefs, true);
    let budget = views.iter().find(|v| v.key == "Budget").unwrap();
    assert_eq!(budget.value, "5000 - 9000");
    assert!(!budget.input);
    let workplace = views.iter().find(|v| v.key == "Workplace").unwrap();
    assert_eq!(workplace.value, "Not selected");
    assert!(views.iter().all(|v| v.key != "workplace_id"));

    page.begin_edit(ProfileSection::Preferences).unwrap();
    let err = page
        .set_field(ProfileSection::Preferences, "Budget", "1 - 2", None)
        .unwrap_err();
    assert!(matches!(
        err,
        ProfileError::Card(CardError::ReadOnlyKey(ref key)) if key == "Budget"
    ));
}

#[tokio::test]
async fn saved_budget_refreshes_the_budget_entry() {
    let source = family_source();
    let mut page = ProfilePage::load(&source, &logged_in()).await.unwrap();

    page.begin_edit(ProfileSection::Preferences).unwrap();
    page.set_field(ProfileSection::Preferences, "budget_min", "6000", None)
        .unwrap();
    let report = page
        .commit(ProfileSection::Preferences, &source)
        .await
        .unwrap();
    assert!(report.all_saved());

    let card = page.card(ProfileSection::Preferences).unwrap();
    let prefs = &card.records()[0];
    assert_eq!(prefs.text("budget_min"), Some("6000"));
    let views = card.field_views(prefs, false);
    let budget = views.iter().find(|v| v.key == "Budget").unwrap();
    assert_eq!(budget.value, "6000 - 9000");
}

#[tokio::test]
async fn rejected_budget_save_keeps_the_budget_entry() {
    let source = MemorySource {
        failing_updates: vec![(RecordKind::Preferences, 3)],
        ..family_source()
    };
    let mut page = ProfilePage::load(&source, &logged_in()).await.unwrap();

    page.begin_edit(ProfileSection::Preferences).unwrap();
    page.set_field(ProfileSection::Preferences, "budget_max", "12000", None)
        .unwrap();
    let report = page
        .commit(ProfileSection::Preferences, &source)
        .await
        .unwrap();
    assert!(!report.all_saved());

    let prefs = &page.card(ProfileSection::Preferences).unwrap().records()[0];
    assert_eq!(prefs.text("Budget"), Some("5000 - 9000"));
}

#[tokio::test]
async fn unavailable_sections_are_left_out() {
    let source = MemorySource {
        failing_lists: true,
        ..family_source()
    };
    let page = ProfilePage::load(&source, &logged_in()).await.unwrap();
    assert_eq!(page.sections(), vec![ProfileSection::User]);

    let err = ProfilePage::load(&source, &Session::from_parts(None, false))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileError::NotLoggedIn));
}

struct RejectAll;

#[async_trait]
impl CardSaver for RejectAll {
    async fn save(
        &self,
        _changes: &FieldChanges,
        _original: &Record,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Connection("offline".into()))
    }
}

#[tokio::test]
async fn rejected_single_save_keeps_stored_value() {
    let mut card = EditableCard::single("User Information", ana());
    card.begin_edit();
    card.set_field("occupation", "Engineer", None).unwrap();

    let EditOutcome::Committed(report) = card.commit(&RejectAll).await else {
        panic!("commit must report its saves");
    };
    assert_eq!(report.calls(), 1);
    assert!(!report.all_saved());
    assert!(card.pending().is_empty());
    assert_eq!(card.records()[0].text("occupation"), Some("Nurse"));
}
