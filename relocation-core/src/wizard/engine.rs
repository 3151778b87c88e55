use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::validation::{
    BUDGET_MAX_REQUIRED, BUDGET_MIN_REQUIRED, CHILD_AGE_POSITIVE, FAMILY_SIZE_TOO_SMALL,
    validate_step,
};
use super::{
    CapacityError, ChildEntry, ChildField, FieldErrors, FormField, FormFlag, WizardError,
    WizardForm,
};
use crate::models::{ChildProfile, GeoPoint, RelocationProfile};
use crate::utils::{parse_decimal, parse_integer, parse_plain_decimal};

/// The four questionnaire pages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Household = 1,
    Work = 2,
    Budget = 3,
    Children = 4,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Household => Some(Self::Work),
            Self::Work => Some(Self::Budget),
            Self::Budget => Some(Self::Children),
            Self::Children => None,
        }
    }

    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::Household => None,
            Self::Work => Some(Self::Household),
            Self::Budget => Some(Self::Work),
            Self::Children => Some(Self::Budget),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Household => "Complete your information",
            Self::Work => "Work Information",
            Self::Budget => "Financial & Lifestyle",
            Self::Children => "Children Details",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStatus {
    Active(WizardStep),
    Submitted,
    Cancelled,
}

/// Everything the user entered, handed over on submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub form: WizardForm,
    pub children: Vec<ChildEntry>,
}

impl WizardSnapshot {
    /// Parses the raw answers into a [`RelocationProfile`].
    ///
    /// Fields edited after their step was validated can still be
    /// unparseable here; those are reported as field errors.
    pub fn to_profile(&self) -> Result<RelocationProfile, FieldErrors> {
        let mut errors = FieldErrors::new();
        let form = &self.form;

        let family_size = parse_integer(&form.family_size).ok().filter(|n| *n >= 1);
        if family_size.is_none() {
            errors.insert(FormField::FamilySize.key(), FAMILY_SIZE_TOO_SMALL);
        }
        let budget_min = parse_decimal(&form.budget_min).ok();
        if budget_min.is_none() {
            errors.insert(FormField::BudgetMin.key(), BUDGET_MIN_REQUIRED);
        }
        let budget_max = parse_decimal(&form.budget_max).ok();
        if budget_max.is_none() {
            errors.insert(FormField::BudgetMax.key(), BUDGET_MAX_REQUIRED);
        }

        let mut children = Vec::with_capacity(self.children.len());
        for (index, child) in self.children.iter().enumerate() {
            match parse_plain_decimal(&child.age) {
                Ok(age) => children.push(ChildProfile {
                    full_name: child.full_name.trim().to_string(),
                    age,
                    current_grade: non_blank(&child.current_grade),
                    education_stage: non_blank(&child.education_stage),
                    preferred_curriculum: non_blank(&child.preferred_curriculum),
                }),
                Err(_) => errors.insert(ChildField::Age.error_key(index), CHILD_AGE_POSITIVE),
            }
        }

        let (Some(family_size), Some(budget_min), Some(budget_max)) =
            (family_size, budget_min, budget_max)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let work_location = match (
            parse_plain_decimal(&form.work_location.latitude),
            parse_plain_decimal(&form.work_location.longitude),
        ) {
            (Ok(latitude), Ok(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(RelocationProfile {
            nationality: form.nationality.trim().to_string(),
            family_size,
            has_partner: form.has_partner,
            occupation: form.occupation.trim().to_string(),
            work_city: form.work_city.trim().to_string(),
            industry: non_blank(&form.industry),
            work_location,
            budget_min,
            budget_max,
            owns_car: form.owns_car,
            children,
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Receives the finished questionnaire and closes the surface hosting it.
pub trait Navigator {
    fn submitted(
        &mut self,
        snapshot: WizardSnapshot,
    );

    fn close(&mut self);
}

/// The relocation questionnaire state machine.
///
/// Forward moves validate only the current step; backward moves never
/// validate. Editing a field clears that field's error and nothing else.
#[derive(Debug, Clone)]
pub struct Wizard {
    status: WizardStatus,
    form: WizardForm,
    children: Vec<ChildEntry>,
    errors: FieldErrors,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            status: WizardStatus::Active(WizardStep::Household),
            form: WizardForm::default(),
            children: Vec::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    /// Current page, or `None` once submitted or cancelled.
    pub fn current_step(&self) -> Option<WizardStep> {
        match self.status {
            WizardStatus::Active(step) => Some(step),
            WizardStatus::Submitted | WizardStatus::Cancelled => None,
        }
    }

    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    pub fn children(&self) -> &[ChildEntry] {
        &self.children
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    fn active_step(&self) -> Result<WizardStep, WizardError> {
        self.current_step().ok_or(WizardError::Closed)
    }

    pub fn set_text(
        &mut self,
        field: FormField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.active_step()?;
        self.form.set_text(field, value.into());
        self.errors.remove(field.key());

        if matches!(field, FormField::FamilySize) {
            self.warn_on_excess_children();
        }
        Ok(())
    }

    pub fn set_flag(
        &mut self,
        flag: FormFlag,
        value: bool,
    ) -> Result<(), WizardError> {
        self.active_step()?;
        self.form.set_flag(flag, value);
        self.errors.remove(flag.key());

        if matches!(flag, FormFlag::HasPartner) {
            self.warn_on_excess_children();
        }
        Ok(())
    }

    // Existing children are never trimmed when the household shrinks.
    fn warn_on_excess_children(&self) {
        if let Ok(max) = self.max_children() {
            if self.children.len() > max {
                warn!(
                    children = self.children.len(),
                    max, "household now allows fewer children than entered"
                );
            }
        }
    }

    /// `family_size - 2` with a partner, `family_size - 1` without,
    /// floored at zero.
    pub fn max_children(&self) -> Result<usize, CapacityError> {
        let family_size = parse_integer(&self.form.family_size)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(CapacityError::InvalidFamilySize)?;
        let adults = if self.form.has_partner { 2 } else { 1 };
        Ok(usize::try_from((family_size - adults).max(0)).unwrap_or(usize::MAX))
    }

    pub fn can_add_child(&self) -> bool {
        self.max_children()
            .is_ok_and(|max| self.children.len() < max)
    }

    /// Appends an empty child and returns its index.
    pub fn add_child(&mut self) -> Result<usize, WizardError> {
        self.active_step()?;
        let max = self.max_children().inspect_err(|e| {
            warn!(error = %e, "add child rejected");
        })?;
        if self.children.len() >= max {
            warn!(max, "add child rejected: limit reached");
            return Err(CapacityError::LimitReached { max }.into());
        }

        self.children.push(ChildEntry::default());
        debug!(count = self.children.len(), max, "child added");
        Ok(self.children.len() - 1)
    }

    pub fn update_child(
        &mut self,
        index: usize,
        field: ChildField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.active_step()?;
        let len = self.children.len();
        let child = self
            .children
            .get_mut(index)
            .ok_or(WizardError::ChildIndexOutOfRange { index, len })?;

        child.set_text(field, value.into());
        self.errors.remove(&field.error_key(index));
        Ok(())
    }

    /// Validates the current step and moves to the next one.
    ///
    /// On failure the error map is replaced with this step's errors and the
    /// step does not change.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.active_step()?;
        let next = step.next().ok_or(WizardError::InvalidTransition {
            step,
            action: "advance",
        })?;

        self.validate_current(step)?;

        self.errors.clear();
        self.status = WizardStatus::Active(next);
        debug!(from = step.number(), to = next.number(), "wizard advanced");
        Ok(next)
    }

    /// Moves one step back without validating anything.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.active_step()?;
        let previous = step.previous().ok_or(WizardError::InvalidTransition {
            step,
            action: "go back",
        })?;

        self.errors.clear();
        self.status = WizardStatus::Active(previous);
        debug!(from = step.number(), to = previous.number(), "wizard went back");
        Ok(previous)
    }

    /// Validates the children step, hands the snapshot to `navigator` and
    /// closes the wizard. A submitted wizard rejects every later call.
    pub fn submit(
        &mut self,
        navigator: &mut dyn Navigator,
    ) -> Result<(), WizardError> {
        let step = self.active_step()?;
        if step != WizardStep::Children {
            return Err(WizardError::InvalidTransition {
                step,
                action: "submit",
            });
        }

        self.validate_current(step)?;

        let snapshot = WizardSnapshot {
            form: std::mem::take(&mut self.form),
            children: std::mem::take(&mut self.children),
        };
        self.errors.clear();
        self.status = WizardStatus::Submitted;
        info!(children = snapshot.children.len(), "relocation profile submitted");

        navigator.submitted(snapshot);
        navigator.close();
        Ok(())
    }

    /// Discards everything entered so far.
    pub fn cancel(&mut self) -> Result<(), WizardError> {
        let step = self.active_step()?;
        self.form = WizardForm::default();
        self.children.clear();
        self.errors.clear();
        self.status = WizardStatus::Cancelled;
        debug!(at = step.number(), "wizard cancelled");
        Ok(())
    }

    fn validate_current(
        &mut self,
        step: WizardStep,
    ) -> Result<(), WizardError> {
        let errors = validate_step(step, &self.form, &self.children);
        if errors.is_empty() {
            return Ok(());
        }

        debug!(step = step.number(), failed = errors.len(), "step validation failed");
        self.errors = errors.clone();
        Err(WizardError::Validation { step, errors })
    }
}
