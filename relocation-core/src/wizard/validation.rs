//! Step-local validation rules.
//!
//! Each step only checks the fields it shows; nothing here looks at the
//! fields of another step.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::{ChildEntry, ChildField, FormField, WizardForm, WizardStep};
use crate::utils::{parse_decimal, parse_integer, parse_plain_decimal};

pub const NATIONALITY_REQUIRED: &str = "Nationality is required";
pub const FAMILY_SIZE_TOO_SMALL: &str = "Family size must be at least 1";
pub const OCCUPATION_REQUIRED: &str = "Occupation is required";
pub const CITY_REQUIRED: &str = "City is required";
pub const BUDGET_MIN_REQUIRED: &str = "Minimum budget is required";
pub const BUDGET_MAX_REQUIRED: &str = "Maximum budget is required";
pub const CHILD_NAME_REQUIRED: &str = "Full Name is required";
pub const CHILD_AGE_POSITIVE: &str = "Age must be positive";

/// Field key → message for the fields that failed the last forward attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(
        &mut self,
        key: impl Into<String>,
        message: &str,
    ) {
        self.0.insert(key.into(), message.to_string());
    }

    pub(crate) fn remove(
        &mut self,
        key: &str,
    ) {
        self.0.remove(key);
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

/// `true` when `s` reads as a whole number of at least 1.
pub(crate) fn is_valid_family_size(s: &str) -> bool {
    parse_integer(s).is_ok_and(|n| n >= 1)
}

fn is_non_negative(s: &str) -> bool {
    parse_decimal(s).is_ok_and(|d| d >= Decimal::ZERO)
}

fn is_positive(s: &str) -> bool {
    parse_plain_decimal(s).is_ok_and(|d| d > Decimal::ZERO)
}

/// Errors that block leaving `step` forward. Empty means the step is valid.
pub(crate) fn validate_step(
    step: WizardStep,
    form: &WizardForm,
    children: &[ChildEntry],
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match step {
        WizardStep::Household => {
            if form.nationality.trim().is_empty() {
                errors.insert(FormField::Nationality.key(), NATIONALITY_REQUIRED);
            }
            if !is_valid_family_size(&form.family_size) {
                errors.insert(FormField::FamilySize.key(), FAMILY_SIZE_TOO_SMALL);
            }
        }
        WizardStep::Work => {
            if form.occupation.trim().is_empty() {
                errors.insert(FormField::Occupation.key(), OCCUPATION_REQUIRED);
            }
            if form.work_city.trim().is_empty() {
                errors.insert(FormField::WorkCity.key(), CITY_REQUIRED);
            }
        }
        WizardStep::Budget => {
            // No min <= max check: an inverted range is accepted as entered.
            if !is_non_negative(&form.budget_min) {
                errors.insert(FormField::BudgetMin.key(), BUDGET_MIN_REQUIRED);
            }
            if !is_non_negative(&form.budget_max) {
                errors.insert(FormField::BudgetMax.key(), BUDGET_MAX_REQUIRED);
            }
        }
        WizardStep::Children => {
            for (index, child) in children.iter().enumerate() {
                if child.full_name.trim().is_empty() {
                    errors.insert(ChildField::FullName.error_key(index), CHILD_NAME_REQUIRED);
                }
                if !is_positive(&child.age) {
                    errors.insert(ChildField::Age.error_key(index), CHILD_AGE_POSITIVE);
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn form() -> WizardForm {
        WizardForm::default()
    }

    #[test]
    fn household_requires_nationality_and_family_size() {
        let mut f = form();
        f.family_size = "0".into();

        let errors = validate_step(WizardStep::Household, &f, &[]);

        assert_eq!(
            errors.keys().collect::<Vec<_>>(),
            vec!["family_size", "nationality"]
        );
        assert_eq!(errors.get("family_size"), Some(FAMILY_SIZE_TOO_SMALL));
    }

    #[test]
    fn whitespace_nationality_is_missing() {
        let mut f = form();
        f.nationality = "   ".into();
        f.family_size = "2".into();

        let errors = validate_step(WizardStep::Household, &f, &[]);

        assert_eq!(errors.get("nationality"), Some(NATIONALITY_REQUIRED));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn family_size_must_be_whole() {
        assert!(is_valid_family_size("3"));
        assert!(!is_valid_family_size("2.5"));
        assert!(!is_valid_family_size("1,5"));
        assert!(!is_valid_family_size("abc"));
        assert!(!is_valid_family_size(""));
    }

    #[test]
    fn work_step_ignores_optional_fields() {
        let mut f = form();
        f.occupation = "Architect".into();
        f.work_city = "Abu Dhabi".into();
        f.work_location.latitude = "not a number".into();

        assert!(validate_step(WizardStep::Work, &f, &[]).is_empty());
    }

    #[test]
    fn budget_accepts_zero_and_inverted_range() {
        let mut f = form();
        f.budget_min = "9000".into();
        f.budget_max = "0".into();

        assert!(validate_step(WizardStep::Budget, &f, &[]).is_empty());
    }

    #[test]
    fn budget_rejects_missing_negative_and_garbage() {
        let mut f = form();
        f.budget_min = "-1".into();
        f.budget_max = "lots".into();

        let errors = validate_step(WizardStep::Budget, &f, &[]);

        assert_eq!(errors.get("budget_min"), Some(BUDGET_MIN_REQUIRED));
        assert_eq!(errors.get("budget_max"), Some(BUDGET_MAX_REQUIRED));
    }

    #[test]
    fn children_step_checks_each_child() {
        let children = vec![
            ChildEntry {
                full_name: "Noah".into(),
                age: "6".into(),
                ..Default::default()
            },
            ChildEntry {
                full_name: " ".into(),
                age: "0".into(),
                ..Default::default()
            },
            ChildEntry {
                full_name: "Mia".into(),
                age: "1,5".into(),
                ..Default::default()
            },
        ];

        let errors = validate_step(WizardStep::Children, &form(), &children);

        assert_eq!(
            errors.keys().collect::<Vec<_>>(),
            vec!["child_1_age", "child_1_full_name", "child_2_age"]
        );
    }

    #[test]
    fn children_step_without_children_is_valid() {
        assert!(validate_step(WizardStep::Children, &form(), &[]).is_empty());
    }
}
