//! Raw questionnaire data as typed by the user.
//!
//! Every text input is kept verbatim; numbers are only parsed when a step
//! transition validates them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WizardStep;

/// Text inputs of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Nationality,
    FamilySize,
    Occupation,
    WorkCity,
    Industry,
    Latitude,
    Longitude,
    BudgetMin,
    BudgetMax,
}

impl FormField {
    pub fn all() -> &'static [FormField] {
        &[
            FormField::Nationality,
            FormField::FamilySize,
            FormField::Occupation,
            FormField::WorkCity,
            FormField::Industry,
            FormField::Latitude,
            FormField::Longitude,
            FormField::BudgetMin,
            FormField::BudgetMax,
        ]
    }

    /// Key used in the field-error map.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Nationality => "nationality",
            Self::FamilySize => "family_size",
            Self::Occupation => "occupation",
            Self::WorkCity => "work_city",
            Self::Industry => "industry",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::BudgetMin => "budget_min",
            Self::BudgetMax => "budget_max",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.key() == s)
    }

    /// Step on which the field is shown.
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Nationality | Self::FamilySize => WizardStep::Household,
            Self::Occupation
            | Self::WorkCity
            | Self::Industry
            | Self::Latitude
            | Self::Longitude => WizardStep::Work,
            Self::BudgetMin | Self::BudgetMax => WizardStep::Budget,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Checkbox inputs of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormFlag {
    HasPartner,
    OwnsCar,
}

impl FormFlag {
    pub fn all() -> &'static [FormFlag] {
        &[FormFlag::HasPartner, FormFlag::OwnsCar]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::HasPartner => "has_partner",
            Self::OwnsCar => "owns_car",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.key() == s)
    }

    pub fn step(&self) -> WizardStep {
        match self {
            Self::HasPartner => WizardStep::Household,
            Self::OwnsCar => WizardStep::Budget,
        }
    }
}

/// Inputs of one child entry on the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildField {
    FullName,
    Age,
    CurrentGrade,
    EducationStage,
    PreferredCurriculum,
}

impl ChildField {
    pub fn all() -> &'static [ChildField] {
        &[
            ChildField::FullName,
            ChildField::Age,
            ChildField::CurrentGrade,
            ChildField::EducationStage,
            ChildField::PreferredCurriculum,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Age => "age",
            Self::CurrentGrade => "current_grade",
            Self::EducationStage => "education_stage",
            Self::PreferredCurriculum => "preferred_curriculum",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.key() == s)
    }

    /// Error key for this field of the child at `index` (`child_0_age`).
    pub fn error_key(
        &self,
        index: usize,
    ) -> String {
        format!("child_{index}_{}", self.key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLocation {
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardForm {
    // Step 1
    pub nationality: String,
    pub family_size: String,
    pub has_partner: bool,

    // Step 2
    pub occupation: String,
    pub work_city: String,
    pub industry: String,
    pub work_location: WorkLocation,

    // Step 3
    pub budget_min: String,
    pub budget_max: String,
    pub owns_car: bool,
}

impl WizardForm {
    pub fn text(
        &self,
        field: FormField,
    ) -> &str {
        match field {
            FormField::Nationality => &self.nationality,
            FormField::FamilySize => &self.family_size,
            FormField::Occupation => &self.occupation,
            FormField::WorkCity => &self.work_city,
            FormField::Industry => &self.industry,
            FormField::Latitude => &self.work_location.latitude,
            FormField::Longitude => &self.work_location.longitude,
            FormField::BudgetMin => &self.budget_min,
            FormField::BudgetMax => &self.budget_max,
        }
    }

    pub(crate) fn set_text(
        &mut self,
        field: FormField,
        value: String,
    ) {
        let slot = match field {
            FormField::Nationality => &mut self.nationality,
            FormField::FamilySize => &mut self.family_size,
            FormField::Occupation => &mut self.occupation,
            FormField::WorkCity => &mut self.work_city,
            FormField::Industry => &mut self.industry,
            FormField::Latitude => &mut self.work_location.latitude,
            FormField::Longitude => &mut self.work_location.longitude,
            FormField::BudgetMin => &mut self.budget_min,
            FormField::BudgetMax => &mut self.budget_max,
        };
        *slot = value;
    }

    pub fn flag(
        &self,
        flag: FormFlag,
    ) -> bool {
        match flag {
            FormFlag::HasPartner => self.has_partner,
            FormFlag::OwnsCar => self.owns_car,
        }
    }

    pub(crate) fn set_flag(
        &mut self,
        flag: FormFlag,
        value: bool,
    ) {
        match flag {
            FormFlag::HasPartner => self.has_partner = value,
            FormFlag::OwnsCar => self.owns_car = value,
        }
    }
}

/// One child as entered on the last step. Fields start empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub full_name: String,
    pub age: String,
    pub current_grade: String,
    pub education_stage: String,
    pub preferred_curriculum: String,
}

impl ChildEntry {
    pub fn text(
        &self,
        field: ChildField,
    ) -> &str {
        match field {
            ChildField::FullName => &self.full_name,
            ChildField::Age => &self.age,
            ChildField::CurrentGrade => &self.current_grade,
            ChildField::EducationStage => &self.education_stage,
            ChildField::PreferredCurriculum => &self.preferred_curriculum,
        }
    }

    pub(crate) fn set_text(
        &mut self,
        field: ChildField,
        value: String,
    ) {
        let slot = match field {
            ChildField::FullName => &mut self.full_name,
            ChildField::Age => &mut self.age,
            ChildField::CurrentGrade => &mut self.current_grade,
            ChildField::EducationStage => &mut self.education_stage,
            ChildField::PreferredCurriculum => &mut self.preferred_curriculum,
        };
        *slot = value;
    }
}
