//! Relocation questionnaire.
//!
//! A four-step form: household, work, budget, children. Each forward move
//! validates only the fields of the step being left, the children list is
//! capped by the household shape, and submission hands a snapshot to a
//! [`Navigator`].

mod engine;
mod form;
mod validation;

use thiserror::Error;

pub use engine::{Navigator, Wizard, WizardSnapshot, WizardStatus, WizardStep};
pub use form::{ChildEntry, ChildField, FormField, FormFlag, WizardForm, WorkLocation};
pub use validation::FieldErrors;

/// Why a child could not be added.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("Please enter a valid family size first.")]
    InvalidFamilySize,

    #[error("You can add a maximum of {max} children.")]
    LimitReached { max: usize },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("{step} has {} invalid field(s)", .errors.len())]
    Validation {
        step: WizardStep,
        errors: FieldErrors,
    },

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("child index {index} out of range (have {len})")]
    ChildIndexOutOfRange { index: usize, len: usize },

    #[error("cannot {action} from {step}")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },

    #[error("wizard session is closed")]
    Closed,
}
