//! Candidate registration form: field rules, the three-step flow and the submission payload.

mod fields;
mod flow;
mod payload;

pub use fields::{
    FieldRule, FormField, FormStep, Sanitizer, ValidationError, Validator, FIELD_RULES,
};
pub use flow::{FlowError, RegistrationDraft, RegistrationFlow, StepSnapshot};
pub use payload::SubmissionPayload;
