use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::catalog::RequirementsCatalog;
use crate::records::domain::coerce_string_list;
use crate::records::AcademicStatus;

use super::fields::{FormField, FormStep, ValidationError};
use super::payload::SubmissionPayload;

const FULFILLED_KEY: &str = "fulfilled";

/// Sanitized form values plus the checklist items the candidate ticked.
///
/// Edits never mutate in place; each one yields a new draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    values: BTreeMap<FormField, String>,
    fulfilled: Vec<String>,
}

impl RegistrationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a draft from a JSON object keyed by wire names, e.g. a saved form.
    ///
    /// Every value goes through the field's sanitizer. Unknown keys are ignored.
    pub fn from_json(value: &Value) -> Self {
        let mut draft = Self::new();
        let Some(object) = value.as_object() else {
            return draft;
        };

        for (key, raw) in object {
            if key == FULFILLED_KEY {
                draft.fulfilled = coerce_string_list(raw.clone());
                continue;
            }
            let Some(field) = FormField::from_wire_name(key) else {
                debug!(key = %key, "ignoring unknown form key");
                continue;
            };
            let text = match raw {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            draft = draft.with_value(field, &text);
        }
        draft
    }

    pub fn value(&self, field: FormField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn fulfilled(&self) -> &[String] {
        &self.fulfilled
    }

    pub fn is_student(&self) -> bool {
        AcademicStatus::parse(self.value(FormField::AcademicStanding))
            == Some(AcademicStatus::Estudiante)
    }

    /// Returns a copy with `raw` sanitized into `field`.
    ///
    /// Moving the standing away from `estudiante` clears the regular/irregular condition.
    pub fn with_value(&self, field: FormField, raw: &str) -> Self {
        let mut next = self.clone();
        let sanitized = field.rule().sanitizer.apply(raw);
        next.values.insert(field, sanitized);

        if field == FormField::AcademicStanding && !next.is_student() {
            next.values.remove(&FormField::Condition);
        }
        next
    }

    /// Returns a copy with `item` added to, or removed from, the fulfilled checklist.
    pub fn with_requirement_toggled(&self, item: &str) -> Self {
        let mut next = self.clone();
        match next.fulfilled.iter().position(|existing| existing == item) {
            Some(index) => {
                next.fulfilled.remove(index);
            }
            None => next.fulfilled.push(item.to_string()),
        }
        next
    }

    /// Runs every field rule of `step`, stopping at the first problem.
    pub fn validate_step(
        &self,
        step: FormStep,
        catalog: &RequirementsCatalog,
    ) -> Result<(), ValidationError> {
        step.fields()
            .try_for_each(|field| field.rule().validate(self, catalog))
    }

    /// All problems across the whole form, in field order.
    pub fn problems(&self, catalog: &RequirementsCatalog) -> Vec<ValidationError> {
        FormField::ALL
            .into_iter()
            .filter_map(|field| field.rule().validate(self, catalog).err())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("cannot submit from the {0} step; review the answers first")]
    NotConfirmed(&'static str),
}

/// One recorded transition of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSnapshot {
    pub step: FormStep,
    pub draft: RegistrationDraft,
}

/// Three-step registration wizard.
///
/// Advancing validates the fields of the current step. Every successful transition is kept
/// as a snapshot so earlier answers can be inspected after going back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFlow {
    step: FormStep,
    draft: RegistrationDraft,
    history: Vec<StepSnapshot>,
}

impl Default for RegistrationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationFlow {
    pub fn new() -> Self {
        Self::with_draft(RegistrationDraft::new())
    }

    pub fn with_draft(draft: RegistrationDraft) -> Self {
        Self {
            step: FormStep::PersonalInfo,
            draft,
            history: Vec::new(),
        }
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn history(&self) -> &[StepSnapshot] {
        &self.history
    }

    pub fn edit(&self, field: FormField, raw: &str) -> Self {
        Self {
            draft: self.draft.with_value(field, raw),
            ..self.clone()
        }
    }

    pub fn toggle_requirement(&self, item: &str) -> Self {
        Self {
            draft: self.draft.with_requirement_toggled(item),
            ..self.clone()
        }
    }

    /// Validates the current step and moves forward. At `Confirmation` this is a no-op.
    pub fn advance(&self, catalog: &RequirementsCatalog) -> Result<Self, ValidationError> {
        let Some(next) = self.step.next() else {
            return Ok(self.clone());
        };
        self.draft.validate_step(self.step, catalog)?;

        let mut history = self.history.clone();
        history.push(StepSnapshot {
            step: self.step,
            draft: self.draft.clone(),
        });
        Ok(Self {
            step: next,
            draft: self.draft.clone(),
            history,
        })
    }

    pub fn back(&self) -> Self {
        match self.step.previous() {
            Some(previous) => Self {
                step: previous,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Re-validates the whole form and builds the multipart payload.
    pub fn confirm(&self, catalog: &RequirementsCatalog) -> Result<SubmissionPayload, FlowError> {
        if self.step != FormStep::Confirmation {
            return Err(FlowError::NotConfirmed(self.step.label()));
        }
        if let Some(problem) = self.draft.problems(catalog).into_iter().next() {
            return Err(problem.into());
        }
        let group_id = self.draft.value(FormField::Group);
        let group = catalog.by_id(group_id).ok_or_else(|| ValidationError {
            field: FormField::Group,
            message: "the selected group is not part of the requirements catalog".to_string(),
        })?;
        Ok(SubmissionPayload::build(&self.draft, group))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn catalog() -> RequirementsCatalog {
        RequirementsCatalog::embedded().expect("embedded catalog")
    }

    fn personal(flow: RegistrationFlow) -> RegistrationFlow {
        flow.edit(FormField::GivenName, "María")
            .edit(FormField::PaternalSurname, "Pérez")
            .edit(FormField::MaternalSurname, "López")
            .edit(FormField::Curp, "PELM000101MDFRPRA1")
            .edit(FormField::HomePhone, "7221234567")
            .edit(FormField::MobilePhone, "7229876543")
            .edit(FormField::PersonalEmail, "maria@example.com")
    }

    fn academic(flow: RegistrationFlow) -> RegistrationFlow {
        flow.edit(FormField::Institution, "uaem")
            .edit(FormField::Program, "sistemas")
            .edit(FormField::Average, "9.1")
            .edit(FormField::AcademicStanding, "estudiante")
            .edit(FormField::Condition, "regular")
            .edit(FormField::Group, "g1")
    }

    #[test]
    fn changing_standing_clears_condition() {
        let draft = RegistrationDraft::new()
            .with_value(FormField::AcademicStanding, "estudiante")
            .with_value(FormField::Condition, "irregular");
        assert_eq!(draft.value(FormField::Condition), "irregular");

        let draft = draft.with_value(FormField::AcademicStanding, "egresado");
        assert_eq!(draft.value(FormField::Condition), "");
    }

    #[test]
    fn edits_leave_previous_draft_untouched() {
        let before = RegistrationDraft::new().with_value(FormField::GivenName, "Ana");
        let after = before.with_value(FormField::GivenName, "Luisa");
        assert_eq!(before.value(FormField::GivenName), "Ana");
        assert_eq!(after.value(FormField::GivenName), "Luisa");
    }

    #[test]
    fn toggling_twice_removes_item() {
        let draft = RegistrationDraft::new()
            .with_requirement_toggled("Git")
            .with_requirement_toggled("Docker")
            .with_requirement_toggled("Git");
        assert_eq!(draft.fulfilled(), ["Docker".to_string()]);
    }

    #[test]
    fn advance_blocks_on_first_invalid_field() {
        let catalog = catalog();
        let flow = personal(RegistrationFlow::new()).edit(FormField::Curp, "PELM0001");

        let err = flow.advance(&catalog).expect_err("short CURP");
        assert_eq!(err.field, FormField::Curp);
        assert_eq!(err.message, "CURP must be exactly 18 characters");
        assert_eq!(flow.step(), FormStep::PersonalInfo);
    }

    #[test]
    fn student_without_condition_is_rejected() {
        let catalog = catalog();
        let flow = academic(personal(RegistrationFlow::new()).advance(&catalog).expect("step 1"))
            .edit(FormField::Condition, "");

        let err = flow.advance(&catalog).expect_err("missing condition");
        assert_eq!(err.field, FormField::Condition);
    }

    #[test]
    fn average_above_ten_is_rejected() {
        let catalog = catalog();
        let flow = academic(personal(RegistrationFlow::new()).advance(&catalog).expect("step 1"))
            .edit(FormField::Average, "10.5");

        let err = flow.advance(&catalog).expect_err("out of range");
        assert_eq!(err.message, "average must be between 0 and 10");
    }

    #[test]
    fn full_walk_records_history_and_builds_payload() {
        let catalog = catalog();
        let flow = personal(RegistrationFlow::new())
            .advance(&catalog)
            .expect("step 1");
        let flow = academic(flow).toggle_requirement("Git");
        let flow = flow.advance(&catalog).expect("step 2");

        assert_eq!(flow.step(), FormStep::Confirmation);
        assert_eq!(flow.history().len(), 2);
        assert_eq!(flow.history()[0].step, FormStep::PersonalInfo);

        let payload = flow.confirm(&catalog).expect("payload");
        assert_eq!(payload.curp(), "PELM000101MDFRPRA1");
        assert_eq!(payload.get("institucion"), Some("UAEM"));
    }

    #[test]
    fn confirm_requires_confirmation_step() {
        let catalog = catalog();
        let flow = personal(RegistrationFlow::new());
        assert_eq!(
            flow.confirm(&catalog),
            Err(FlowError::NotConfirmed("personal information"))
        );
    }

    #[test]
    fn back_keeps_answers() {
        let catalog = catalog();
        let flow = personal(RegistrationFlow::new())
            .advance(&catalog)
            .expect("step 1")
            .back();
        assert_eq!(flow.step(), FormStep::PersonalInfo);
        assert_eq!(flow.draft().value(FormField::GivenName), "María");
        assert_eq!(flow.back().step(), FormStep::PersonalInfo);
    }

    #[test]
    fn draft_from_json_sanitizes_values() {
        let draft = RegistrationDraft::from_json(&json!({
            "nombre": "Ana 2",
            "curp": "abcd-123",
            "promedio": 9.25,
            "fulfilled": "[\"Git\",\"SQL\"]",
            "desconocido": "x"
        }));
        assert_eq!(draft.value(FormField::GivenName), "Ana ");
        assert_eq!(draft.value(FormField::Curp), "ABCD123");
        assert_eq!(draft.value(FormField::Average), "9.2");
        assert_eq!(draft.fulfilled(), ["Git".to_string(), "SQL".to_string()]);
    }
}
