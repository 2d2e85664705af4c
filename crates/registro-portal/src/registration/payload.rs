use serde::Serialize;

use crate::catalog::GroupRequirements;

use super::fields::FormField;
use super::flow::RegistrationDraft;

/// Text parts of the multipart registration, in submission order.
///
/// `grupo` carries the group title rather than the selector id, and a non-student standing
/// replaces the regular/irregular condition in `estado`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    parts: Vec<(String, String)>,
}

impl SubmissionPayload {
    pub(crate) fn build(draft: &RegistrationDraft, group: &GroupRequirements) -> Self {
        let mut parts = Vec::with_capacity(FormField::ALL.len());

        for field in FormField::ALL {
            let value = match field {
                FormField::AcademicStanding => continue,
                FormField::Condition if !draft.is_student() => {
                    draft.value(FormField::AcademicStanding).to_string()
                }
                FormField::Group => group.title.clone(),
                _ => draft.value(field).to_string(),
            };
            parts.push((field.wire_name().to_string(), value));
        }

        let fulfilled = serde_json::Value::from(draft.fulfilled().to_vec()).to_string();
        parts.push(("fulfilled".to_string(), fulfilled));

        Self { parts }
    }

    pub fn text_parts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.text_parts()
            .find(|(part, _)| *part == name)
            .map(|(_, value)| value)
    }

    pub fn curp(&self) -> &str {
        self.get(FormField::Curp.wire_name()).unwrap_or("")
    }
}
