use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::RequirementsCatalog;
use crate::records::AcademicStatus;

use super::flow::RegistrationDraft;

/// Every input of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormField {
    GivenName,
    PaternalSurname,
    MaternalSurname,
    Curp,
    HomePhone,
    MobilePhone,
    PersonalEmail,
    InstitutionalEmail,
    Institution,
    Program,
    Average,
    AcademicStanding,
    Condition,
    Group,
}

impl FormField {
    pub const ALL: [FormField; 14] = [
        FormField::GivenName,
        FormField::PaternalSurname,
        FormField::MaternalSurname,
        FormField::Curp,
        FormField::HomePhone,
        FormField::MobilePhone,
        FormField::PersonalEmail,
        FormField::InstitutionalEmail,
        FormField::Institution,
        FormField::Program,
        FormField::Average,
        FormField::AcademicStanding,
        FormField::Condition,
        FormField::Group,
    ];

    /// Name used by the upstream API for this field.
    pub const fn wire_name(self) -> &'static str {
        match self {
            FormField::GivenName => "nombre",
            FormField::PaternalSurname => "apellidoPaterno",
            FormField::MaternalSurname => "apellidoMaterno",
            FormField::Curp => "curp",
            FormField::HomePhone => "telefonoCasa",
            FormField::MobilePhone => "telefonoCelular",
            FormField::PersonalEmail => "correoPersonal",
            FormField::InstitutionalEmail => "correoInstitucional",
            FormField::Institution => "institucion",
            FormField::Program => "carrera",
            FormField::Average => "promedio",
            FormField::AcademicStanding => "estadoAcademico",
            FormField::Condition => "estado",
            FormField::Group => "grupo",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == name.trim())
    }

    pub const fn label(self) -> &'static str {
        match self {
            FormField::GivenName => "given name",
            FormField::PaternalSurname => "paternal surname",
            FormField::MaternalSurname => "maternal surname",
            FormField::Curp => "CURP",
            FormField::HomePhone => "home phone",
            FormField::MobilePhone => "mobile phone",
            FormField::PersonalEmail => "personal email",
            FormField::InstitutionalEmail => "institutional email",
            FormField::Institution => "institution",
            FormField::Program => "program",
            FormField::Average => "average",
            FormField::AcademicStanding => "academic standing",
            FormField::Condition => "academic condition",
            FormField::Group => "group",
        }
    }

    pub fn rule(self) -> &'static FieldRule {
        &FIELD_RULES[self as usize]
    }

    pub fn step(self) -> FormStep {
        match self {
            FormField::GivenName
            | FormField::PaternalSurname
            | FormField::MaternalSurname
            | FormField::Curp
            | FormField::HomePhone
            | FormField::MobilePhone
            | FormField::PersonalEmail
            | FormField::InstitutionalEmail => FormStep::PersonalInfo,
            FormField::Institution
            | FormField::Program
            | FormField::Average
            | FormField::AcademicStanding
            | FormField::Condition
            | FormField::Group => FormStep::AcademicInfo,
        }
    }
}

/// Screens of the registration flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormStep {
    PersonalInfo,
    AcademicInfo,
    Confirmation,
}

impl FormStep {
    pub const fn label(self) -> &'static str {
        match self {
            FormStep::PersonalInfo => "personal information",
            FormStep::AcademicInfo => "academic information",
            FormStep::Confirmation => "confirmation",
        }
    }

    pub const fn next(self) -> Option<FormStep> {
        match self {
            FormStep::PersonalInfo => Some(FormStep::AcademicInfo),
            FormStep::AcademicInfo => Some(FormStep::Confirmation),
            FormStep::Confirmation => None,
        }
    }

    pub const fn previous(self) -> Option<FormStep> {
        match self {
            FormStep::PersonalInfo => None,
            FormStep::AcademicInfo => Some(FormStep::PersonalInfo),
            FormStep::Confirmation => Some(FormStep::AcademicInfo),
        }
    }

    pub fn fields(self) -> impl Iterator<Item = FormField> {
        FormField::ALL
            .into_iter()
            .filter(move |field| field.step() == self)
    }
}

/// Input clean-up applied on every keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanitizer {
    /// Letters (including Latin-1 accented), whitespace, apostrophes and hyphens.
    Letters { uppercase: bool },
    Digits { max_len: usize },
    /// ASCII alphanumerics, upper-cased, at most 18 characters.
    Curp,
    /// Digits and a dot, keeping at most one decimal digit.
    Average,
    /// Lower-cased selector value.
    Choice,
    Trimmed,
}

impl Sanitizer {
    pub fn apply(self, raw: &str) -> String {
        match self {
            Sanitizer::Letters { uppercase } => {
                let kept: String = raw.chars().filter(|ch| is_name_char(*ch)).collect();
                if uppercase {
                    kept.to_uppercase()
                } else {
                    kept
                }
            }
            Sanitizer::Digits { max_len } => raw
                .chars()
                .filter(char::is_ascii_digit)
                .take(max_len)
                .collect(),
            Sanitizer::Curp => raw
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|ch| ch.to_ascii_uppercase())
                .take(CURP_LEN)
                .collect(),
            Sanitizer::Average => {
                let cleaned: String = raw
                    .chars()
                    .filter(|ch| ch.is_ascii_digit() || *ch == '.')
                    .collect();
                let mut parts = cleaned.split('.');
                let whole = parts.next().unwrap_or_default();
                match parts.next() {
                    Some(decimals) => {
                        format!("{whole}.{}", decimals.chars().take(1).collect::<String>())
                    }
                    None => whole.to_string(),
                }
            }
            Sanitizer::Choice => raw.trim().to_lowercase(),
            Sanitizer::Trimmed => raw.trim().to_string(),
        }
    }
}

/// Submission-time check for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    Name,
    Curp,
    Phone,
    Email { required: bool },
    Average,
    Standing,
    /// Only required when the standing is `estudiante`.
    Condition,
    Group,
}

/// Sanitizer and validator pair for a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: FormField,
    pub sanitizer: Sanitizer,
    pub validator: Validator,
}

/// Indexed by `FormField as usize`.
pub static FIELD_RULES: [FieldRule; 14] = [
    FieldRule {
        field: FormField::GivenName,
        sanitizer: Sanitizer::Letters { uppercase: false },
        validator: Validator::Name,
    },
    FieldRule {
        field: FormField::PaternalSurname,
        sanitizer: Sanitizer::Letters { uppercase: false },
        validator: Validator::Name,
    },
    FieldRule {
        field: FormField::MaternalSurname,
        sanitizer: Sanitizer::Letters { uppercase: false },
        validator: Validator::Name,
    },
    FieldRule {
        field: FormField::Curp,
        sanitizer: Sanitizer::Curp,
        validator: Validator::Curp,
    },
    FieldRule {
        field: FormField::HomePhone,
        sanitizer: Sanitizer::Digits { max_len: PHONE_LEN },
        validator: Validator::Phone,
    },
    FieldRule {
        field: FormField::MobilePhone,
        sanitizer: Sanitizer::Digits { max_len: PHONE_LEN },
        validator: Validator::Phone,
    },
    FieldRule {
        field: FormField::PersonalEmail,
        sanitizer: Sanitizer::Trimmed,
        validator: Validator::Email { required: true },
    },
    FieldRule {
        field: FormField::InstitutionalEmail,
        sanitizer: Sanitizer::Trimmed,
        validator: Validator::Email { required: false },
    },
    FieldRule {
        field: FormField::Institution,
        sanitizer: Sanitizer::Letters { uppercase: true },
        validator: Validator::Name,
    },
    FieldRule {
        field: FormField::Program,
        sanitizer: Sanitizer::Letters { uppercase: true },
        validator: Validator::Name,
    },
    FieldRule {
        field: FormField::Average,
        sanitizer: Sanitizer::Average,
        validator: Validator::Average,
    },
    FieldRule {
        field: FormField::AcademicStanding,
        sanitizer: Sanitizer::Choice,
        validator: Validator::Standing,
    },
    FieldRule {
        field: FormField::Condition,
        sanitizer: Sanitizer::Choice,
        validator: Validator::Condition,
    },
    FieldRule {
        field: FormField::Group,
        sanitizer: Sanitizer::Choice,
        validator: Validator::Group,
    },
];

const CURP_LEN: usize = 18;
const PHONE_LEN: usize = 10;
const MAX_AVERAGE: f64 = 10.0;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const AVERAGE_PATTERN: &str = r"^[0-9]+(?:\.[0-9])?$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static AVERAGE_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex pattern"))
}

fn average_regex() -> &'static Regex {
    AVERAGE_REGEX.get_or_init(|| {
        Regex::new(AVERAGE_PATTERN).expect("AVERAGE_PATTERN is a valid regex pattern")
    })
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || ('\u{C0}'..='\u{FF}').contains(&ch)
        || ch.is_whitespace()
        || ch == '\''
        || ch == '-'
}

/// Field-specific problem that blocks a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: FormField,
    pub message: String,
}

impl ValidationError {
    fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl FieldRule {
    pub fn validate(
        &self,
        draft: &RegistrationDraft,
        catalog: &RequirementsCatalog,
    ) -> Result<(), ValidationError> {
        let field = self.field;
        let value = draft.value(field);

        match self.validator {
            Validator::Name => {
                if value.trim().is_empty() || !value.chars().all(is_name_char) {
                    return Err(ValidationError::new(
                        field,
                        format!("{} must contain only letters and spaces", field.label()),
                    ));
                }
            }
            Validator::Curp => {
                if value.chars().count() != CURP_LEN {
                    return Err(ValidationError::new(
                        field,
                        "CURP must be exactly 18 characters",
                    ));
                }
                if !value
                    .chars()
                    .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
                {
                    return Err(ValidationError::new(
                        field,
                        "CURP must contain only uppercase letters and digits",
                    ));
                }
            }
            Validator::Phone => {
                if value.len() != PHONE_LEN || !value.chars().all(|ch| ch.is_ascii_digit()) {
                    return Err(ValidationError::new(
                        field,
                        format!("{} must contain exactly 10 digits", field.label()),
                    ));
                }
            }
            Validator::Email { required } => {
                if value.is_empty() && !required {
                    return Ok(());
                }
                if !email_regex().is_match(value) {
                    return Err(ValidationError::new(
                        field,
                        format!("enter a valid {}", field.label()),
                    ));
                }
            }
            Validator::Average => {
                if value.is_empty() {
                    return Err(ValidationError::new(field, "enter your average"));
                }
                if !average_regex().is_match(value) {
                    return Err(ValidationError::new(
                        field,
                        "average must be a whole number or have a single decimal digit (e.g. 9, 9.0, 8.9)",
                    ));
                }
                let within_scale = value
                    .parse::<f64>()
                    .map(|average| (0.0..=MAX_AVERAGE).contains(&average))
                    .unwrap_or(false);
                if !within_scale {
                    return Err(ValidationError::new(
                        field,
                        "average must be between 0 and 10",
                    ));
                }
            }
            Validator::Standing => {
                let known = matches!(
                    AcademicStatus::parse(value),
                    Some(
                        AcademicStatus::Estudiante
                            | AcademicStatus::Egresado
                            | AcademicStatus::Titulado
                            | AcademicStatus::NoTitulado
                    )
                );
                if !known {
                    return Err(ValidationError::new(field, "select an academic standing"));
                }
            }
            Validator::Condition => {
                if draft.is_student()
                    && !matches!(
                        AcademicStatus::parse(value),
                        Some(AcademicStatus::Regular | AcademicStatus::Irregular)
                    )
                {
                    return Err(ValidationError::new(
                        field,
                        "select whether you are a regular or irregular student",
                    ));
                }
            }
            Validator::Group => {
                if value.is_empty() {
                    return Err(ValidationError::new(
                        field,
                        "select a group before continuing",
                    ));
                }
                if catalog.by_id(value).is_none() {
                    return Err(ValidationError::new(
                        field,
                        "the selected group is not part of the requirements catalog",
                    ));
                }
            }
        }

        Ok(())
    }
}
