use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Registration as stored by the upstream API, coerced once at the fetch boundary.
///
/// Every scalar is kept as the text the API returned (numbers are rendered, nulls become
/// empty strings) so display and export never have to re-check shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub apellido_paterno: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub apellido_materno: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub curp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telefono_casa: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telefono_celular: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub correo_personal: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub correo_institucional: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub institucion: String,
    /// School key sent by older form versions in place of `institucion`.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub clave_escuela: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub carrera: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub promedio: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub estado: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub estado_academico: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grupo: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub fulfilled: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pdf_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cloudinary_download_url: String,
}

impl CandidateRecord {
    /// Given name followed by both surnames, single-spaced.
    pub fn full_name(&self) -> String {
        [&self.nombre, &self.apellido_paterno, &self.apellido_materno]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Average as a number; `None` when the stored text is not numeric.
    pub fn average(&self) -> Option<f64> {
        self.promedio
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    /// `institucion`, falling back to the older `claveEscuela` key.
    pub fn institution(&self) -> &str {
        [&self.institucion, &self.clave_escuela]
            .into_iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    pub fn status_label(&self) -> String {
        AcademicStatus::label_for(&self.estado)
    }

    /// Stored CV location, preferring `pdfUrl` over the asset host's download URL.
    pub fn attachment_url(&self) -> Option<&str> {
        [&self.pdf_url, &self.cloudinary_download_url]
            .into_iter()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
    }

    pub fn group_title(&self) -> Option<&str> {
        Some(self.grupo.trim()).filter(|title| !title.is_empty())
    }
}

/// Academic status values produced by the registration form versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcademicStatus {
    Regular,
    Irregular,
    Estudiante,
    Egresado,
    Titulado,
    NoTitulado,
}

impl AcademicStatus {
    pub const ALL: [AcademicStatus; 6] = [
        AcademicStatus::Regular,
        AcademicStatus::Irregular,
        AcademicStatus::Estudiante,
        AcademicStatus::Egresado,
        AcademicStatus::Titulado,
        AcademicStatus::NoTitulado,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "regular" => Some(Self::Regular),
            "irregular" => Some(Self::Irregular),
            "estudiante" => Some(Self::Estudiante),
            "egresado" => Some(Self::Egresado),
            "titulado" => Some(Self::Titulado),
            "no-titulado" | "no titulado" => Some(Self::NoTitulado),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            AcademicStatus::Regular => "regular",
            AcademicStatus::Irregular => "irregular",
            AcademicStatus::Estudiante => "estudiante",
            AcademicStatus::Egresado => "egresado",
            AcademicStatus::Titulado => "titulado",
            AcademicStatus::NoTitulado => "no-titulado",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AcademicStatus::Regular => "Regular",
            AcademicStatus::Irregular => "Irregular",
            AcademicStatus::Estudiante => "Estudiante",
            AcademicStatus::Egresado => "Egresado",
            AcademicStatus::Titulado => "Titulado",
            AcademicStatus::NoTitulado => "No titulado",
        }
    }

    /// Human label for a stored status; unknown values are shown verbatim.
    pub fn label_for(raw: &str) -> String {
        match Self::parse(raw) {
            Some(status) => status.label().to_string(),
            None => raw.trim().to_string(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    })
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(coerce_string_list).unwrap_or_default())
}

/// Accepts an array of strings or a string holding a JSON-encoded array; anything else is empty.
pub(crate) fn coerce_string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) if !text.trim().is_empty() => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(inner @ Value::Array(_)) => coerce_string_list(inner),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
