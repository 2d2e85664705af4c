use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::records::CandidateRecord;

/// Dashboard filter state. Empty/`None` fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub min_average: Option<f64>,
    #[serde(default)]
    pub max_average: Option<f64>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && selected(&self.program).is_none()
            && selected(&self.status).is_none()
            && self.min_average.is_none()
            && self.max_average.is_none()
    }

    pub fn matches(&self, record: &CandidateRecord) -> bool {
        self.matches_search(record)
            && self.matches_program(record)
            && self.matches_status(record)
            && self.matches_average(record)
    }

    fn matches_search(&self, record: &CandidateRecord) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        let full_name = format!(
            "{} {} {}",
            record.nombre, record.apellido_paterno, record.apellido_materno
        )
        .to_lowercase();

        full_name.contains(&needle)
            || record.curp.to_lowercase().contains(&needle)
            || record.correo_personal.to_lowercase().contains(&needle)
    }

    fn matches_program(&self, record: &CandidateRecord) -> bool {
        selected(&self.program).map_or(true, |program| record.carrera == program)
    }

    fn matches_status(&self, record: &CandidateRecord) -> bool {
        selected(&self.status).map_or(true, |status| record.estado == status)
    }

    fn matches_average(&self, record: &CandidateRecord) -> bool {
        if self.min_average.is_none() && self.max_average.is_none() {
            return true;
        }
        let Some(average) = record.average() else {
            return false;
        };
        self.min_average.map_or(true, |min| average >= min)
            && self.max_average.map_or(true, |max| average <= max)
    }
}

fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Records satisfying every set criterion, in fetch order.
pub fn filter_records<'a>(
    records: &'a [CandidateRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a CandidateRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

/// Distinct non-empty programs for the program selector.
pub fn distinct_programs(records: &[CandidateRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.carrera.as_str())
        .filter(|program| !program.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
