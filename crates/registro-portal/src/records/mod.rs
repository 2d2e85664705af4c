//! Candidate records returned by the registration API.

pub mod domain;

pub use domain::{AcademicStatus, CandidateRecord};

use serde_json::Value;
use tracing::warn;

/// Decodes the `GET` payload. The body must be a JSON array; individual entries that are not
/// objects are skipped so one bad record cannot blank the whole list.
pub fn decode_records(body: &[u8]) -> Result<Vec<CandidateRecord>, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_slice(body)?;
    let mut records = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<CandidateRecord>(entry) {
            Ok(record) => records.push(record),
            Err(err) => warn!(index, error = %err, "skipping malformed candidate record"),
        }
    }

    Ok(records)
}

/// First record whose CURP equals `curp`, ignoring case and surrounding whitespace.
pub fn find_by_curp<'a>(records: &'a [CandidateRecord], curp: &str) -> Option<&'a CandidateRecord> {
    let curp = curp.trim();
    records
        .iter()
        .find(|record| record.curp.eq_ignore_ascii_case(curp))
}
