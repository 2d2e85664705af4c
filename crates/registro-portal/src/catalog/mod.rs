//! Requirements catalog shared by the registration form and the dashboard matcher.
//!
//! The catalog is a single versioned JSON resource. The embedded copy is used unless an
//! override file is configured, and every load is validated so that group ids, group titles
//! and per-group items stay unambiguous for both consumers.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::matching::normalize_requirement;

const EMBEDDED_CATALOG: &str = include_str!("requirements.json");

/// Experience tiers offered when a group does not configure its own levels.
pub const DEFAULT_LEVELS: [&str; 5] = ["Nuevo ingreso", "Junior", "Intermedio", "Experto", "Líder"];

/// Mandatory, desirable and level checklists for one recruiting group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRequirements {
    /// Short key submitted by the form's group selector (`g1`, `g2`, ...).
    pub id: String,
    /// Human-readable title; this is what records store in `grupo`.
    pub title: String,
    #[serde(default)]
    pub obligatorio: Vec<String>,
    #[serde(default)]
    pub deseable: Vec<String>,
    #[serde(default)]
    pub niveles: Vec<String>,
}

impl GroupRequirements {
    /// Levels offered to candidates, falling back to [`DEFAULT_LEVELS`].
    pub fn levels(&self) -> Vec<&str> {
        if self.niveles.is_empty() {
            DEFAULT_LEVELS.to_vec()
        } else {
            self.niveles.iter().map(String::as_str).collect()
        }
    }

    pub fn has_custom_levels(&self) -> bool {
        !self.niveles.is_empty()
    }

    /// Every item a candidate can tick for this group, in display order.
    pub fn checklist(&self) -> impl Iterator<Item = &str> {
        self.obligatorio
            .iter()
            .chain(self.deseable.iter())
            .map(String::as_str)
            .chain(self.levels())
    }
}

/// Versioned collection of recruiting groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsCatalog {
    pub version: String,
    pub groups: Vec<GroupRequirements>,
}

impl RequirementsCatalog {
    /// Catalog compiled into the crate.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Reads and validates an override file, or falls back to the embedded catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json(&raw)
            }
            None => Self::embedded(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut ids = HashSet::new();
        let mut titles = HashSet::new();

        for group in &self.groups {
            if group.id.trim().is_empty() || group.title.trim().is_empty() {
                return Err(CatalogError::UnnamedGroup);
            }
            if !ids.insert(group.id.as_str()) {
                return Err(CatalogError::DuplicateId(group.id.clone()));
            }
            if !titles.insert(group.title.as_str()) {
                return Err(CatalogError::DuplicateTitle(group.title.clone()));
            }

            let mut seen = HashSet::new();
            for item in group.checklist() {
                let key = normalize_requirement(item);
                if key.is_empty() || !seen.insert(key) {
                    return Err(CatalogError::AmbiguousItem {
                        group: group.title.clone(),
                        item: item.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Looks a group up by the title stored on records.
    pub fn by_title(&self, title: &str) -> Option<&GroupRequirements> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        self.groups.iter().find(|group| group.title == title)
    }

    /// Looks a group up by the form selector key.
    pub fn by_id(&self, id: &str) -> Option<&GroupRequirements> {
        self.groups.iter().find(|group| group.id == id.trim())
    }

    /// Group titles that are set on records but unknown to this catalog.
    pub fn unknown_titles<'a, I>(&self, titles: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        titles
            .into_iter()
            .map(str::trim)
            .filter(|title| !title.is_empty() && self.by_title(title).is_none())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read requirements catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("requirements catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("every catalog group needs a non-empty id and title")]
    UnnamedGroup,
    #[error("duplicate catalog group id '{0}'")]
    DuplicateId(String),
    #[error("duplicate catalog group title '{0}'")]
    DuplicateTitle(String),
    #[error("group '{group}' lists '{item}' more than once or with no comparable text")]
    AmbiguousItem { group: String, item: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = RequirementsCatalog::embedded().expect("embedded catalog loads");
        assert_eq!(catalog.groups.len(), 6);
        let python = catalog
            .by_title("Grupo 6: Ingeniero de Software Python")
            .expect("group 6 present");
        assert_eq!(python.id, "g6");
        assert_eq!(python.obligatorio.len(), 3);
        assert_eq!(python.deseable.len(), 3);
        assert_eq!(python.levels(), DEFAULT_LEVELS.to_vec());
        assert!(!python.has_custom_levels());
    }

    #[test]
    fn lookups_by_id_and_title_agree() {
        let catalog = RequirementsCatalog::embedded().expect("catalog");
        for group in &catalog.groups {
            assert_eq!(catalog.by_id(&group.id), catalog.by_title(&group.title));
        }
        assert!(catalog.by_title("").is_none());
        assert!(catalog.by_id("g99").is_none());
    }

    #[test]
    fn rejects_duplicate_titles() {
        let raw = r#"{"version":"t","groups":[
            {"id":"a","title":"Same","obligatorio":["Rust"]},
            {"id":"b","title":"Same","obligatorio":["Go"]}
        ]}"#;
        let err = RequirementsCatalog::from_json(raw).expect_err("duplicate title");
        assert!(matches!(err, CatalogError::DuplicateTitle(title) if title == "Same"));
    }

    #[test]
    fn rejects_items_that_collide_after_normalization() {
        let raw = r#"{"version":"t","groups":[
            {"id":"a","title":"A","obligatorio":["C++"],"deseable":["c"]}
        ]}"#;
        let err = RequirementsCatalog::from_json(raw).expect_err("ambiguous item");
        assert!(matches!(err, CatalogError::AmbiguousItem { .. }));
    }

    #[test]
    fn custom_levels_replace_defaults() {
        let raw = r#"{"version":"t","groups":[
            {"id":"a","title":"A","obligatorio":["Rust"],"niveles":["Trainee","Staff"]}
        ]}"#;
        let catalog = RequirementsCatalog::from_json(raw).expect("valid");
        let group = catalog.by_id("a").expect("group");
        assert_eq!(group.levels(), vec!["Trainee", "Staff"]);
        assert_eq!(group.checklist().count(), 3);
    }

    #[test]
    fn loads_override_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"version":"override","groups":[{{"id":"x","title":"X","obligatorio":["Rust"]}}]}}"#
        )
        .expect("write catalog");

        let catalog = RequirementsCatalog::load(Some(file.path())).expect("override loads");
        assert_eq!(catalog.version, "override");
        assert!(catalog.by_title("X").is_some());
    }

    #[test]
    fn reports_unknown_titles() {
        let catalog = RequirementsCatalog::embedded().expect("catalog");
        let unknown = catalog.unknown_titles([
            "Grupo 5: Ingeniero de Nube Azure",
            "",
            "Grupo 9: Inexistente",
        ]);
        assert_eq!(
            unknown.into_iter().collect::<Vec<_>>(),
            vec!["Grupo 9: Inexistente".to_string()]
        );
    }
}
