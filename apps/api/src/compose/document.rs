use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::models::cv::{Cv, Education, Experience, Reference};
use crate::selection::{EntryKind, SelectionSet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("CV has no personal information")]
    MissingPersonalInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Section {
    Skills { items: Vec<String> },
    Education { entries: Vec<Education> },
    Experience { entries: Vec<Experience> },
    References { entries: Vec<Reference> },
}

impl Section {
    pub fn kind(&self) -> EntryKind {
        match self {
            Section::Skills { .. } => EntryKind::Skills,
            Section::Education { .. } => EntryKind::Education,
            Section::Experience { .. } => EntryKind::Experience,
            Section::References { .. } => EntryKind::References,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Skills { .. } => "Skills",
            Section::Education { .. } => "Education",
            Section::Experience { .. } => "Experience",
            Section::References { .. } => "References",
        }
    }
}

/// The document to render: a header followed by the non-empty sections in
/// the order Skills, Education, Experience, References.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentModel {
    pub header: Header,
    pub sections: Vec<Section>,
}

impl DocumentModel {
    pub fn section(&self, kind: EntryKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind() == kind)
    }
}

/// Entries in stored order whose index is selected.
fn pick<T: Clone>(items: &[T], selected: &BTreeSet<usize>) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter(|(index, _)| selected.contains(index))
        .map(|(_, item)| item.clone())
        .collect()
}

pub fn compose(cv: &Cv, selection: &SelectionSet) -> Result<DocumentModel, ComposeError> {
    let info = cv
        .personal_info
        .as_ref()
        .ok_or(ComposeError::MissingPersonalInfo)?;

    let mut sections = Vec::new();

    let skills = pick(&cv.skills, &selection.skills);
    if !skills.is_empty() {
        sections.push(Section::Skills { items: skills });
    }
    let education = pick(&cv.education, &selection.education);
    if !education.is_empty() {
        sections.push(Section::Education { entries: education });
    }
    let experience = pick(&cv.experience, &selection.experience);
    if !experience.is_empty() {
        sections.push(Section::Experience { entries: experience });
    }
    let references = pick(&cv.references, &selection.references);
    if !references.is_empty() {
        sections.push(Section::References { entries: references });
    }

    Ok(DocumentModel {
        header: Header {
            name: info.name.clone(),
            email: info.email.clone(),
            phone: info.phone.clone(),
        },
        sections,
    })
}
