//! Section Selector: which entries of a CV go into the exported document.
//!
//! Entries are addressed by their position in the loaded CV, so two entries
//! with the same display text stay independent.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::cv::Cv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Skills,
    Education,
    Experience,
    References,
}

impl EntryKind {
    pub fn len_in(&self, cv: &Cv) -> usize {
        match self {
            EntryKind::Skills => cv.skills.len(),
            EntryKind::Education => cv.education.len(),
            EntryKind::Experience => cv.experience.len(),
            EntryKind::References => cv.references.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    pub kind: EntryKind,
    pub index: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No {kind:?} entry at index {index}")]
    UnknownEntry { kind: EntryKind, index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub skills: BTreeSet<usize>,
    pub education: BTreeSet<usize>,
    pub experience: BTreeSet<usize>,
    pub references: BTreeSet<usize>,
}

impl SelectionSet {
    /// Everything in the CV selected.
    pub fn all_of(cv: &Cv) -> Self {
        SelectionSet {
            skills: (0..cv.skills.len()).collect(),
            education: (0..cv.education.len()).collect(),
            experience: (0..cv.experience.len()).collect(),
            references: (0..cv.references.len()).collect(),
        }
    }

    pub fn entries(&self, kind: EntryKind) -> &BTreeSet<usize> {
        match kind {
            EntryKind::Skills => &self.skills,
            EntryKind::Education => &self.education,
            EntryKind::Experience => &self.experience,
            EntryKind::References => &self.references,
        }
    }

    fn entries_mut(&mut self, kind: EntryKind) -> &mut BTreeSet<usize> {
        match kind {
            EntryKind::Skills => &mut self.skills,
            EntryKind::Education => &mut self.education,
            EntryKind::Experience => &mut self.experience,
            EntryKind::References => &mut self.references,
        }
    }

    pub fn contains(&self, kind: EntryKind, index: usize) -> bool {
        self.entries(kind).contains(&index)
    }

    /// Adds the entry if absent, removes it if present. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, kind: EntryKind, index: usize) -> bool {
        let entries = self.entries_mut(kind);
        if entries.remove(&index) {
            false
        } else {
            entries.insert(index);
            true
        }
    }

    /// Drops indices that point past the end of the CV's lists.
    pub fn retain_existing(&mut self, cv: &Cv) {
        for kind in [
            EntryKind::Skills,
            EntryKind::Education,
            EntryKind::Experience,
            EntryKind::References,
        ] {
            let len = kind.len_in(cv);
            self.entries_mut(kind).retain(|&index| index < len);
        }
    }
}

/// Skills whose text starts with `query`, ignoring case, in CV order. An empty
/// query matches every skill.
pub fn filter_skills<'a>(cv: &'a Cv, query: &str) -> Vec<(usize, &'a str)> {
    let needle = query.to_lowercase();
    cv.skills
        .iter()
        .enumerate()
        .filter(|(_, skill)| skill.to_lowercase().starts_with(&needle))
        .map(|(index, skill)| (index, skill.as_str()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Select everything again whenever a different CV or revision is loaded.
    #[default]
    Reseed,
    /// Keep the user's choices; only drop entries that no longer exist.
    Preserve,
}

/// A selection bound to the CV revision it was made against. `policy` is the
/// last one the user asked for and applies to every later reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub cv_id: Option<String>,
    pub revision: DateTime<Utc>,
    pub set: SelectionSet,
    #[serde(default)]
    pub policy: ReconcilePolicy,
}

impl SelectionState {
    pub fn seeded(cv: &Cv) -> Self {
        SelectionState {
            cv_id: cv.id.clone(),
            revision: cv.updated_at,
            set: SelectionSet::all_of(cv),
            policy: ReconcilePolicy::default(),
        }
    }

    /// Selects everything in `cv` again, keeping the remembered policy.
    fn reseed(&mut self, cv: &Cv) {
        self.cv_id = cv.id.clone();
        self.revision = cv.updated_at;
        self.set = SelectionSet::all_of(cv);
    }

    pub fn is_current_for(&self, cv: &Cv) -> bool {
        self.cv_id == cv.id && self.revision == cv.updated_at
    }

    /// Brings the selection in line with a freshly loaded CV.
    pub fn reconcile(&mut self, cv: &Cv, policy: ReconcilePolicy) {
        if self.is_current_for(cv) {
            return;
        }
        match policy {
            ReconcilePolicy::Reseed => self.reseed(cv),
            ReconcilePolicy::Preserve => {
                if self.cv_id != cv.id {
                    self.reseed(cv);
                } else {
                    self.set.retain_existing(cv);
                    self.revision = cv.updated_at;
                }
            }
        }
    }

    /// Remembers `requested` when given, then reconciles with the remembered
    /// policy.
    pub fn refresh(&mut self, cv: &Cv, requested: Option<ReconcilePolicy>) {
        if let Some(policy) = requested {
            self.policy = policy;
        }
        self.reconcile(cv, self.policy);
    }

    pub fn toggle(&mut self, cv: &Cv, entry: EntryRef) -> Result<bool, SelectionError> {
        if entry.index >= entry.kind.len_in(cv) {
            return Err(SelectionError::UnknownEntry {
                kind: entry.kind,
                index: entry.index,
            });
        }
        Ok(self.set.toggle(entry.kind, entry.index))
    }

    pub fn reset(&mut self, cv: &Cv) {
        self.reseed(cv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::fixtures::sample_cv;
    use chrono::Duration;

    fn cv_with_skills(skills: &[&str]) -> Cv {
        let mut cv = sample_cv("cv-1", "user-1");
        cv.skills = skills.iter().map(|s| s.to_string()).collect();
        cv
    }

    #[test]
    fn test_all_of_selects_every_entry() {
        let cv = sample_cv("cv-1", "user-1");
        let set = SelectionSet::all_of(&cv);
        assert_eq!(set.skills, BTreeSet::from([0, 1, 2]));
        assert_eq!(set.education.len(), 1);
        assert_eq!(set.experience.len(), 1);
        assert_eq!(set.references.len(), 1);
    }

    #[test]
    fn test_toggle_is_self_inverse() {
        let cv = sample_cv("cv-1", "user-1");
        let original = SelectionSet::all_of(&cv);
        let mut set = original.clone();

        assert!(!set.toggle(EntryKind::Skills, 1));
        assert!(!set.contains(EntryKind::Skills, 1));
        assert!(set.toggle(EntryKind::Skills, 1));
        assert_eq!(set, original);
    }

    #[test]
    fn test_duplicate_skill_text_toggles_independently() {
        let cv = cv_with_skills(&["Rust", "Rust"]);
        let mut state = SelectionState::seeded(&cv);
        state
            .toggle(&cv, EntryRef { kind: EntryKind::Skills, index: 0 })
            .unwrap();
        assert_eq!(state.set.skills, BTreeSet::from([1]));
    }

    #[test]
    fn test_toggle_rejects_unknown_index() {
        let cv = sample_cv("cv-1", "user-1");
        let mut state = SelectionState::seeded(&cv);
        let err = state
            .toggle(&cv, EntryRef { kind: EntryKind::References, index: 3 })
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::UnknownEntry { kind: EntryKind::References, index: 3 }
        );
    }

    #[test]
    fn test_filter_skills_prefix_case_insensitive() {
        let cv = cv_with_skills(&["Java", "JavaScript", "Go"]);
        let matches = filter_skills(&cv, "ja");
        assert_eq!(matches, vec![(0, "Java"), (1, "JavaScript")]);
        assert_eq!(filter_skills(&cv, "").len(), 3);
        assert!(filter_skills(&cv, "script").is_empty());
    }

    #[test]
    fn test_reseed_on_new_revision() {
        let mut cv = sample_cv("cv-1", "user-1");
        let mut state = SelectionState::seeded(&cv);
        state.set.toggle(EntryKind::Skills, 0);

        // Same revision: choices survive.
        state.reconcile(&cv, ReconcilePolicy::Reseed);
        assert!(!state.set.contains(EntryKind::Skills, 0));

        cv.updated_at = cv.updated_at + Duration::minutes(1);
        state.reconcile(&cv, ReconcilePolicy::Reseed);
        assert_eq!(state.set, SelectionSet::all_of(&cv));
        assert_eq!(state.revision, cv.updated_at);
    }

    #[test]
    fn test_preserve_drops_only_vanished_entries() {
        let mut cv = sample_cv("cv-1", "user-1");
        let mut state = SelectionState::seeded(&cv);
        state.set.toggle(EntryKind::Skills, 0);

        cv.skills.pop();
        cv.updated_at = cv.updated_at + Duration::minutes(1);
        state.reconcile(&cv, ReconcilePolicy::Preserve);
        assert_eq!(state.set.skills, BTreeSet::from([1]));
        assert!(state.is_current_for(&cv));
    }

    #[test]
    fn test_preserve_reseeds_for_a_different_cv() {
        let cv = sample_cv("cv-1", "user-1");
        let mut state = SelectionState::seeded(&cv);
        state.set.skills.clear();

        let other = sample_cv("cv-2", "user-1");
        state.reconcile(&other, ReconcilePolicy::Preserve);
        assert_eq!(state.cv_id.as_deref(), Some("cv-2"));
        assert_eq!(state.set, SelectionSet::all_of(&other));
        assert_eq!(state.policy, ReconcilePolicy::Reseed);
    }

    #[test]
    fn test_refresh_remembers_requested_policy() {
        let mut cv = sample_cv("cv-1", "user-1");
        let mut state = SelectionState::seeded(&cv);
        state.refresh(&cv, Some(ReconcilePolicy::Preserve));
        state.set.toggle(EntryKind::Skills, 2);

        cv.updated_at = cv.updated_at + Duration::minutes(1);
        state.refresh(&cv, None);
        assert_eq!(state.policy, ReconcilePolicy::Preserve);
        assert_eq!(state.set.skills, BTreeSet::from([0, 1]));

        state.reset(&cv);
        assert_eq!(state.set, SelectionSet::all_of(&cv));
        assert_eq!(state.policy, ReconcilePolicy::Preserve);

        cv.updated_at = cv.updated_at + Duration::minutes(1);
        state.set.toggle(EntryKind::Skills, 0);
        state.refresh(&cv, Some(ReconcilePolicy::Reseed));
        assert_eq!(state.set, SelectionSet::all_of(&cv));
    }
}
