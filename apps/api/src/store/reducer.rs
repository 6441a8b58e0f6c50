//! Pure state transitions for the store collections.
//!
//! `reduce(state, intent) -> state` is the only way a collection changes. The
//! async store computes an intent from each backend call and applies it here.

use serde::Serialize;

use crate::models::cv::Cv;
use crate::models::user::User;

/// A record addressable by its backend id.
pub trait Record: Clone {
    fn record_id(&self) -> Option<&str>;
}

impl Record for Cv {
    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Record for User {
    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// What the last fetch of a collection produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    NotLoaded,
    Loaded,
    /// The backend answered 403; `items` is empty.
    Denied,
    /// Transport or decode failure; `items` is empty.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    Denied,
    Failed,
}

/// Captured when a fetch starts. Carries the collection revision at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub status: FetchStatus,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped by every applied mutation.
    pub revision: u64,
    /// Fetch payloads dropped because a mutation landed while they were in flight.
    pub stale_fetches_discarded: u64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection {
            items: Vec::new(),
            status: FetchStatus::NotLoaded,
            loading: false,
            error: None,
            revision: 0,
            stale_fetches_discarded: 0,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            revision: self.revision,
        }
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.record_id() == Some(id))
    }
}

#[derive(Debug, Clone)]
pub enum CollectionIntent<T> {
    FetchStarted,
    FetchSucceeded { ticket: FetchTicket, items: Vec<T> },
    FetchFailed { ticket: FetchTicket, failure: FetchFailure, message: String },
    Created(T),
    Updated(T),
    Deleted(String),
    MutationFailed(String),
}

pub fn reduce<T: Record>(mut state: Collection<T>, intent: CollectionIntent<T>) -> Collection<T> {
    match intent {
        CollectionIntent::FetchStarted => {
            state.loading = true;
            state.error = None;
        }
        CollectionIntent::FetchSucceeded { ticket, items } => {
            state.loading = false;
            if ticket.revision == state.revision {
                state.items = items;
                state.status = FetchStatus::Loaded;
            } else {
                state.stale_fetches_discarded += 1;
            }
        }
        CollectionIntent::FetchFailed {
            ticket,
            failure,
            message,
        } => {
            state.loading = false;
            state.error = Some(message);
            if ticket.revision == state.revision {
                state.items.clear();
                state.status = match failure {
                    FetchFailure::Denied => FetchStatus::Denied,
                    FetchFailure::Failed => FetchStatus::Failed,
                };
            } else {
                state.stale_fetches_discarded += 1;
            }
        }
        CollectionIntent::Created(record) => {
            state.loading = false;
            state.items.push(record);
            state.revision += 1;
        }
        CollectionIntent::Updated(record) => {
            state.loading = false;
            let id = record.record_id().map(str::to_owned);
            if let Some(slot) = state
                .items
                .iter_mut()
                .find(|item| item.record_id().is_some() && item.record_id() == id.as_deref())
            {
                *slot = record;
            }
            state.revision += 1;
        }
        CollectionIntent::Deleted(id) => {
            state.loading = false;
            state.items.retain(|item| item.record_id() != Some(id.as_str()));
            state.revision += 1;
        }
        CollectionIntent::MutationFailed(message) => {
            state.loading = false;
            state.error = Some(message);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::fixtures::sample_cv;

    fn loaded(items: Vec<Cv>) -> Collection<Cv> {
        let state = Collection::default();
        let ticket = state.ticket();
        reduce(state, CollectionIntent::FetchSucceeded { ticket, items })
    }

    #[test]
    fn test_fetch_replaces_instead_of_merging() {
        let state = loaded(vec![sample_cv("a", "u"), sample_cv("b", "u")]);
        let ticket = state.ticket();
        let state = reduce(
            state,
            CollectionIntent::FetchSucceeded {
                ticket,
                items: vec![sample_cv("c", "u")],
            },
        );
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id.as_deref(), Some("c"));
        assert_eq!(state.status, FetchStatus::Loaded);
    }

    #[test]
    fn test_denied_fetch_empties_and_flags() {
        let state = loaded(vec![sample_cv("a", "u")]);
        let ticket = state.ticket();
        let state = reduce(
            state,
            CollectionIntent::FetchFailed {
                ticket,
                failure: FetchFailure::Denied,
                message: "Forbidden".to_string(),
            },
        );
        assert!(state.items.is_empty());
        assert_eq!(state.status, FetchStatus::Denied);
        assert_eq!(state.error.as_deref(), Some("Forbidden"));
    }

    #[test]
    fn test_stale_fetch_does_not_overwrite_mutation() {
        let state = loaded(vec![sample_cv("a", "u")]);
        let ticket = state.ticket();
        let state = reduce(state, CollectionIntent::FetchStarted);
        // A create resolves while the fetch is still in flight.
        let state = reduce(state, CollectionIntent::Created(sample_cv("b", "u")));
        let state = reduce(
            state,
            CollectionIntent::FetchSucceeded {
                ticket,
                items: vec![sample_cv("a", "u")],
            },
        );
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.stale_fetches_discarded, 1);
        assert!(!state.loading);
    }

    #[test]
    fn test_update_replaces_matching_record_only() {
        let state = loaded(vec![sample_cv("a", "u"), sample_cv("b", "u")]);
        let mut changed = sample_cv("b", "u");
        changed.skills = vec!["Zig".to_string()];
        let state = reduce(state, CollectionIntent::Updated(changed));
        assert_eq!(state.items[1].skills, vec!["Zig".to_string()]);
        assert_eq!(state.items[0].skills.len(), 3);
        assert_eq!(state.revision, 1);
    }

    #[test]
    fn test_delete_removes_by_id() {
        let state = loaded(vec![sample_cv("a", "u"), sample_cv("b", "u")]);
        let state = reduce(state, CollectionIntent::Deleted("a".to_string()));
        assert_eq!(state.items.len(), 1);
        assert!(state.find("a").is_none());
        assert!(state.find("b").is_some());
    }

    #[test]
    fn test_mutation_failure_keeps_items() {
        let state = loaded(vec![sample_cv("a", "u")]);
        let state = reduce(state, CollectionIntent::MutationFailed("boom".to_string()));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.revision, 0);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }
}
