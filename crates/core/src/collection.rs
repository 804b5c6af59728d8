use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::model::{Experiment, StatusUpdate};

/// In-memory list of experiments.
///
/// Updates never mutate in place: they build a new collection in which only
/// the entry with a matching id is a fresh allocation, every other entry is
/// the same `Arc` as before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentCollection {
    items: Vec<Arc<Experiment>>,
}

impl ExperimentCollection {
    pub fn new(items: Vec<Experiment>) -> Self {
        Self {
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Experiment>> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Experiment>> {
        self.items.iter().find(|e| e.has_id(id))
    }

    /// Returns a copy where every entry with `id` is replaced by `f(entry)`.
    pub fn replace_by_id<F>(&self, id: &str, f: F) -> Self
    where
        F: Fn(&Experiment) -> Experiment,
    {
        Self {
            items: self
                .items
                .iter()
                .map(|e| {
                    if e.has_id(id) {
                        Arc::new(f(e))
                    } else {
                        Arc::clone(e)
                    }
                })
                .collect(),
        }
    }

    /// Merges a status response into the entry with `id`.
    pub fn with_status(&self, id: &str, update: &StatusUpdate) -> Self {
        self.replace_by_id(id, |e| apply_status(e, update))
    }
}

/// Copies `status`, `analysis_status` and (when reported) `completed_at`
/// onto `experiment`; every other field is kept.
pub fn apply_status(experiment: &Experiment, update: &StatusUpdate) -> Experiment {
    let mut next = experiment.clone();
    next.status = update.status;
    if update.analysis_status.is_some() {
        next.analysis_status = update.analysis_status;
    }
    if update.completed_at.is_some() {
        next.completed_at = update.completed_at;
    }
    next
}

impl Serialize for ExperimentCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(|e| &**e))
    }
}

impl FromIterator<Experiment> for ExperimentCollection {
    fn from_iter<I: IntoIterator<Item = Experiment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
