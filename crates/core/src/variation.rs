//! Batch parameter variations and their cross-product expansion.
//!
//! A variation path is a dot-separated address into a document. Object
//! members are addressed by key, array elements by decimal index:
//! `experiment.treatments.1.delay_treatment.params.delay_time`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Document;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariationError {
    #[error("variation path is empty")]
    EmptyPath,
    #[error("variation path {path} has no candidate values")]
    NoCandidates { path: String },
    #[error("key '{key}' not found at path {path}")]
    MissingKey { path: String, key: String },
    #[error("index {index} out of bounds (len {len}) at path {path}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("segment '{segment}' is not an array index at path {path}")]
    InvalidIndex { path: String, segment: String },
    #[error("segment '{segment}' does not address an object or array at path {path}")]
    NotAContainer { path: String, segment: String },
    #[error("cross product of {axes} variation paths does not fit in usize")]
    TooManyCombinations { axes: usize },
}

/// Declared variation paths, each bound to its candidate values.
///
/// Paths are kept in lexicographic order; that order defines the expansion
/// axes, first path varying slowest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variations(BTreeMap<String, Vec<Document>>);

impl Variations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Declares (or replaces) the candidates for `path`.
    pub fn insert(&mut self, path: impl Into<String>, candidates: Vec<Document>) {
        self.0.insert(path.into(), candidates);
    }

    pub fn with(mut self, path: impl Into<String>, candidates: Vec<Document>) -> Self {
        self.insert(path, candidates);
        self
    }

    /// Merges `other` into `self`; paths declared in both take `other`'s candidates.
    pub fn extend(&mut self, other: Variations) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Document])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of sub-experiments the cross product yields.
    pub fn combination_count(&self) -> Result<usize, VariationError> {
        self.0
            .values()
            .try_fold(1usize, |acc, candidates| acc.checked_mul(candidates.len()))
            .ok_or(VariationError::TooManyCombinations { axes: self.0.len() })
    }

    /// Checks every path resolves in `base` and has at least one candidate,
    /// and that the cross product size is representable.
    pub fn validate(&self, base: &Document) -> Result<(), VariationError> {
        self.combination_count()?;
        for (path, candidates) in self.iter() {
            let first = candidates.first().ok_or_else(|| VariationError::NoCandidates {
                path: path.to_string(),
            })?;
            let mut probe = base.clone();
            set_path(&mut probe, path, first.clone())?;
        }
        Ok(())
    }

    /// Every combination of candidate values, as `(path, value)` assignments.
    ///
    /// Row-major: the first path varies slowest, the last path fastest. With
    /// no declared paths there is exactly one (empty) combination.
    pub fn combinations(&self) -> Result<Vec<Vec<(String, Document)>>, VariationError> {
        let axes: Vec<(&String, &Vec<Document>)> = self.0.iter().collect();
        let total = self.combination_count()?;
        let mut out = Vec::new();
        let mut cursor = vec![0usize; axes.len()];

        for _ in 0..total {
            out.push(
                axes.iter()
                    .zip(&cursor)
                    .map(|((path, candidates), &i)| ((*path).clone(), candidates[i].clone()))
                    .collect(),
            );
            for k in (0..axes.len()).rev() {
                cursor[k] += 1;
                if cursor[k] < axes[k].1.len() {
                    break;
                }
                cursor[k] = 0;
            }
        }
        Ok(out)
    }

    /// Expands `base` into one document per combination.
    pub fn expand(&self, base: &Document) -> Result<Vec<Document>, VariationError> {
        self.validate(base)?;
        self.combinations()?
            .into_iter()
            .map(|assignment| {
                let mut doc = base.clone();
                for (path, value) in assignment {
                    set_path(&mut doc, &path, value)?;
                }
                Ok(doc)
            })
            .collect()
    }
}

impl FromIterator<(String, Vec<Document>)> for Variations {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Document>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Replaces the value at `path` inside `doc`.
///
/// The addressed member must already exist: intermediate and final object
/// keys are never created, array indices must be in bounds.
pub fn set_path(doc: &mut Document, path: &str, value: Document) -> Result<(), VariationError> {
    if path.is_empty() {
        return Err(VariationError::EmptyPath);
    }
    let slot = resolve_mut(doc, path)?;
    *slot = value;
    Ok(())
}

/// Reads the value at `path`, if it exists.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Document> {
    path.split('.').try_fold(doc, |current, segment| match current {
        Document::Object(map) => map.get(segment),
        Document::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn resolve_mut<'a>(doc: &'a mut Document, path: &str) -> Result<&'a mut Document, VariationError> {
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            Document::Object(map) => {
                map.get_mut(segment)
                    .ok_or_else(|| VariationError::MissingKey {
                        path: path.to_string(),
                        key: segment.to_string(),
                    })?
            }
            Document::Array(items) => {
                let index = segment
                    .parse::<usize>()
                    .map_err(|_| VariationError::InvalidIndex {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })?;
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or_else(|| VariationError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len,
                    })?
            }
            _ => {
                return Err(VariationError::NotAContainer {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
        };
    }
    Ok(current)
}
