//! Mode-specific submissions derived from an ingested [`Draft`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{BatchCreateRequest, CreateExperimentRequest, SuiteCreateRequest};
use crate::ingest::Draft;
use crate::model::Document;
use crate::variation::{VariationError, Variations};

/// How the uploaded files are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentMode {
    Single,
    Batch,
    Suite,
}

impl ExperimentMode {
    /// Whether more than one file may be selected.
    pub fn allows_multiple(self) -> bool {
        matches!(self, Self::Suite)
    }

    /// Suites are created as soon as every document has parsed.
    pub fn creates_on_parse(self) -> bool {
        matches!(self, Self::Suite)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("no files selected")]
    Empty,
    #[error("{mode:?} mode takes exactly one file, found {found}")]
    ExpectedOne { mode: ExperimentMode, found: usize },
    #[error("file {file} did not parse")]
    Unparsed { file: String },
    #[error("invalid batch definition: {0}")]
    InvalidBatch(String),
    #[error(transparent)]
    Variation(#[from] VariationError),
}

/// Keys accepted for declaring variations inside a batch document.
const VARIATION_KEYS: [&str; 2] = ["variationPaths", "parameter_variations"];

/// Every key a wrapper document may carry.
const ENVELOPE_KEYS: [&str; 4] = ["name", "config", "variationPaths", "parameter_variations"];

/// A document either is a bare config, or wraps one as `{name?, config, ...}`.
///
/// Only a document whose keys are all wrapper keys counts as a wrapper; any
/// other document is passed through untouched.
struct Envelope {
    name: Option<String>,
    config: Document,
    variations: Option<Document>,
}

fn open_envelope(doc: &Document) -> Envelope {
    match doc.as_object() {
        Some(map)
            if map.get("config").is_some_and(Document::is_object)
                && map.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str())) =>
        {
            Envelope {
                name: map.get("name").and_then(Document::as_str).map(str::to_string),
                config: map["config"].clone(),
                variations: VARIATION_KEYS.iter().find_map(|k| map.get(*k)).cloned(),
            }
        }
        _ => Envelope {
            name: None,
            config: doc.clone(),
            variations: None,
        },
    }
}

/// One experiment definition plus the variation paths to expand it with.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDefinition {
    pub name: String,
    pub config: Document,
    pub variations: Variations,
}

impl BatchDefinition {
    pub fn new(name: impl Into<String>, config: Document) -> Self {
        Self {
            name: name.into(),
            config,
            variations: Variations::new(),
        }
    }

    /// Reads a batch document, bare or wrapped, and validates its variations.
    pub fn from_document(default_name: &str, doc: &Document) -> Result<Self, DraftError> {
        let envelope = open_envelope(doc);
        let variations = match envelope.variations {
            None | Some(Document::Null) => Variations::new(),
            Some(raw) => serde_json::from_value::<Variations>(raw).map_err(|e| {
                DraftError::InvalidBatch(format!("variation paths must map paths to arrays: {e}"))
            })?,
        };
        let def = Self {
            name: envelope.name.unwrap_or_else(|| default_name.to_string()),
            config: envelope.config,
            variations,
        };
        def.validate()?;
        Ok(def)
    }

    pub fn with_variations(mut self, extra: Variations) -> Result<Self, DraftError> {
        self.variations.extend(extra);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        Ok(self.variations.validate(&self.config)?)
    }

    pub fn combination_count(&self) -> Result<usize, VariationError> {
        self.variations.combination_count()
    }

    /// The sub-experiment documents the backend will run.
    pub fn expand(&self) -> Result<Vec<Document>, VariationError> {
        self.variations.expand(&self.config)
    }

    pub fn create_request(&self) -> BatchCreateRequest {
        BatchCreateRequest {
            name: self.name.clone(),
            config: self.config.clone(),
            variation_paths: self.variations.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteMember {
    pub name: String,
    pub config: Document,
}

/// A draft validated for its mode, ready to be created.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Single { name: String, config: Document },
    Batch(BatchDefinition),
    Suite(Vec<SuiteMember>),
}

impl Submission {
    pub fn from_draft(mode: ExperimentMode, draft: &Draft) -> Result<Self, DraftError> {
        if draft.is_empty() {
            return Err(DraftError::Empty);
        }
        for entry in draft.entries() {
            if entry.parsed.is_err() {
                return Err(DraftError::Unparsed {
                    file: entry.file.name.clone(),
                });
            }
        }
        let parsed: Vec<(&str, &Document)> = draft
            .entries()
            .iter()
            .filter_map(|e| e.parsed.as_ref().ok().map(|doc| (e.file.name.as_str(), doc)))
            .collect();

        match mode {
            ExperimentMode::Single | ExperimentMode::Batch if parsed.len() != 1 => {
                Err(DraftError::ExpectedOne {
                    mode,
                    found: parsed.len(),
                })
            }
            ExperimentMode::Single => {
                let (file_name, doc) = parsed[0];
                let envelope = open_envelope(doc);
                Ok(Self::Single {
                    name: envelope.name.unwrap_or_else(|| file_name.to_string()),
                    config: envelope.config,
                })
            }
            ExperimentMode::Batch => {
                let (file_name, doc) = parsed[0];
                Ok(Self::Batch(BatchDefinition::from_document(file_name, doc)?))
            }
            ExperimentMode::Suite => Ok(Self::Suite(
                parsed
                    .into_iter()
                    .map(|(file_name, doc)| {
                        let envelope = open_envelope(doc);
                        SuiteMember {
                            name: envelope.name.unwrap_or_else(|| file_name.to_string()),
                            config: envelope.config,
                        }
                    })
                    .collect(),
            )),
        }
    }

    pub fn mode(&self) -> ExperimentMode {
        match self {
            Self::Single { .. } => ExperimentMode::Single,
            Self::Batch(_) => ExperimentMode::Batch,
            Self::Suite(_) => ExperimentMode::Suite,
        }
    }

    /// Number of ids the create call is expected to return.
    pub fn expected_ids(&self) -> usize {
        match self {
            Self::Single { .. } | Self::Batch(_) => 1,
            Self::Suite(members) => members.len(),
        }
    }

    /// Experiment names in the order their ids come back.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single { name, .. } => vec![name.as_str()],
            Self::Batch(def) => vec![def.name.as_str()],
            Self::Suite(members) => members.iter().map(|m| m.name.as_str()).collect(),
        }
    }

    /// JSON body of the create call.
    pub fn create_body(&self) -> Result<Document, serde_json::Error> {
        match self {
            Self::Single { name, config } => serde_json::to_value(CreateExperimentRequest {
                name: name.clone(),
                config: config.clone(),
            }),
            Self::Batch(def) => serde_json::to_value(def.create_request()),
            Self::Suite(members) => serde_json::to_value(SuiteCreateRequest {
                experiments: members.iter().map(|m| m.config.clone()).collect(),
            }),
        }
    }
}
