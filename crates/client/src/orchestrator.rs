//! Create-then-run lifecycle of one upload session.

use std::slice;

use oxn_core::{
    now, paths, Document, Draft, DraftError, Experiment, ExperimentMode, ExtensionFilter, Id,
    IdResponse, RunOptions, SelectedFile, Submission, SuiteRunRequest, Timestamp, Variations,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::ingest::read_and_parse;
use crate::request::RequestClient;
use crate::transport::Transport;

/// Backend ids bound by a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundIds {
    One(Id),
    Many(Vec<Id>),
}

impl BoundIds {
    pub fn ids(&self) -> &[Id] {
        match self {
            Self::One(id) => slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    NoFile,
    FilesSelected,
    Parsed,
    Created(BoundIds),
    /// Terminal; progress is tracked through the status refresher.
    Started(BoundIds),
}

impl Phase {
    pub fn bound_ids(&self) -> Option<&BoundIds> {
        match self {
            Self::Created(ids) | Self::Started(ids) => Some(ids),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NoFile => "no_file",
            Self::FilesSelected => "files_selected",
            Self::Parsed => "parsed",
            Self::Created(_) => "created",
            Self::Started(_) => "started",
        }
    }
}

/// Drives one session through `NoFile -> FilesSelected -> Parsed -> Created -> Started`.
///
/// Methods take `&mut self`, so a create or run cannot be issued while
/// another call on the same session is outstanding.
#[derive(Debug)]
pub struct Orchestrator<T> {
    transport: T,
    mode: ExperimentMode,
    filter: ExtensionFilter,
    options: RunOptions,
    variations: Variations,
    selected: Vec<SelectedFile>,
    draft: Draft,
    phase: Phase,
    experiments: Vec<Experiment>,
    last_error: Option<String>,
    created_at: Option<Timestamp>,
    started_at: Option<Timestamp>,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(transport: T, mode: ExperimentMode) -> Self {
        Self {
            transport,
            mode,
            filter: ExtensionFilter::default(),
            options: RunOptions::default(),
            variations: Variations::new(),
            selected: Vec::new(),
            draft: Draft::new(),
            phase: Phase::NoFile,
            experiments: Vec::new(),
            last_error: None,
            created_at: None,
            started_at: None,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_filter(mut self, filter: ExtensionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Extra variation paths merged into a batch definition at create time.
    pub fn with_variations(mut self, variations: Variations) -> Self {
        self.variations = variations;
        self
    }

    pub fn mode(&self) -> ExperimentMode {
        self.mode
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn selected_files(&self) -> &[SelectedFile] {
        &self.selected
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn bound_ids(&self) -> Option<&BoundIds> {
        self.phase.bound_ids()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    /// Experiments bound by the create call, in id order.
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Starts a new session with `files`; previously parsed content is discarded.
    ///
    /// Files with a rejected suffix are dropped silently. Returns how many were kept.
    pub fn select_files(&mut self, files: Vec<SelectedFile>) -> usize {
        let offered = files.len();
        self.selected = self.filter.select(files, self.mode.allows_multiple());
        self.draft = Draft::new();
        self.experiments.clear();
        self.last_error = None;
        self.created_at = None;
        self.started_at = None;
        let next = if self.selected.is_empty() {
            Phase::NoFile
        } else {
            Phase::FilesSelected
        };
        self.transition(next);
        debug!(offered, kept = self.selected.len(), "files selected");
        self.selected.len()
    }

    /// Removes the file at `index` and its parsed content. Ignored once created.
    ///
    /// In suite mode, dropping the last unparsed file fires the create call
    /// just as a fully parsed ingest does.
    pub async fn remove_file(&mut self, index: usize) -> Result<Option<SelectedFile>, ClientError> {
        if self.phase.bound_ids().is_some() || index >= self.selected.len() {
            return Ok(None);
        }
        let removed = self.selected.remove(index);
        if self.phase == Phase::Parsed {
            self.draft.remove(index);
        }
        if self.selected.is_empty() {
            self.draft = Draft::new();
            self.transition(Phase::NoFile);
        }
        debug!(file = %removed.name, "file removed");

        if self.phase == Phase::Parsed && self.mode.creates_on_parse() && self.draft.all_parsed() {
            self.create().await?;
        }
        Ok(Some(removed))
    }

    /// Reads and parses every selected file.
    ///
    /// Waits for all files, then moves to `Parsed` with the successful subset
    /// and the per-file failures. In suite mode the create call fires as soon
    /// as every document parsed.
    pub async fn ingest(&mut self) -> Result<&Draft, ClientError> {
        if self.phase != Phase::FilesSelected {
            debug!(phase = self.phase.name(), "nothing to ingest");
            return Ok(&self.draft);
        }
        self.draft = read_and_parse(self.selected.clone()).await;
        let failed = self.draft.failures().len();
        info!(
            files = self.draft.len(),
            parsed = self.draft.len() - failed,
            failed,
            "ingest complete"
        );
        self.transition(Phase::Parsed);

        if self.mode.creates_on_parse() && self.draft.all_parsed() {
            self.create().await?;
        }
        Ok(&self.draft)
    }

    /// The draft validated for this session's mode.
    pub fn submission(&self) -> Result<Submission, DraftError> {
        let submission = Submission::from_draft(self.mode, &self.draft)?;
        match submission {
            Submission::Batch(def) if !self.variations.is_empty() => Ok(Submission::Batch(
                def.with_variations(self.variations.clone())?,
            )),
            other => Ok(other),
        }
    }

    /// Issues the mode's create call and binds the returned id(s).
    ///
    /// Once bound, further calls return the existing ids without a request.
    /// A failed call leaves the session in `Parsed` so it can be retried.
    pub async fn create(&mut self) -> Result<BoundIds, ClientError> {
        if let Some(ids) = self.phase.bound_ids() {
            debug!(ids = ?ids.ids(), "already created");
            return Ok(ids.clone());
        }
        if self.phase != Phase::Parsed {
            return Err(ClientError::NotParsed);
        }
        let submission = self.submission()?;
        let body = submission.create_body()?;

        let result = match &submission {
            Submission::Single { .. } => self
                .create_one(paths::EXPERIMENTS, body)
                .await
                .map(BoundIds::One),
            Submission::Batch(_) => self
                .create_one(paths::BATCH, body)
                .await
                .map(BoundIds::One),
            Submission::Suite(_) => {
                self.call::<Vec<Document>>(paths::SUITE, body)
                    .await
                    .and_then(|entries| {
                        let expected = submission.expected_ids();
                        if entries.len() != expected {
                            return Err(ClientError::IdCountMismatch {
                                expected,
                                found: entries.len(),
                            });
                        }
                        let ids = entries.into_iter().map(id_of).collect::<Result<_, _>>()?;
                        Ok(BoundIds::Many(ids))
                    })
            }
        };
        let ids = self.record(result)?;

        let created_at = now();
        self.experiments = bind_experiments(&submission, &ids, created_at);
        self.created_at = Some(created_at);
        info!(mode = ?self.mode, ids = ?ids.ids(), "experiment created");
        self.transition(Phase::Created(ids.clone()));
        Ok(ids)
    }

    /// Issues the run call for the bound id(s).
    ///
    /// Without a bound id, or after a run was already started, this returns
    /// `Ok(None)` and sends nothing.
    pub async fn start(&mut self) -> Result<Option<Value>, ClientError> {
        let ids = match &self.phase {
            Phase::Created(ids) => ids.clone(),
            Phase::Started(_) => {
                debug!("already started");
                return Ok(None);
            }
            other => {
                debug!(phase = other.name(), "no id bound, start skipped");
                return Ok(None);
            }
        };

        let (path, body) = match (self.mode, &ids) {
            (ExperimentMode::Single, BoundIds::One(id)) => (
                paths::run_sync(id),
                serde_json::to_value(self.options.single_run_request())?,
            ),
            (ExperimentMode::Batch, BoundIds::One(id)) => (
                paths::batch_run(id),
                serde_json::to_value(self.options.batch_run_request())?,
            ),
            (_, ids) => (
                paths::SUITE_RUN.to_string(),
                serde_json::to_value(SuiteRunRequest {
                    experiment_ids: ids.ids().to_vec(),
                })?,
            ),
        };

        let result = self.call::<Value>(&path, body).await;
        let outcome = self.record(result)?;

        let started_at = now();
        self.started_at = Some(started_at);
        for experiment in &mut self.experiments {
            experiment.started_at = Some(started_at);
        }
        info!(mode = ?self.mode, ids = ?ids.ids(), "experiment started");
        self.transition(Phase::Started(ids));
        Ok(Some(outcome))
    }

    async fn call<R: DeserializeOwned>(
        &self,
        path: &str,
        body: Document,
    ) -> Result<R, ClientError> {
        RequestClient::post(self.transport.clone(), path, body)
            .fetch::<R>()
            .await
    }

    async fn create_one(&self, path: &str, body: Document) -> Result<Id, ClientError> {
        RequestClient::post(self.transport.clone(), path, body)
            .fetch_object::<IdResponse>()
            .await
            .map(|r| r.id)
    }

    fn record<R>(&mut self, result: Result<R, ClientError>) -> Result<R, ClientError> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(err) => {
                warn!(phase = self.phase.name(), error = %err, "call failed");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: Phase) {
        if self.phase != next {
            debug!(from = self.phase.name(), to = next.name(), "phase");
        }
        self.phase = next;
    }
}

/// Reads the id of one suite create entry; entries must be objects.
fn id_of(entry: Document) -> Result<Id, ClientError> {
    if !entry.is_object() {
        return Err(ClientError::Decode(format!(
            "suite create entry is not an object: {entry}"
        )));
    }
    serde_json::from_value::<IdResponse>(entry)
        .map(|r| r.id)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

fn bind_experiments(submission: &Submission, ids: &BoundIds, created_at: Timestamp) -> Vec<Experiment> {
    let configs: Vec<(&str, &Document)> = match submission {
        Submission::Single { name, config } => vec![(name.as_str(), config)],
        Submission::Batch(def) => vec![(def.name.as_str(), &def.config)],
        Submission::Suite(members) => members
            .iter()
            .map(|m| (m.name.as_str(), &m.config))
            .collect(),
    };
    configs
        .into_iter()
        .zip(ids.ids())
        .map(|((name, config), id)| {
            let mut experiment = Experiment::draft(name, config.clone());
            experiment.id = Some(id.clone());
            experiment.created_at = Some(created_at);
            experiment
        })
        .collect()
}
