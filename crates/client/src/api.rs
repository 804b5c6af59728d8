//! Read-only backend endpoints: listing, reports, analysis and file downloads.

use std::path::{Path, PathBuf};

use oxn_core::{
    paths, AnalysisData, Document, Experiment, FaultDetectionRow, InteractionRow, Report,
    ReportEnvelope,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{ClientError, TransportError};
use crate::request::{error_message, RequestClient};
use crate::transport::Transport;

/// Experiment artifacts offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Config,
    Benchmark,
    Data,
}

impl DownloadKind {
    pub fn path(self, id: &str) -> String {
        match self {
            Self::Config => paths::config(id),
            Self::Benchmark => paths::benchmark(id),
            Self::Data => paths::data(id),
        }
    }

    pub fn file_name(self, id: &str) -> String {
        match self {
            Self::Config => format!("{id}-config.json"),
            Self::Benchmark => format!("{id}-benchmark.csv"),
            Self::Data => format!("{id}.zip"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExperimentApi<T> {
    transport: T,
}

impl<T: Transport> ExperimentApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn get<R: DeserializeOwned>(&self, path: String) -> Result<R, ClientError> {
        RequestClient::get(self.transport.clone(), path)
            .manual()
            .quiet()
            .fetch()
            .await
    }

    pub async fn list_experiments(&self) -> Result<Vec<Experiment>, ClientError> {
        self.get(paths::EXPERIMENTS.to_string()).await
    }

    pub async fn report(&self, id: &str) -> Result<Report, ClientError> {
        let envelope: ReportEnvelope = self.get(paths::report(id)).await?;
        Ok(envelope.report)
    }

    pub async fn report_rows(&self, id: &str) -> Result<Vec<InteractionRow>, ClientError> {
        Ok(self.report(id).await?.interaction_rows())
    }

    pub async fn fault_detection(&self, id: &str) -> Result<Vec<FaultDetectionRow>, ClientError> {
        self.get(paths::fault_detection(id)).await
    }

    pub async fn raw_detections(&self, id: &str) -> Result<Vec<Document>, ClientError> {
        self.get(paths::raw_detections(id)).await
    }

    /// Aggregated analysis across all experiments, or for one when `id` is set.
    pub async fn analysis(&self, id: Option<&str>) -> Result<AnalysisData, ClientError> {
        self.get(paths::analysis_data(id)).await
    }

    /// Saves an artifact under `dir` using its default file name.
    pub async fn download(
        &self,
        id: &str,
        kind: DownloadKind,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let bytes = self
            .transport
            .download(&kind.path(id))
            .await
            .map_err(|e: TransportError| ClientError::Request(error_message(&e)))?;
        let target = dir.join(kind.file_name(id));
        tokio::fs::write(&target, &bytes).await?;
        info!(id, path = %target.display(), bytes = bytes.len(), "downloaded");
        Ok(target)
    }
}
