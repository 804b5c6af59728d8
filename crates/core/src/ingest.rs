use std::path::PathBuf;

use thiserror::Error;

use crate::document::DocumentFormat;
use crate::model::Document;

/// Allow-list used when no other is configured.
pub const DEFAULT_EXTENSIONS: [&str; 3] = [".yaml", ".yml", ".json"];

/// A file picked by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Display name, used for suffix matching and as default experiment name.
    pub name: String,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Uses the last path component as the display name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Case-insensitive suffix allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: Vec<String>,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl ExtensionFilter {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|ext| ext.as_ref().trim().to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.allowed.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Drops files with a rejected suffix, keeping input order.
    ///
    /// With `multiple == false` only the first accepted file survives.
    pub fn select(&self, files: Vec<SelectedFile>, multiple: bool) -> Vec<SelectedFile> {
        let accepted = files.into_iter().filter(|f| self.accepts(&f.name));
        if multiple {
            accepted.collect()
        } else {
            accepted.take(1).collect()
        }
    }
}

/// Why one file did not produce a parsed document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestFailure {
    #[error("could not read file: {message}")]
    Read { message: String },
    #[error("could not parse {format}: {message}")]
    Parse {
        format: DocumentFormat,
        message: String,
    },
    #[error("unsupported document format")]
    UnsupportedFormat,
}

/// Parses one file's text according to its suffix.
pub fn parse_file_text(file: &SelectedFile, text: &str) -> Result<Document, IngestFailure> {
    let format = DocumentFormat::from_file_name(&file.name).ok_or(IngestFailure::UnsupportedFormat)?;
    format.parse(text).map_err(|e| IngestFailure::Parse {
        format,
        message: e.to_string(),
    })
}

/// A file together with the outcome of parsing it.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftEntry {
    pub file: SelectedFile,
    pub parsed: Result<Document, IngestFailure>,
}

/// Files of one upload session, each paired with its parse outcome by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    entries: Vec<DraftEntry>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: SelectedFile, parsed: Result<Document, IngestFailure>) {
        self.entries.push(DraftEntry { file, parsed });
    }

    /// Removes the file at `index` together with its parsed content.
    pub fn remove(&mut self, index: usize) -> Option<DraftEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &SelectedFile> {
        self.entries.iter().map(|e| &e.file)
    }

    /// Successfully parsed documents, in file order.
    pub fn parsed_contents(&self) -> Vec<&Document> {
        self.entries.iter().filter_map(|e| e.parsed.as_ref().ok()).collect()
    }

    pub fn failures(&self) -> Vec<(&SelectedFile, &IngestFailure)> {
        self.entries
            .iter()
            .filter_map(|e| e.parsed.as_ref().err().map(|err| (&e.file, err)))
            .collect()
    }

    /// True when there is at least one file and every file parsed.
    pub fn all_parsed(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.parsed.is_ok())
    }
}
