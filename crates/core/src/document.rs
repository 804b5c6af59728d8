use thiserror::Error;

use crate::model::Document;

/// Text encoding of an uploaded configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentFormat {
    /// Picks the format from a file name suffix (case-insensitive).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            Some(Self::Yaml)
        } else if lower.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    pub fn parse(self, text: &str) -> Result<Document, DocumentError> {
        Ok(match self {
            Self::Yaml => serde_yaml::from_str(text)?,
            Self::Json => serde_json::from_str(text)?,
        })
    }

    pub fn render(self, doc: &Document) -> Result<String, DocumentError> {
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(doc)?,
            Self::Json => serde_json::to_string_pretty(doc)?,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_from_suffix() {
        assert_eq!(DocumentFormat::from_file_name("a.yaml"), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_file_name("c.YML"), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_file_name("d.Json"), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_file_name("b.txt"), None);
    }

    #[test]
    fn yaml_keeps_key_order() {
        let doc = DocumentFormat::Yaml.parse("zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(doc, json!({"zeta": 1, "alpha": 2, "mid": 3}));
    }

    #[test]
    fn broken_documents_error() {
        assert!(matches!(
            DocumentFormat::Json.parse("{\"a\": "),
            Err(DocumentError::Json(_))
        ));
        assert!(matches!(
            DocumentFormat::Yaml.parse("a: [1, 2"),
            Err(DocumentError::Yaml(_))
        ));
    }
}
