use oxn_core::{parse_file_text, Draft, IngestFailure, SelectedFile};
use tracing::{debug, warn};

/// Reads and parses every file, in order.
///
/// Each file resolves independently; a read or parse failure is recorded on
/// that file's entry and never aborts its siblings.
pub async fn read_and_parse(files: Vec<SelectedFile>) -> Draft {
    let mut draft = Draft::new();
    for file in files {
        let parsed = match tokio::fs::read_to_string(&file.path).await {
            Ok(text) => parse_file_text(&file, &text),
            Err(e) => Err(IngestFailure::Read {
                message: e.to_string(),
            }),
        };
        match &parsed {
            Ok(_) => debug!(file = %file.name, "parsed"),
            Err(err) => warn!(file = %file.name, error = %err, "file excluded from draft"),
        }
        draft.push(file, parsed);
    }
    draft
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_read_failure() {
        let draft = read_and_parse(vec![SelectedFile::from_path("/nonexistent/oxn/a.yaml")]).await;
        assert_eq!(draft.len(), 1);
        assert!(matches!(
            draft.entries()[0].parsed,
            Err(IngestFailure::Read { .. })
        ));
        assert!(!draft.all_parsed());
    }
}
