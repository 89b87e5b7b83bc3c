//! Biography and profile document loading.
//!
//! Loading never fails: any problem is logged and replaced by placeholder
//! text so the assistant can still start.

use std::path::Path;
use tracing::{debug, warn};

/// Text used when the biography summary cannot be read.
pub const SUMMARY_PLACEHOLDER: &str = "Summary not available";

/// Text used when the profile document cannot be read.
pub const PROFILE_PLACEHOLDER: &str = "LinkedIn profile not available";

/// Reads the plain-text biography summary.
#[must_use]
pub fn load_summary(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), bytes = text.len(), "loaded summary");
            text
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "summary unavailable");
            SUMMARY_PLACEHOLDER.to_string()
        }
    }
}

/// Reads the profile document.
///
/// PDF files have the text of every page concatenated; anything else is
/// read as UTF-8 text.
#[must_use]
pub fn load_profile(path: &Path) -> String {
    let loaded = if is_pdf(path) {
        pdf_extract::extract_text(path).map_err(|e| e.to_string())
    } else {
        std::fs::read_to_string(path).map_err(|e| e.to_string())
    };

    match loaded {
        Ok(text) if !text.trim().is_empty() => {
            debug!(path = %path.display(), bytes = text.len(), "loaded profile");
            text
        }
        Ok(_) => {
            warn!(path = %path.display(), "profile document has no text");
            PROFILE_PLACEHOLDER.to_string()
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "profile unavailable");
            PROFILE_PLACEHOLDER.to_string()
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn summary_reads_text() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "Builds distributed systems.").expect("write");

        assert_eq!(load_summary(file.path()), "Builds distributed systems.");
    }

    #[test]
    fn missing_summary_yields_placeholder() {
        let dir = tempfile::tempdir().expect("temp dir");
        let text = load_summary(&dir.path().join("summary.txt"));
        assert_eq!(text, SUMMARY_PLACEHOLDER);
    }

    #[test]
    fn text_profile_is_read_verbatim() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");
        write!(file, "Experience\nStaff Engineer").expect("write");

        assert_eq!(load_profile(file.path()), "Experience\nStaff Engineer");
    }

    #[test]
    fn corrupt_pdf_yields_placeholder() {
        let mut file = tempfile::Builder::new()
            .suffix(".PDF")
            .tempfile()
            .expect("temp file");
        write!(file, "definitely not a pdf").expect("write");

        assert_eq!(load_profile(file.path()), PROFILE_PLACEHOLDER);
    }

    #[test]
    fn empty_profile_yields_placeholder() {
        let file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");

        assert_eq!(load_profile(file.path()), PROFILE_PLACEHOLDER);
    }

    #[test]
    fn pdf_detection_ignores_case() {
        assert!(is_pdf(Path::new("linkedin.PDF")));
        assert!(is_pdf(Path::new("settings/linkedin.pdf")));
        assert!(!is_pdf(Path::new("summary.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }
}
