//! Side-effecting collaborators the wizard hands finished artifacts to.
//!
//! The wizard only sees the traits. Production wiring writes into
//! directories; tests use the in-memory variants and inspect what arrived.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::info;

use crate::artifacts::message::single_line;
use crate::artifacts::MailDraft;

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("mail handoff failed: {0}")]
    Mail(String),
    #[error("document rendering failed: {0}")]
    Render(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("could not save `{filename}`: {source}")]
    Save {
        filename: String,
        #[source]
        source: io::Error,
    },
}

/// Delivers a composed message to whatever mail client or outbox is wired in.
pub trait MailComposer: Send + Sync {
    fn compose(&self, draft: &MailDraft) -> Result<(), HandoffError>;
}

/// Writes each draft as `<reference>.eml` into an outbox directory.
#[derive(Clone, Debug)]
pub struct OutboxMailComposer {
    dir: PathBuf,
}

impl OutboxMailComposer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MailComposer for OutboxMailComposer {
    fn compose(&self, draft: &MailDraft) -> Result<(), HandoffError> {
        fs::create_dir_all(&self.dir).map_err(|error| {
            HandoffError::Mail(format!("outbox `{}` unavailable: {error}", self.dir.display()))
        })?;

        let path = self.dir.join(format!("{}.eml", draft.reference));
        let message = format!(
            "To: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            single_line(&draft.recipient),
            single_line(&draft.subject),
            draft.body
        );
        fs::write(&path, message).map_err(|error| {
            HandoffError::Mail(format!("could not write `{}`: {error}", path.display()))
        })?;

        info!(
            event_name = "artifact.mail.composed",
            reference = %draft.reference,
            path = %path.display(),
            "quote message written to outbox"
        );
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryMailComposer {
    drafts: Arc<Mutex<Vec<MailDraft>>>,
    fail_with: Option<String>,
}

impl InMemoryMailComposer {
    /// A composer that rejects every draft, for exercising the failure path.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self { drafts: Arc::default(), fail_with: Some(reason.into()) }
    }

    pub fn drafts(&self) -> Vec<MailDraft> {
        match self.drafts.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl MailComposer for InMemoryMailComposer {
    fn compose(&self, draft: &MailDraft) -> Result<(), HandoffError> {
        if let Some(reason) = &self.fail_with {
            return Err(HandoffError::Mail(reason.clone()));
        }
        match self.drafts.lock() {
            Ok(mut guard) => guard.push(draft.clone()),
            Err(poisoned) => poisoned.into_inner().push(draft.clone()),
        }
        Ok(())
    }
}

/// Persists a generated file and reports where it ended up.
pub trait FileSink: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, HandoffError>;
}

#[derive(Clone, Debug)]
pub struct DirectoryFileSink {
    dir: PathBuf,
}

impl DirectoryFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectoryFileSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, HandoffError> {
        let path = self.dir.join(filename);
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, bytes))
            .map_err(|source| HandoffError::Save { filename: filename.to_string(), source })?;
        Ok(path.display().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryFileSink {
    files: Arc<Mutex<Vec<SavedFile>>>,
}

impl InMemoryFileSink {
    pub fn files(&self) -> Vec<SavedFile> {
        match self.files.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FileSink for InMemoryFileSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, HandoffError> {
        let saved = SavedFile { filename: filename.to_string(), bytes: bytes.to_vec() };
        match self.files.lock() {
            Ok(mut guard) => guard.push(saved),
            Err(poisoned) => poisoned.into_inner().push(saved),
        }
        Ok(format!("memory://{filename}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{
        DirectoryFileSink, FileSink, HandoffError, InMemoryFileSink, InMemoryMailComposer,
        MailComposer, OutboxMailComposer,
    };
    use crate::artifacts::MailDraft;

    fn draft() -> MailDraft {
        MailDraft {
            reference: "WRH-000042".to_string(),
            recipient: "hi@wrh.ae".to_string(),
            subject: "New quote request - Ana - Product Photography".to_string(),
            body: "ESTIMATED TOTAL: AED 800 - 1,500\n".to_string(),
        }
    }

    #[test]
    fn outbox_writes_one_eml_per_reference() {
        let temp = TempDir::new().expect("temp dir");
        let outbox = OutboxMailComposer::new(temp.path().join("outbox"));

        outbox.compose(&draft()).expect("compose");

        let written = std::fs::read_to_string(temp.path().join("outbox/WRH-000042.eml"))
            .expect("eml written");
        assert!(written.starts_with("To: hi@wrh.ae\r\n"));
        assert!(written.contains("Subject: New quote request - Ana - Product Photography"));
        assert!(written.ends_with("ESTIMATED TOTAL: AED 800 - 1,500\n"));
    }

    #[test]
    fn outbox_headers_cannot_be_split_by_line_breaks() {
        let temp = TempDir::new().expect("temp dir");
        let outbox = OutboxMailComposer::new(temp.path());
        let draft = MailDraft {
            subject: "New quote request - Eve\r\nBcc: attacker@evil.test - Event Photography"
                .to_string(),
            ..draft()
        };

        outbox.compose(&draft).expect("compose");

        let written =
            std::fs::read_to_string(temp.path().join("WRH-000042.eml")).expect("eml written");
        let (headers, _) = written.split_once("\r\n\r\n").expect("header block");
        assert_eq!(headers.lines().count(), 3);
        assert!(!written.contains("\r\nBcc: attacker"));
        assert!(headers.contains("Subject: New quote request - Eve Bcc: attacker@evil.test"));
    }

    #[test]
    fn in_memory_composer_records_or_rejects() {
        let composer = InMemoryMailComposer::default();
        composer.compose(&draft()).expect("compose");
        assert_eq!(composer.drafts(), vec![draft()]);

        let failing = InMemoryMailComposer::failing("no mail client");
        assert!(matches!(failing.compose(&draft()), Err(HandoffError::Mail(_))));
        assert!(failing.drafts().is_empty());
    }

    #[test]
    fn directory_sink_creates_missing_directories() {
        let temp = TempDir::new().expect("temp dir");
        let sink = DirectoryFileSink::new(temp.path().join("quotes/2026"));

        let location = sink.save("Quote_WRH-1_Ana.html", b"<html></html>").expect("save");

        assert!(location.ends_with("Quote_WRH-1_Ana.html"));
        assert_eq!(
            std::fs::read(temp.path().join("quotes/2026/Quote_WRH-1_Ana.html")).expect("read"),
            b"<html></html>"
        );
    }

    #[test]
    fn in_memory_sink_keeps_bytes() {
        let sink = InMemoryFileSink::default();
        let location = sink.save("a.pdf", &[1, 2, 3]).expect("save");
        assert_eq!(location, "memory://a.pdf");
        assert_eq!(sink.files()[0].bytes, vec![1, 2, 3]);
    }
}
