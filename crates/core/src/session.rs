//! Document sessions: one open, readable document per tab.
//!
//! Opening is a two-step handshake. [`begin_open`] loads the file; when the
//! engine reports it locked the caller gets a [`PendingSession`] and must
//! either authenticate it or cancel it. Neither a wrong password nor a
//! cancelled prompt leaves a session behind.

use crate::error::{EditorError, EditorResult};
use log::{info, warn};
use pdf_engine::{DocumentHandle, OpenSource, PdfEngine, PdfEngineError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSession {
    path: PathBuf,
    handle: DocumentHandle,
    encrypted: bool,
    authenticated: bool,
    page_count: u32,
}

impl DocumentSession {
    fn ready(
        engine: &dyn PdfEngine,
        path: PathBuf,
        handle: DocumentHandle,
        authenticated: bool,
    ) -> EditorResult<Self> {
        let encrypted = engine.is_encrypted(handle)?;
        let page_count = engine.page_count(handle)?;
        info!("opened {} ({page_count} pages, encrypted={encrypted})", path.display());
        Ok(Self { path, handle, encrypted, authenticated, page_count })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> DocumentHandle {
        self.handle
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// True when a password was supplied to open the document.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Tab title.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Releases the engine handle.
    pub fn close(self, engine: &mut dyn PdfEngine) -> EditorResult<()> {
        engine.close(self.handle)?;
        Ok(())
    }
}

/// A loaded document still waiting for its password.
///
/// Dropping it without [`PendingSession::authenticate`] or
/// [`PendingSession::cancel`] leaks the engine handle.
#[must_use]
#[derive(Debug)]
pub struct PendingSession {
    path: PathBuf,
    handle: DocumentHandle,
}

impl PendingSession {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn authenticate(
        self,
        engine: &mut dyn PdfEngine,
        password: &str,
    ) -> EditorResult<DocumentSession> {
        match engine.authenticate(self.handle, password) {
            Ok(()) => DocumentSession::ready(engine, self.path, self.handle, true),
            Err(err) => {
                warn!("authentication failed for {}", self.path.display());
                release(engine, self.handle);
                match err {
                    PdfEngineError::IncorrectPassword => Err(EditorError::IncorrectPassword),
                    other => Err(other.into()),
                }
            }
        }
    }

    pub fn cancel(self, engine: &mut dyn PdfEngine) {
        info!("password prompt cancelled for {}", self.path.display());
        release(engine, self.handle);
    }
}

#[derive(Debug)]
pub enum OpenOutcome {
    Ready(DocumentSession),
    NeedsPassword(PendingSession),
}

/// Closes `handle`, logging instead of failing when the engine refuses.
pub(crate) fn release(engine: &mut dyn PdfEngine, handle: DocumentHandle) {
    if let Err(err) = engine.close(handle) {
        warn!("failed to release handle {}: {err}", handle.raw());
    }
}

pub fn begin_open(engine: &mut dyn PdfEngine, path: &Path) -> EditorResult<OpenOutcome> {
    let handle = engine.open(OpenSource::Path(path.to_path_buf()))?;

    if engine.is_locked(handle)? {
        return Ok(OpenOutcome::NeedsPassword(PendingSession {
            path: path.to_path_buf(),
            handle,
        }));
    }

    let session = DocumentSession::ready(engine, path.to_path_buf(), handle, false);
    if session.is_err() {
        release(engine, handle);
    }
    Ok(OpenOutcome::Ready(session?))
}

/// Non-interactive open: uses `password` if the document asks for one.
pub fn open_document(
    engine: &mut dyn PdfEngine,
    path: &Path,
    password: Option<&str>,
) -> EditorResult<DocumentSession> {
    match begin_open(engine, path)? {
        OpenOutcome::Ready(session) => Ok(session),
        OpenOutcome::NeedsPassword(pending) => match password {
            Some(password) => pending.authenticate(engine, password),
            None => {
                pending.cancel(engine);
                Err(EditorError::PasswordRequired)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_engine::testing::{write_encrypted_sample_pdf, write_sample_pdf};
    use pdf_engine::LopdfEngine;

    #[test]
    fn test_release_tolerates_stale_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.pdf");
        write_sample_pdf(&path, 1).unwrap();

        let mut engine = LopdfEngine::new();
        let session = open_document(&mut engine, &path, None).unwrap();
        let handle = session.handle();
        session.close(&mut engine).unwrap();

        release(&mut engine, handle);
        assert_eq!(engine.open_documents(), 0);
    }

    #[test]
    fn test_plain_document_opens_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.pdf");
        write_sample_pdf(&path, 3).unwrap();

        let mut engine = LopdfEngine::new();
        let OpenOutcome::Ready(session) = begin_open(&mut engine, &path).unwrap() else {
            panic!("plain document should not ask for a password");
        };

        assert_eq!(session.page_count(), 3);
        assert!(!session.is_encrypted());
        assert!(!session.is_authenticated());
        assert_eq!(session.file_name(), "plain.pdf");
    }

    #[test]
    fn test_encrypted_document_needs_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        write_encrypted_sample_pdf(&path, 2, "x").unwrap();

        let mut engine = LopdfEngine::new();
        let OpenOutcome::NeedsPassword(pending) = begin_open(&mut engine, &path).unwrap() else {
            panic!("encrypted document should ask for a password");
        };

        let session = pending.authenticate(&mut engine, "x").unwrap();
        assert!(session.is_encrypted());
        assert!(session.is_authenticated());
        assert_eq!(session.page_count(), 2);
    }

    #[test]
    fn test_wrong_password_leaves_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        write_encrypted_sample_pdf(&path, 1, "x").unwrap();

        let mut engine = LopdfEngine::new();
        let err = open_document(&mut engine, &path, Some("y")).unwrap_err();
        assert!(matches!(err, EditorError::IncorrectPassword));

        let err = open_document(&mut engine, &path, None).unwrap_err();
        assert!(matches!(err, EditorError::PasswordRequired));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LopdfEngine::new();

        let err = open_document(&mut engine, &dir.path().join("nope.pdf"), None).unwrap_err();
        assert!(matches!(err, EditorError::Engine(PdfEngineError::Io(_))));
    }
}
