//! Document operations. Each one builds or re-protects a document through the
//! engine, writes it beside its source and returns the written path; opening
//! the result is left to the caller.

use crate::error::{EditorError, EditorResult};
use crate::naming;
use crate::reorder::PageOrder;
use crate::selection::SelectionPolicy;
use crate::session::{release, DocumentSession};
use log::{error, info};
use pdf_engine::{
    DocumentHandle, Encryption, OpenSource, PageSelection, PdfEngine, PdfEngineError,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Logs the outcome of `operation` and passes the result through.
fn logged(operation: &str, result: EditorResult<PathBuf>) -> EditorResult<PathBuf> {
    match &result {
        Ok(path) => info!("{operation}: wrote {}", path.display()),
        Err(err) => error!("{operation} failed: {err}"),
    }
    result
}

/// Builds a fresh document from `parts` and saves it unencrypted to `output`.
fn assemble(
    engine: &mut dyn PdfEngine,
    output: &Path,
    parts: Vec<(DocumentHandle, PageSelection)>,
) -> EditorResult<()> {
    let target = engine.create();
    let result = parts
        .into_iter()
        .try_for_each(|(source, pages)| engine.insert_pages(target, source, pages))
        .and_then(|()| engine.save(target, output, &Encryption::None));

    release(engine, target);
    Ok(result?)
}

/// Opens a private handle on `path` and checks `password` against it.
fn open_with_current_password(
    engine: &mut dyn PdfEngine,
    path: &Path,
    password: &str,
) -> EditorResult<DocumentHandle> {
    let handle = engine.open(OpenSource::Path(path.to_path_buf()))?;
    match engine.authenticate(handle, password) {
        Ok(()) => Ok(handle),
        Err(err) => {
            release(engine, handle);
            match err {
                PdfEngineError::IncorrectPassword => Err(EditorError::IncorrectCurrentPassword),
                other => Err(other.into()),
            }
        }
    }
}

fn save_and_close(
    engine: &mut dyn PdfEngine,
    handle: DocumentHandle,
    output: &Path,
    encryption: &Encryption,
) -> EditorResult<()> {
    let result = engine.save(handle, output, encryption);
    release(engine, handle);
    Ok(result?)
}

/// Requires at least two open documents before the merge picker is shown.
pub fn check_can_merge(open_documents: usize) -> EditorResult<()> {
    if open_documents < 2 {
        return Err(EditorError::NotEnoughDocuments { open: open_documents });
    }
    Ok(())
}

/// Concatenates every page of `sources`, in order, into `merged.pdf` beside
/// the first source.
pub fn merge(engine: &mut dyn PdfEngine, sources: &[&DocumentSession]) -> EditorResult<PathBuf> {
    let result = SelectionPolicy::Merge.check(sources.len()).and_then(|()| {
        let output = naming::merged_path(sources[0].path());
        let parts =
            sources.iter().map(|session| (session.handle(), PageSelection::All)).collect();
        assemble(engine, &output, parts)?;
        Ok(output)
    });
    logged("merge", result)
}

/// Writes the selected pages, in selection order, to `split.pdf`.
pub fn split(
    engine: &mut dyn PdfEngine,
    session: &DocumentSession,
    pages: &[u32],
) -> EditorResult<PathBuf> {
    let result = SelectionPolicy::Split.check(pages.len()).and_then(|()| {
        let output = naming::split_path(session.path());
        assemble(engine, &output, vec![(session.handle(), PageSelection::Pages(pages.to_vec()))])?;
        Ok(output)
    });
    logged("split", result)
}

/// Writes the pages in `order` to `<stem>_reordered.pdf`.
pub fn rearrange(
    engine: &mut dyn PdfEngine,
    session: &DocumentSession,
    order: &PageOrder,
) -> EditorResult<PathBuf> {
    let result = if order.is_empty() {
        Err(EditorError::NothingToRearrange)
    } else {
        let output = naming::reordered_path(session.path());
        let pages = PageSelection::Pages(order.as_slice().to_vec());
        assemble(engine, &output, vec![(session.handle(), pages)]).map(|()| output)
    };
    logged("rearrange", result)
}

/// Copies the session's file byte for byte to `destination`.
pub fn save_as(session: &DocumentSession, destination: &Path) -> EditorResult<PathBuf> {
    let result = copy_verbatim(session.path(), destination).map(|()| destination.to_path_buf());
    logged("save as", result)
}

fn copy_verbatim(source: &Path, destination: &Path) -> EditorResult<()> {
    // Copying a file onto itself would truncate it.
    if let (Ok(a), Ok(b)) = (fs::canonicalize(source), fs::canonicalize(destination)) {
        if a == b {
            return Ok(());
        }
    }
    fs::copy(source, destination)?;
    Ok(())
}

/// Encrypts an unencrypted document with AES-256, using `password` as both
/// owner and user password, into `<stem>_encrypted.pdf`.
pub fn set_password(
    engine: &mut dyn PdfEngine,
    session: &DocumentSession,
    password: &str,
) -> EditorResult<PathBuf> {
    let result = if password.is_empty() {
        Err(EditorError::EmptyPassword)
    } else if session.is_encrypted() {
        Err(EditorError::AlreadyEncrypted)
    } else {
        let output = naming::encrypted_path(session.path());
        engine
            .save(session.handle(), &output, &Encryption::aes256(password))
            .map(|()| output)
            .map_err(EditorError::from)
    };
    logged("set password", result)
}

/// Re-encrypts `source` with `new_password` into `<stem>_newpassword.pdf`
/// after checking `current_password`.
pub fn change_password(
    engine: &mut dyn PdfEngine,
    source: &Path,
    current_password: &str,
    new_password: &str,
) -> EditorResult<PathBuf> {
    let result = if new_password.is_empty() {
        Err(EditorError::EmptyPassword)
    } else {
        open_with_current_password(engine, source, current_password).and_then(|handle| {
            let output = naming::new_password_path(source);
            save_and_close(engine, handle, &output, &Encryption::aes256(new_password))?;
            Ok(output)
        })
    };
    logged("change password", result)
}

/// Writes an unencrypted copy of `source` to `<stem>_decrypted.pdf` after
/// checking `current_password`.
pub fn decrypt(
    engine: &mut dyn PdfEngine,
    source: &Path,
    current_password: &str,
) -> EditorResult<PathBuf> {
    let result = open_with_current_password(engine, source, current_password).and_then(|handle| {
        let output = naming::decrypted_path(source);
        save_and_close(engine, handle, &output, &Encryption::None)?;
        Ok(output)
    });
    logged("decrypt", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::open_document;
    use pdf_engine::testing::{page_labels_at, write_encrypted_sample_pdf, write_sample_pdf};
    use pdf_engine::LopdfEngine;
    use tempfile::TempDir;

    fn labels(pages: &[u32]) -> Vec<String> {
        pages.iter().map(|page| format!("Page {}", page + 1)).collect()
    }

    struct Fixture {
        dir: TempDir,
        engine: LopdfEngine,
    }

    impl Fixture {
        fn new() -> Self {
            Self { dir: tempfile::tempdir().unwrap(), engine: LopdfEngine::new() }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn open_plain(&mut self, name: &str, pages: usize) -> DocumentSession {
            let path = self.path(name);
            write_sample_pdf(&path, pages).unwrap();
            open_document(&mut self.engine, &path, None).unwrap()
        }

        fn write_locked(&self, name: &str, pages: usize, password: &str) -> PathBuf {
            let path = self.path(name);
            write_encrypted_sample_pdf(&path, pages, password).unwrap();
            path
        }
    }

    #[test]
    fn test_wrong_current_password_releases_private_handle() {
        let mut fx = Fixture::new();
        let source = fx.write_locked("locked.pdf", 1, "secret");

        assert!(decrypt(&mut fx.engine, &source, "nope").is_err());
        assert!(change_password(&mut fx.engine, &source, "nope", "next").is_err());
        assert_eq!(fx.engine.open_documents(), 0);
    }

    #[test]
    fn test_operations_leave_only_their_sources_open() {
        let mut fx = Fixture::new();
        let a = fx.open_plain("a.pdf", 2);
        let b = fx.open_plain("b.pdf", 1);

        merge(&mut fx.engine, &[&a, &b]).unwrap();
        split(&mut fx.engine, &a, &[1]).unwrap();
        let locked = set_password(&mut fx.engine, &b, "pw").unwrap();
        decrypt(&mut fx.engine, &locked, "pw").unwrap();

        assert_eq!(fx.engine.open_documents(), 2);
    }

    #[test]
    fn test_rearrange_follows_permutation() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("report.pdf", 5);
        let mut order = PageOrder::identity(5);
        order.move_item(4, 0);
        order.move_item(4, 3);

        let output = rearrange(&mut fx.engine, &session, &order).unwrap();

        assert_eq!(output, fx.path("report_reordered.pdf"));
        assert_eq!(page_labels_at(&output, None).unwrap(), labels(&[4, 0, 1, 3, 2]));
    }

    #[test]
    fn test_rearrange_empty_order_writes_nothing() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("report.pdf", 1);

        let err = rearrange(&mut fx.engine, &session, &PageOrder::identity(0)).unwrap_err();
        assert!(matches!(err, EditorError::NothingToRearrange));
        assert!(!fx.path("report_reordered.pdf").exists());
    }

    #[test]
    fn test_split_keeps_selection_order() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("report.pdf", 5);

        let output = split(&mut fx.engine, &session, &[2, 0]).unwrap();

        assert_eq!(output, fx.path("split.pdf"));
        assert_eq!(page_labels_at(&output, None).unwrap(), labels(&[2, 0]));
    }

    #[test]
    fn test_split_requires_a_page() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("report.pdf", 3);

        let err = split(&mut fx.engine, &session, &[]).unwrap_err();
        assert!(matches!(
            err,
            EditorError::InsufficientSelection { policy: SelectionPolicy::Split, selected: 0 }
        ));
        assert!(!fx.path("split.pdf").exists());
    }

    #[test]
    fn test_merge_concatenates_in_selection_order() {
        let mut fx = Fixture::new();
        let first = fx.open_plain("a.pdf", 2);
        let second = fx.open_plain("b.pdf", 3);

        let output = merge(&mut fx.engine, &[&second, &first]).unwrap();

        assert_eq!(output, fx.path("merged.pdf"));
        assert_eq!(page_labels_at(&output, None).unwrap(), labels(&[0, 1, 2, 0, 1]));
    }

    #[test]
    fn test_merge_allows_same_document_twice() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("a.pdf", 2);

        let output = merge(&mut fx.engine, &[&session, &session]).unwrap();
        assert_eq!(page_labels_at(&output, None).unwrap().len(), 4);
    }

    #[test]
    fn test_merge_requires_two_sources() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("a.pdf", 2);

        assert!(matches!(
            merge(&mut fx.engine, &[&session]),
            Err(EditorError::InsufficientSelection { policy: SelectionPolicy::Merge, selected: 1 })
        ));
        assert!(matches!(check_can_merge(1), Err(EditorError::NotEnoughDocuments { open: 1 })));
        assert!(check_can_merge(2).is_ok());
    }

    #[test]
    fn test_save_as_copies_bytes() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("a.pdf", 2);
        let destination = fx.path("copy.pdf");

        save_as(&session, &destination).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), fs::read(session.path()).unwrap());

        save_as(&session, session.path()).unwrap();
        assert_eq!(fs::read(session.path()).unwrap(), fs::read(&destination).unwrap());
    }

    #[test]
    fn test_set_password_then_open() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("a.pdf", 2);

        let output = set_password(&mut fx.engine, &session, "x").unwrap();
        assert_eq!(output, fx.path("a_encrypted.pdf"));

        let reopened = open_document(&mut fx.engine, &output, Some("x")).unwrap();
        assert!(reopened.is_encrypted());
        assert!(matches!(
            open_document(&mut fx.engine, &output, Some("y")),
            Err(EditorError::IncorrectPassword)
        ));
        assert!(matches!(
            set_password(&mut fx.engine, &reopened, "z"),
            Err(EditorError::AlreadyEncrypted)
        ));
    }

    #[test]
    fn test_set_password_rejects_empty() {
        let mut fx = Fixture::new();
        let session = fx.open_plain("a.pdf", 1);

        assert!(matches!(
            set_password(&mut fx.engine, &session, ""),
            Err(EditorError::EmptyPassword)
        ));
        assert!(!fx.path("a_encrypted.pdf").exists());
    }

    #[test]
    fn test_change_password_swaps_passwords() {
        let mut fx = Fixture::new();
        let source = fx.write_locked("a.pdf", 3, "old");

        let output = change_password(&mut fx.engine, &source, "old", "new").unwrap();
        assert_eq!(output, fx.path("a_newpassword.pdf"));

        assert!(open_document(&mut fx.engine, &output, Some("old")).is_err());
        let session = open_document(&mut fx.engine, &output, Some("new")).unwrap();
        assert_eq!(session.page_count(), 3);
    }

    #[test]
    fn test_change_password_with_wrong_current_password() {
        let mut fx = Fixture::new();
        let source = fx.write_locked("a.pdf", 1, "old");

        let err = change_password(&mut fx.engine, &source, "nope", "new").unwrap_err();
        assert!(matches!(err, EditorError::IncorrectCurrentPassword));
        assert!(!fx.path("a_newpassword.pdf").exists());
    }

    #[test]
    fn test_decrypt_yields_plain_copy() {
        let mut fx = Fixture::new();
        let source = fx.write_locked("a.pdf", 2, "x");

        let output = decrypt(&mut fx.engine, &source, "x").unwrap();
        assert_eq!(output, fx.path("a_decrypted.pdf"));

        let session = open_document(&mut fx.engine, &output, None).unwrap();
        assert!(!session.is_encrypted());
        assert_eq!(page_labels_at(&output, None).unwrap(), labels(&[0, 1]));
    }

    #[test]
    fn test_decrypt_with_wrong_password() {
        let mut fx = Fixture::new();
        let source = fx.write_locked("a.pdf", 2, "x");

        assert!(matches!(
            decrypt(&mut fx.engine, &source, "y"),
            Err(EditorError::IncorrectCurrentPassword)
        ));
    }
}
