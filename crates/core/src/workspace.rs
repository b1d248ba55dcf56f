//! Open tabs and which one is active.

use crate::error::EditorResult;
use crate::session::DocumentSession;
use crate::viewer::ViewerModel;
use log::info;
use pdf_engine::{DocumentHandle, PdfEngine};

#[derive(Debug, Clone)]
pub struct DocumentTab {
    pub session: DocumentSession,
    pub viewer: ViewerModel,
}

impl DocumentTab {
    pub fn new(session: DocumentSession, viewer: ViewerModel) -> Self {
        Self { session, viewer }
    }

    pub fn title(&self) -> String {
        self.session.file_name()
    }
}

#[derive(Debug, Default)]
pub struct Workspace {
    tabs: Vec<DocumentTab>,
    active: Option<usize>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tab and makes it active. Returns its index.
    pub fn add(&mut self, tab: DocumentTab) -> usize {
        self.tabs.push(tab);
        let index = self.tabs.len() - 1;
        self.active = Some(index);
        index
    }

    /// Closes the tab at `index` and releases its engine handle.
    pub fn close(&mut self, index: usize, engine: &mut dyn PdfEngine) -> EditorResult<()> {
        if index >= self.tabs.len() {
            return Ok(());
        }

        let tab = self.tabs.remove(index);
        info!("closing {}", tab.session.path().display());

        self.active = match self.active {
            _ if self.tabs.is_empty() => None,
            Some(active) if active > index => Some(active - 1),
            Some(active) if active == index => Some(index.min(self.tabs.len() - 1)),
            other => other,
        };

        tab.session.close(engine)
    }

    /// Closes every tab, releasing their handles.
    pub fn close_all(&mut self, engine: &mut dyn PdfEngine) {
        while !self.tabs.is_empty() {
            if let Err(err) = self.close(self.tabs.len() - 1, engine) {
                log::warn!("failed to close tab: {err}");
            }
        }
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = Some(index);
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&DocumentTab> {
        self.active.and_then(|index| self.tabs.get(index))
    }

    pub fn active_mut(&mut self) -> Option<&mut DocumentTab> {
        self.active.and_then(|index| self.tabs.get_mut(index))
    }

    pub fn tabs(&self) -> &[DocumentTab] {
        &self.tabs
    }

    pub fn tab(&self, index: usize) -> Option<&DocumentTab> {
        self.tabs.get(index)
    }

    /// The session opened under `handle`. Stays valid while other tabs close.
    pub fn session(&self, handle: DocumentHandle) -> Option<&DocumentSession> {
        self.tabs.iter().map(|tab| &tab.session).find(|session| session.handle() == handle)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::open_document;
    use pdf_engine::testing::write_sample_pdf;
    use pdf_engine::{LopdfEngine, PdfEngineError};

    fn open_tab(engine: &mut LopdfEngine, dir: &tempfile::TempDir, name: &str) -> DocumentTab {
        let path = dir.path().join(name);
        write_sample_pdf(&path, 2).unwrap();
        let session = open_document(engine, &path, None).unwrap();
        let viewer = ViewerModel::load(engine, &session).unwrap();
        DocumentTab::new(session, viewer)
    }

    #[test]
    fn test_new_tab_becomes_active() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LopdfEngine::new();
        let mut workspace = Workspace::new();
        assert!(workspace.active().is_none());

        workspace.add(open_tab(&mut engine, &dir, "a.pdf"));
        workspace.add(open_tab(&mut engine, &dir, "b.pdf"));

        assert_eq!(workspace.len(), 2);
        assert_eq!(workspace.active_index(), Some(1));
        assert_eq!(workspace.active().unwrap().title(), "b.pdf");
    }

    #[test]
    fn test_close_releases_handle_and_adjusts_active() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LopdfEngine::new();
        let mut workspace = Workspace::new();
        workspace.add(open_tab(&mut engine, &dir, "a.pdf"));
        workspace.add(open_tab(&mut engine, &dir, "b.pdf"));
        workspace.add(open_tab(&mut engine, &dir, "c.pdf"));
        workspace.set_active(2);

        let handle = workspace.tab(0).unwrap().session.handle();
        workspace.close(0, &mut engine).unwrap();

        assert!(matches!(engine.page_count(handle), Err(PdfEngineError::InvalidHandle(_))));
        assert_eq!(workspace.active_index(), Some(1));
        assert_eq!(workspace.active().unwrap().title(), "c.pdf");
    }

    #[test]
    fn test_closing_last_tab_clears_active() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LopdfEngine::new();
        let mut workspace = Workspace::new();
        workspace.add(open_tab(&mut engine, &dir, "a.pdf"));

        workspace.close(0, &mut engine).unwrap();
        assert!(workspace.is_empty());
        assert!(workspace.active().is_none());
    }

    #[test]
    fn test_closing_active_tab_selects_neighbour() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LopdfEngine::new();
        let mut workspace = Workspace::new();
        workspace.add(open_tab(&mut engine, &dir, "a.pdf"));
        workspace.add(open_tab(&mut engine, &dir, "b.pdf"));

        workspace.close(1, &mut engine).unwrap();
        assert_eq!(workspace.active().unwrap().title(), "a.pdf");

        workspace.close_all(&mut engine);
        assert!(workspace.is_empty());
    }

    #[test]
    fn test_session_lookup_survives_closing_other_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LopdfEngine::new();
        let mut workspace = Workspace::new();
        workspace.add(open_tab(&mut engine, &dir, "a.pdf"));
        workspace.add(open_tab(&mut engine, &dir, "b.pdf"));
        workspace.add(open_tab(&mut engine, &dir, "c.pdf"));
        let a = workspace.tab(0).unwrap().session.handle();
        let b = workspace.tab(1).unwrap().session.handle();
        let c = workspace.tab(2).unwrap().session.handle();

        workspace.close(1, &mut engine).unwrap();

        assert!(workspace.session(b).is_none());
        assert_eq!(workspace.session(c).unwrap().file_name(), "c.pdf");
        assert_eq!(workspace.session(a).unwrap().file_name(), "a.pdf");
    }
}
