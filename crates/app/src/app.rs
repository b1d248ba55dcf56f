//! Main window: menu, tabs and the modal flow around each document operation.

use crate::dialogs::{
    DialogOutcome, EncryptionOptionsDialog, MessageDialog, PasswordDialog, PickerDialog,
    RearrangeDialog, Severity,
};
use crate::viewer::{self, PageTextures};
use eframe::egui;
use log::{error, info};
use pdf_editor_core::viewer::{first_page_preview, page_previews};
use pdf_editor_core::{
    begin_open, encrypt_action, operations, DocumentSession, DocumentTab, EditorError,
    EditorResult, EncryptAction, EncryptionChoice, OpenOutcome, PageOrder, PendingSession,
    ViewerModel, Workspace,
};
use pdf_engine::{DocumentHandle, PdfEngine};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

const OPEN_SHORTCUT: egui::KeyboardShortcut =
    egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::O);

#[derive(Clone, Copy, PartialEq)]
enum MenuAction {
    Open,
    SaveAs,
    Merge,
    Split,
    Encrypt,
    Rearrange,
}

/// What a password prompt is for, and which document it acts on.
enum PasswordPurpose {
    Unlock(PendingSession),
    SetPassword(DocumentHandle),
    CurrentForChange(PathBuf),
    NewForChange { source: PathBuf, current: String },
    CurrentForDecrypt(PathBuf),
}

/// The open dialog. Each one carries the document(s) it was started on, so
/// accepting it never depends on which tab is active by then.
enum Modal {
    None,
    Password(PasswordDialog, PasswordPurpose),
    Rearrange(RearrangeDialog, DocumentHandle),
    Split(PickerDialog<u32>, DocumentHandle),
    Merge(PickerDialog<DocumentHandle>),
    EncryptionOptions(EncryptionOptionsDialog, PathBuf),
}

pub struct PdfEditorApp {
    engine: Box<dyn PdfEngine>,
    workspace: Workspace,
    textures: HashMap<DocumentHandle, PageTextures>,
    modal: Modal,
    /// Shown before any other modal.
    message: Option<MessageDialog>,
    open_queue: VecDeque<PathBuf>,
}

impl PdfEditorApp {
    pub fn new(engine: Box<dyn PdfEngine>, files: Vec<PathBuf>) -> Self {
        Self {
            engine,
            workspace: Workspace::new(),
            textures: HashMap::new(),
            modal: Modal::None,
            message: None,
            open_queue: files.into(),
        }
    }

    /// Tabs, zoom and menus only react while no dialog is showing.
    fn accepts_input(&self) -> bool {
        self.message.is_none() && matches!(self.modal, Modal::None)
    }

    fn show_message(&mut self, severity: Severity, message: impl Into<String>) {
        self.message = Some(MessageDialog::new(severity, message));
    }

    fn show_error(&mut self, err: &EditorError) {
        error!("{err}");
        self.show_message(Severity::Error, err.to_string());
    }

    fn active_session(&self) -> Option<&DocumentSession> {
        self.workspace.active().map(|tab| &tab.session)
    }

    fn open_file_dialog(&mut self) {
        if let Some(paths) = rfd::FileDialog::new().add_filter("PDF", &["pdf"]).pick_files() {
            self.open_queue.extend(paths);
        }
    }

    /// Opens the next queued file once no dialog is showing.
    fn drain_open_queue(&mut self, ctx: &egui::Context) {
        while self.accepts_input() {
            let Some(path) = self.open_queue.pop_front() else { break };
            self.open_path(ctx, path);
        }
    }

    fn open_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        match begin_open(self.engine.as_mut(), &path) {
            Ok(OpenOutcome::Ready(session)) => self.add_tab(ctx, session),
            Ok(OpenOutcome::NeedsPassword(pending)) => {
                let prompt = format!("Enter the password for {}:", path.display());
                self.modal = Modal::Password(
                    PasswordDialog::new("Password Required", prompt),
                    PasswordPurpose::Unlock(pending),
                );
            }
            Err(err) => self.show_error(&err),
        }
    }

    fn add_tab(&mut self, ctx: &egui::Context, session: DocumentSession) {
        match ViewerModel::load(self.engine.as_ref(), &session) {
            Ok(viewer) => {
                let tab = DocumentTab::new(session, viewer);
                self.textures.insert(tab.session.handle(), PageTextures::upload(ctx, &tab));
                self.workspace.add(tab);
            }
            Err(err) => {
                if let Err(close_err) = session.close(self.engine.as_mut()) {
                    error!("failed to release document: {close_err}");
                }
                self.show_error(&err);
            }
        }
    }

    fn close_tab(&mut self, index: usize) {
        if let Some(tab) = self.workspace.tab(index) {
            self.textures.remove(&tab.session.handle());
        }
        if let Err(err) = self.workspace.close(index, self.engine.as_mut()) {
            self.show_error(&err);
        }
    }

    /// Reports the outcome of an operation and opens the file it wrote.
    fn finish_operation(&mut self, what: &str, result: EditorResult<PathBuf>) {
        match result {
            Ok(path) => {
                self.show_message(
                    Severity::Info,
                    format!("{what} saved as {}", path.display()),
                );
                self.open_queue.push_back(path);
            }
            Err(err) => self.show_error(&err),
        }
    }

    fn set_zoom(&mut self, ctx: &egui::Context, zoom: pdf_editor_core::ZoomLevel) {
        let Some(tab) = self.workspace.active_mut() else { return };
        match tab.viewer.set_zoom(self.engine.as_ref(), &tab.session, zoom) {
            Ok(true) => {
                let textures = PageTextures::upload(ctx, tab);
                self.textures.insert(tab.session.handle(), textures);
            }
            Ok(false) => {}
            Err(err) => self.show_error(&err),
        }
    }
}

// Menu actions
impl PdfEditorApp {
    fn run_action(&mut self, ctx: &egui::Context, action: MenuAction) {
        match action {
            MenuAction::Open => self.open_file_dialog(),
            MenuAction::SaveAs => self.save_as(),
            MenuAction::Merge => self.start_merge(ctx),
            MenuAction::Split => self.start_split(ctx),
            MenuAction::Encrypt => self.start_encrypt(),
            MenuAction::Rearrange => self.start_rearrange(ctx),
        }
    }

    fn save_as(&mut self) {
        let Some(session) = self.active_session() else { return };
        let Some(destination) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_file_name(session.file_name())
            .save_file()
        else {
            return;
        };

        match operations::save_as(session, &destination) {
            Ok(path) => self.show_message(Severity::Info, format!("Saved as {}", path.display())),
            Err(err) => self.show_error(&err),
        }
    }

    fn start_merge(&mut self, ctx: &egui::Context) {
        if let Err(err) = operations::check_can_merge(self.workspace.len()) {
            self.show_error(&err);
            return;
        }

        let candidates: EditorResult<Vec<_>> = self
            .workspace
            .tabs()
            .iter()
            .map(|tab| {
                first_page_preview(self.engine.as_ref(), &tab.session)
                    .map(|preview| (tab.session.handle(), tab.title(), preview))
            })
            .collect();
        match candidates {
            Ok(candidates) => {
                self.modal = Modal::Merge(PickerDialog::new(ctx, "Merge PDFs", candidates));
            }
            Err(err) => self.show_error(&err),
        }
    }

    fn start_split(&mut self, ctx: &egui::Context) {
        let Some(session) = self.active_session() else { return };
        let target = session.handle();
        match page_previews(self.engine.as_ref(), session) {
            Ok(previews) => {
                let candidates = previews
                    .into_iter()
                    .enumerate()
                    .map(|(page, image)| (page as u32, format!("Page {}", page + 1), Some(image)))
                    .collect();
                let dialog = PickerDialog::new(ctx, "Split PDF", candidates);
                self.modal = Modal::Split(dialog, target);
            }
            Err(err) => self.show_error(&err),
        }
    }

    fn start_encrypt(&mut self) {
        let Some(session) = self.active_session() else { return };
        let (target, source) = (session.handle(), session.path().to_path_buf());
        match encrypt_action(session) {
            EncryptAction::SetPassword => {
                self.modal = Modal::Password(
                    PasswordDialog::new("Encrypt PDF", "Enter a password:"),
                    PasswordPurpose::SetPassword(target),
                );
            }
            EncryptAction::AlreadyEncrypted => {
                self.show_message(Severity::Info, EditorError::AlreadyEncrypted.to_string());
                self.modal =
                    Modal::EncryptionOptions(EncryptionOptionsDialog::default(), source);
            }
        }
    }

    fn start_rearrange(&mut self, ctx: &egui::Context) {
        let Some(session) = self.active_session() else { return };
        if session.page_count() == 0 {
            self.show_error(&EditorError::NothingToRearrange);
            return;
        }
        let target = session.handle();
        match page_previews(self.engine.as_ref(), session) {
            Ok(previews) => {
                self.modal = Modal::Rearrange(RearrangeDialog::new(ctx, previews), target);
            }
            Err(err) => self.show_error(&err),
        }
    }
}

// Accepted dialogs
impl PdfEditorApp {
    fn rearrange_document(&mut self, target: DocumentHandle, order: &PageOrder) {
        let Some(session) = self.workspace.session(target) else { return };
        let result = operations::rearrange(self.engine.as_mut(), session, order);
        self.finish_operation("Rearranged PDF", result);
    }

    fn split_document(&mut self, target: DocumentHandle, pages: &[u32]) {
        let Some(session) = self.workspace.session(target) else { return };
        let result = operations::split(self.engine.as_mut(), session, pages);
        self.finish_operation("Split PDF", result);
    }

    fn merge_documents(&mut self, sources: &[DocumentHandle]) {
        let sessions: Vec<&DocumentSession> =
            sources.iter().filter_map(|&handle| self.workspace.session(handle)).collect();
        let result = operations::merge(self.engine.as_mut(), &sessions);
        self.finish_operation("Merged PDF", result);
    }

    fn set_password(&mut self, target: DocumentHandle, password: &str) {
        let Some(session) = self.workspace.session(target) else { return };
        let result = operations::set_password(self.engine.as_mut(), session, password);
        self.finish_operation("Encrypted PDF", result);
    }
}

// Modal outcomes
impl PdfEditorApp {
    fn draw_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = &self.message {
            if message.show(ctx) {
                self.message = None;
            }
            return;
        }

        match std::mem::replace(&mut self.modal, Modal::None) {
            Modal::None => {}
            Modal::Password(mut dialog, purpose) => match dialog.show(ctx) {
                DialogOutcome::Open => self.modal = Modal::Password(dialog, purpose),
                DialogOutcome::Accepted(password) => self.password_entered(ctx, purpose, password),
                DialogOutcome::Rejected => {
                    if let PasswordPurpose::Unlock(pending) = purpose {
                        pending.cancel(self.engine.as_mut());
                    }
                }
            },
            Modal::Rearrange(mut dialog, target) => match dialog.show(ctx) {
                DialogOutcome::Open => self.modal = Modal::Rearrange(dialog, target),
                DialogOutcome::Accepted(order) => self.rearrange_document(target, &order),
                DialogOutcome::Rejected => {}
            },
            Modal::Split(mut dialog, target) => match dialog.show(ctx) {
                DialogOutcome::Open => self.modal = Modal::Split(dialog, target),
                DialogOutcome::Accepted(pages) => self.split_document(target, &pages),
                DialogOutcome::Rejected => {}
            },
            Modal::Merge(mut dialog) => match dialog.show(ctx) {
                DialogOutcome::Open => self.modal = Modal::Merge(dialog),
                DialogOutcome::Accepted(sources) => self.merge_documents(&sources),
                DialogOutcome::Rejected => {}
            },
            Modal::EncryptionOptions(mut dialog, source) => match dialog.show(ctx) {
                DialogOutcome::Open => self.modal = Modal::EncryptionOptions(dialog, source),
                DialogOutcome::Accepted(Some(EncryptionChoice::ChangePassword)) => {
                    self.modal = Modal::Password(
                        PasswordDialog::new("Change Password", "Enter the current password:"),
                        PasswordPurpose::CurrentForChange(source),
                    );
                }
                DialogOutcome::Accepted(Some(EncryptionChoice::Decrypt)) => {
                    self.modal = Modal::Password(
                        PasswordDialog::new("Decrypt PDF", "Enter the current password:"),
                        PasswordPurpose::CurrentForDecrypt(source),
                    );
                }
                DialogOutcome::Accepted(None) | DialogOutcome::Rejected => {}
            },
        }
    }

    fn password_entered(&mut self, ctx: &egui::Context, purpose: PasswordPurpose, password: String) {
        match purpose {
            PasswordPurpose::Unlock(pending) => {
                match pending.authenticate(self.engine.as_mut(), &password) {
                    Ok(session) => self.add_tab(ctx, session),
                    Err(err) => self.show_error(&err),
                }
            }
            PasswordPurpose::SetPassword(target) => {
                if !password.is_empty() {
                    self.set_password(target, &password);
                }
            }
            PasswordPurpose::CurrentForChange(source) => {
                self.modal = Modal::Password(
                    PasswordDialog::new("Change Password", "Enter the new password:"),
                    PasswordPurpose::NewForChange { source, current: password },
                );
            }
            PasswordPurpose::NewForChange { source, current } => {
                if password.is_empty() {
                    return;
                }
                let result =
                    operations::change_password(self.engine.as_mut(), &source, &current, &password);
                self.finish_operation("PDF with new password", result);
            }
            PasswordPurpose::CurrentForDecrypt(source) => {
                let result = operations::decrypt(self.engine.as_mut(), &source, &password);
                self.finish_operation("Decrypted PDF", result);
            }
        }
    }
}

// Drawing
impl PdfEditorApp {
    fn draw_menu(&mut self, ctx: &egui::Context) -> Option<MenuAction> {
        let has_document = !self.workspace.is_empty();
        let mut action = None;

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let open = egui::Button::new("Open").shortcut_text(ctx.format_shortcut(&OPEN_SHORTCUT));
                    if ui.add(open).clicked() {
                        action = Some(MenuAction::Open);
                        ui.close_menu();
                    }
                    if ui.add_enabled(has_document, egui::Button::new("Save As")).clicked() {
                        action = Some(MenuAction::SaveAs);
                        ui.close_menu();
                    }
                });
                ui.menu_button("Tools", |ui| {
                    for (label, item) in [
                        ("Merge PDFs", MenuAction::Merge),
                        ("Split PDF", MenuAction::Split),
                        ("Encrypt PDF", MenuAction::Encrypt),
                        ("Rearrange Pages", MenuAction::Rearrange),
                    ] {
                        if ui.add_enabled(has_document, egui::Button::new(label)).clicked() {
                            action = Some(item);
                            ui.close_menu();
                        }
                    }
                });
            });
        });

        action
    }

    fn draw_tabs(&mut self, ctx: &egui::Context, interactive: bool) {
        if self.workspace.is_empty() {
            return;
        }

        let mut select = None;
        let mut close = None;
        egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
            ui.add_enabled_ui(interactive, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for (index, tab) in self.workspace.tabs().iter().enumerate() {
                        let active = self.workspace.active_index() == Some(index);
                        if ui.selectable_label(active, tab.title()).clicked() {
                            select = Some(index);
                        }
                        if ui.small_button("✕").on_hover_text("Close tab").clicked() {
                            close = Some(index);
                        }
                        ui.separator();
                    }
                });
            });
        });

        if !interactive {
            return;
        }
        if let Some(index) = select {
            self.workspace.set_active(index);
        }
        if let Some(index) = close {
            self.close_tab(index);
        }
    }

    fn draw_document(&mut self, ctx: &egui::Context, interactive: bool) {
        let Some(tab) = self.workspace.active() else {
            egui::CentralPanel::default().show(ctx, viewer::draw_welcome);
            return;
        };

        let handle = tab.session.handle();
        if self.textures.get(&handle).map_or(true, |textures| textures.is_stale(tab)) {
            self.textures.insert(handle, PageTextures::upload(ctx, tab));
        }

        let mut requested_zoom = None;
        egui::SidePanel::right("properties").resizable(true).min_width(240.0).show(ctx, |ui| {
            ui.add_enabled_ui(interactive, |ui| {
                requested_zoom = viewer::draw_properties(ui, tab);
            });
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(textures) = self.textures.get(&handle) {
                viewer::draw_pages(ui, textures);
            }
        });

        if let Some(zoom) = requested_zoom {
            self.set_zoom(ctx, zoom);
        }
    }
}

impl eframe::App for PdfEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_open_queue(ctx);

        let interactive = self.accepts_input();
        let mut action = self.draw_menu(ctx);
        if interactive && ctx.input_mut(|i| i.consume_shortcut(&OPEN_SHORTCUT)) {
            action = Some(MenuAction::Open);
        }

        self.draw_tabs(ctx, interactive);
        self.draw_document(ctx, interactive);
        self.draw_modal(ctx);

        if let Some(action) = action.filter(|_| interactive) {
            info!("menu action: {}", action_name(action));
            self.run_action(ctx, action);
        }
    }
}

impl Drop for PdfEditorApp {
    fn drop(&mut self) {
        self.workspace.close_all(self.engine.as_mut());
    }
}

fn action_name(action: MenuAction) -> &'static str {
    match action {
        MenuAction::Open => "open",
        MenuAction::SaveAs => "save as",
        MenuAction::Merge => "merge",
        MenuAction::Split => "split",
        MenuAction::Encrypt => "encrypt",
        MenuAction::Rearrange => "rearrange",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_engine::testing::{page_labels_at, write_sample_pdf};
    use pdf_engine::LopdfEngine;
    use std::path::Path;

    fn open_sample(app: &mut PdfEditorApp, ctx: &egui::Context, path: &Path, pages: usize) {
        write_sample_pdf(path, pages).unwrap();
        app.open_path(ctx, path.to_path_buf());
    }

    fn handle_of(app: &PdfEditorApp, index: usize) -> DocumentHandle {
        app.workspace.tab(index).unwrap().session.handle()
    }

    #[test]
    fn test_dialogs_block_tab_and_zoom_input() {
        let mut app = PdfEditorApp::new(Box::new(LopdfEngine::new()), Vec::new());
        assert!(app.accepts_input());

        app.show_message(Severity::Info, "Saved");
        assert!(!app.accepts_input());

        app.message = None;
        app.modal = Modal::EncryptionOptions(EncryptionOptionsDialog::default(), PathBuf::new());
        assert!(!app.accepts_input());
    }

    #[test]
    fn test_split_targets_the_tab_it_started_on() {
        let ctx = egui::Context::default();
        let dir = tempfile::tempdir().unwrap();
        let mut app = PdfEditorApp::new(Box::new(LopdfEngine::new()), Vec::new());
        open_sample(&mut app, &ctx, &dir.path().join("a.pdf"), 5);
        let b_dir = dir.path().join("b");
        std::fs::create_dir(&b_dir).unwrap();
        open_sample(&mut app, &ctx, &b_dir.join("b.pdf"), 2);
        let target = handle_of(&app, 0);

        app.workspace.set_active(1);
        app.split_document(target, &[4, 3]);

        let labels = page_labels_at(&dir.path().join("split.pdf"), None).unwrap();
        assert_eq!(labels, ["Page 5", "Page 4"]);
        assert!(!b_dir.join("split.pdf").exists());
    }

    #[test]
    fn test_merge_follows_documents_after_a_tab_closes() {
        let ctx = egui::Context::default();
        let dir = tempfile::tempdir().unwrap();
        let mut app = PdfEditorApp::new(Box::new(LopdfEngine::new()), Vec::new());
        open_sample(&mut app, &ctx, &dir.path().join("a.pdf"), 2);
        open_sample(&mut app, &ctx, &dir.path().join("b.pdf"), 1);
        open_sample(&mut app, &ctx, &dir.path().join("c.pdf"), 3);
        let (a, c) = (handle_of(&app, 0), handle_of(&app, 2));

        app.close_tab(1);
        app.merge_documents(&[c, a]);

        let labels = page_labels_at(&dir.path().join("merged.pdf"), None).unwrap();
        assert_eq!(labels, ["Page 1", "Page 2", "Page 3", "Page 1", "Page 2"]);
    }
}
