//! Modal windows. Each dialog owns its core model and turns clicks and drops
//! into events on it; `show` reports whether the user accepted or rejected.

use crate::viewer::upload_image;
use eframe::egui;
use pdf_editor_core::{
    grid_cell, EncryptionChoice, EncryptionOptions, PageOrder, PagePicker, ReorderEvent,
    GRID_COLUMNS,
};
use pdf_engine::RgbaImage;

pub enum DialogOutcome<T> {
    Open,
    Accepted(T),
    Rejected,
}

fn modal_window(title: &str) -> egui::Window<'_> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

/// OK / Cancel row shared by the dialogs. Returns `Some(true)` on OK.
fn button_row(ui: &mut egui::Ui) -> Option<bool> {
    let mut outcome = None;
    ui.add_space(12.0);
    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
        if ui.button("Cancel").clicked() {
            outcome = Some(false);
        }
        if ui.button("OK").clicked() {
            outcome = Some(true);
        }
    });
    outcome
}

#[derive(Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Info,
}

impl Severity {
    fn icon(&self) -> &'static str {
        match self {
            Severity::Error => "❌",
            Severity::Info => "ℹ️",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Info => "Notice",
        }
    }
}

/// Blocking message window.
pub struct MessageDialog {
    severity: Severity,
    message: String,
}

impl MessageDialog {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }

    /// Returns `true` once dismissed.
    pub fn show(&self, ctx: &egui::Context) -> bool {
        let title = format!("{} {}", self.severity.icon(), self.severity.title());
        let mut dismissed = false;
        modal_window(&title).show(ctx, |ui| {
            ui.label(&self.message);
            ui.add_space(12.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });
        dismissed || ctx.input(|i| i.key_pressed(egui::Key::Enter))
    }
}

/// Masked single-line password entry.
pub struct PasswordDialog {
    title: String,
    prompt: String,
    input: String,
    focused: bool,
}

impl PasswordDialog {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { title: title.into(), prompt: prompt.into(), input: String::new(), focused: false }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> DialogOutcome<String> {
        let mut outcome = None;
        modal_window(&self.title).show(ctx, |ui| {
            ui.label(&self.prompt);
            let response = ui.add(egui::TextEdit::singleline(&mut self.input).password(true));
            if !self.focused {
                response.request_focus();
                self.focused = true;
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                outcome = Some(true);
            }
            if let Some(accepted) = button_row(ui) {
                outcome = Some(accepted);
            }
        });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            outcome = Some(false);
        }
        match outcome {
            Some(true) => DialogOutcome::Accepted(std::mem::take(&mut self.input)),
            Some(false) => DialogOutcome::Rejected,
            None => DialogOutcome::Open,
        }
    }
}

/// Grid of thumbnails; clicking toggles membership and shows the rank.
pub struct PickerDialog<T> {
    title: &'static str,
    picker: PagePicker<T>,
    labels: Vec<String>,
    thumbnails: Vec<Option<egui::TextureHandle>>,
}

impl<T: Clone> PickerDialog<T> {
    pub fn new(
        ctx: &egui::Context,
        title: &'static str,
        candidates: Vec<(T, String, Option<RgbaImage>)>,
    ) -> Self {
        let mut keys = Vec::with_capacity(candidates.len());
        let mut labels = Vec::with_capacity(candidates.len());
        let mut thumbnails = Vec::with_capacity(candidates.len());
        for (index, (key, label, image)) in candidates.into_iter().enumerate() {
            thumbnails.push(image.map(|image| upload_image(ctx, format!("{title}_{index}"), &image)));
            keys.push(key);
            labels.push(label);
        }
        Self { title, picker: PagePicker::new(keys), labels, thumbnails }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> DialogOutcome<Vec<T>> {
        let mut outcome = None;
        let mut clicked = None;

        modal_window(self.title).show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(600.0).show(ui, |ui| {
                egui::Grid::new((self.title, "grid")).spacing([12.0, 12.0]).show(ui, |ui| {
                    for index in 0..self.labels.len() {
                        ui.vertical_centered(|ui| {
                            let selected = self.picker.rank_of(index).is_some();
                            let response = match &self.thumbnails[index] {
                                Some(texture) => {
                                    ui.add(egui::ImageButton::new(texture).selected(selected))
                                }
                                None => ui.selectable_label(selected, &self.labels[index]),
                            };
                            if response.clicked() {
                                clicked = Some(index);
                            }
                            ui.label(&self.labels[index]);
                            ui.label(egui::RichText::new(self.picker.rank_label(index)).strong());
                        });
                        if grid_cell(index).1 == GRID_COLUMNS - 1 {
                            ui.end_row();
                        }
                    }
                });
            });
            outcome = button_row(ui);
        });

        if let Some(index) = clicked {
            self.picker.toggle(index);
        }
        match outcome {
            Some(true) => {
                let picker = std::mem::replace(&mut self.picker, PagePicker::new(Vec::new()));
                DialogOutcome::Accepted(picker.accept())
            }
            Some(false) => DialogOutcome::Rejected,
            None => DialogOutcome::Open,
        }
    }
}

/// Drag-and-drop permutation editor.
pub struct RearrangeDialog {
    order: PageOrder,
    /// Indexed by original page index.
    thumbnails: Vec<egui::TextureHandle>,
}

impl RearrangeDialog {
    pub fn new(ctx: &egui::Context, previews: Vec<RgbaImage>) -> Self {
        let thumbnails = previews
            .iter()
            .enumerate()
            .map(|(page, image)| upload_image(ctx, format!("rearrange_{page}"), image))
            .collect::<Vec<_>>();
        Self { order: PageOrder::identity(thumbnails.len() as u32), thumbnails }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> DialogOutcome<PageOrder> {
        let mut outcome = None;
        let mut dropped = None;

        modal_window("Rearrange Pages").show(ctx, |ui| {
            ui.label("Drag pages to change their order.");
            egui::ScrollArea::vertical().max_height(600.0).show(ui, |ui| {
                egui::Grid::new("rearrange_grid").spacing([12.0, 12.0]).show(ui, |ui| {
                    for slot in 0..self.order.len() {
                        let Some(page) = self.order.page_at(slot) else { continue };
                        let texture = &self.thumbnails[page as usize];
                        let response = ui
                            .dnd_drag_source(egui::Id::new(("rearrange_slot", slot)), slot, |ui| {
                                ui.vertical_centered(|ui| {
                                    ui.image(texture);
                                    ui.label(format!("Page {}", page + 1));
                                });
                            })
                            .response;
                        if let Some(from) = response.dnd_release_payload::<usize>() {
                            dropped = Some(ReorderEvent::Drop { from: *from, to: slot });
                        }
                        if grid_cell(slot).1 == GRID_COLUMNS - 1 {
                            ui.end_row();
                        }
                    }
                });
            });
            outcome = button_row(ui);
        });

        if let Some(event) = dropped {
            self.order.apply(event);
        }
        match outcome {
            Some(true) => DialogOutcome::Accepted(self.order.clone()),
            Some(false) => DialogOutcome::Rejected,
            None => DialogOutcome::Open,
        }
    }
}

/// Change-password / decrypt radio choice.
#[derive(Default)]
pub struct EncryptionOptionsDialog {
    options: EncryptionOptions,
}

impl EncryptionOptionsDialog {
    pub fn show(&mut self, ctx: &egui::Context) -> DialogOutcome<Option<EncryptionChoice>> {
        let mut outcome = None;
        modal_window("Encryption Options").show(ctx, |ui| {
            for (choice, label) in [
                (EncryptionChoice::ChangePassword, "Change Password"),
                (EncryptionChoice::Decrypt, "Decrypt PDF"),
            ] {
                if ui.radio(self.options.is_selected(choice), label).clicked() {
                    self.options.select(choice);
                }
            }
            outcome = button_row(ui);
        });

        match outcome {
            Some(true) => DialogOutcome::Accepted(self.options.accept()),
            Some(false) => DialogOutcome::Rejected,
            None => DialogOutcome::Open,
        }
    }
}
