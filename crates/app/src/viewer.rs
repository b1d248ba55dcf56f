//! Viewer panel: scrolling page column, metadata table and zoom slider.

use eframe::egui;
use pdf_editor_core::viewer::NO_PAGES_MESSAGE;
use pdf_editor_core::{DocumentTab, ZoomLevel, MAX_ZOOM, MIN_ZOOM};
use pdf_engine::RgbaImage;

pub fn upload_image(ctx: &egui::Context, name: String, image: &RgbaImage) -> egui::TextureHandle {
    let size = [image.width() as usize, image.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

/// GPU copies of a tab's page bitmaps at one zoom level.
pub struct PageTextures {
    zoom: ZoomLevel,
    pages: Vec<egui::TextureHandle>,
}

impl PageTextures {
    pub fn upload(ctx: &egui::Context, tab: &DocumentTab) -> Self {
        let id = tab.session.handle().raw();
        let pages = tab
            .viewer
            .pages()
            .iter()
            .map(|page| upload_image(ctx, format!("page_{id}_{}", page.page_index), &page.image))
            .collect();
        Self { zoom: tab.viewer.zoom(), pages }
    }

    pub fn is_stale(&self, tab: &DocumentTab) -> bool {
        self.zoom != tab.viewer.zoom() || self.pages.len() != tab.viewer.pages().len()
    }
}

/// Metadata table plus zoom slider. Returns the newly requested zoom level.
pub fn draw_properties(ui: &mut egui::Ui, tab: &DocumentTab) -> Option<ZoomLevel> {
    ui.heading("Properties");
    ui.add_space(4.0);
    egui::Grid::new("metadata_table").striped(true).num_columns(2).show(ui, |ui| {
        for row in tab.viewer.metadata() {
            ui.label(row.key);
            ui.label(&row.value);
            ui.end_row();
        }
    });

    ui.add_space(16.0);
    let mut level = tab.viewer.zoom().level();
    let response = ui.add(egui::Slider::new(&mut level, MIN_ZOOM..=MAX_ZOOM).text("Zoom"));
    let requested = ZoomLevel::new(level as i32);
    (response.changed() && requested != tab.viewer.zoom()).then_some(requested)
}

pub fn draw_pages(ui: &mut egui::Ui, textures: &PageTextures) {
    if textures.pages.is_empty() {
        ui.centered_and_justified(|ui| {
            ui.label(NO_PAGES_MESSAGE);
        });
        return;
    }

    egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
        ui.vertical_centered(|ui| {
            for texture in &textures.pages {
                ui.add_space(8.0);
                ui.image(texture);
            }
            ui.add_space(8.0);
        });
    });
}

pub fn draw_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.label(egui::RichText::new("Ctrl + O to get started").size(24.0).weak());
    });
}
