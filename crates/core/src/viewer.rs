//! Widget-free viewer model: page bitmaps at the current zoom plus the
//! metadata table.

use crate::error::EditorResult;
use crate::session::DocumentSession;
use crate::zoom::ZoomLevel;
use log::{debug, error};
use pdf_engine::{
    DocumentHandle, DocumentMetadata, PdfEngine, RenderRequest, RgbaImage, ThumbnailSize,
};

/// Thumbnail size used by the picker dialogs.
pub const DIALOG_THUMBNAIL: ThumbnailSize = ThumbnailSize { width_px: 200, height_px: 260 };

pub const NO_PAGES_MESSAGE: &str = "No pages found in PDF.";

#[derive(Debug, Clone)]
pub struct PageThumbnail {
    pub page_index: u32,
    pub scale: f32,
    pub image: RgbaImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub key: &'static str,
    pub value: String,
}

/// Rows of the properties table, in display order.
pub fn metadata_rows(metadata: &DocumentMetadata) -> Vec<MetadataRow> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let rows = [
        ("producer", text(&metadata.producer)),
        ("format", metadata.format.clone()),
        ("encryption", metadata.encryption.clone().unwrap_or_else(|| "None".to_string())),
        ("author", text(&metadata.author)),
        ("modDate", text(&metadata.mod_date)),
        ("keywords", text(&metadata.keywords)),
        ("title", text(&metadata.title)),
        ("creationDate", text(&metadata.creation_date)),
        ("creator", text(&metadata.creator)),
        ("subject", text(&metadata.subject)),
    ];
    rows.into_iter().map(|(key, value)| MetadataRow { key, value }).collect()
}

/// Renders every page of `handle` at `zoom`.
pub fn render_pages(
    engine: &dyn PdfEngine,
    handle: DocumentHandle,
    zoom: ZoomLevel,
) -> EditorResult<Vec<PageThumbnail>> {
    let page_count = engine.page_count(handle)?;
    let scale = zoom.scale();
    (0..page_count)
        .map(|page_index| -> EditorResult<PageThumbnail> {
            let image = engine.render_page(handle, RenderRequest { page_index, scale })?;
            Ok(PageThumbnail { page_index, scale, image })
        })
        .collect()
}

/// First-page preview used by the merge picker, `None` for empty documents.
pub fn first_page_preview(
    engine: &dyn PdfEngine,
    session: &DocumentSession,
) -> EditorResult<Option<RgbaImage>> {
    if session.page_count() == 0 {
        return Ok(None);
    }
    Ok(Some(engine.render_thumbnail(session.handle(), 0, DIALOG_THUMBNAIL)?))
}

/// One thumbnail per page, for the split and rearrange pickers.
pub fn page_previews(
    engine: &dyn PdfEngine,
    session: &DocumentSession,
) -> EditorResult<Vec<RgbaImage>> {
    (0..session.page_count())
        .map(|page_index| {
            engine.render_thumbnail(session.handle(), page_index, DIALOG_THUMBNAIL).map_err(Into::into)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ViewerModel {
    zoom: ZoomLevel,
    pages: Vec<PageThumbnail>,
    metadata: Vec<MetadataRow>,
}

impl ViewerModel {
    pub fn load(engine: &dyn PdfEngine, session: &DocumentSession) -> EditorResult<Self> {
        let metadata = metadata_rows(&engine.metadata(session.handle())?);
        let zoom = ZoomLevel::default();
        let pages = render_pages(engine, session.handle(), zoom)?;
        Ok(Self { zoom, pages, metadata })
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn pages(&self) -> &[PageThumbnail] {
        &self.pages
    }

    pub fn metadata(&self) -> &[MetadataRow] {
        &self.metadata
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Re-renders every page at `zoom`. Returns `Ok(false)` when the level did
    /// not change. On failure the previous bitmaps stay in place.
    pub fn set_zoom(
        &mut self,
        engine: &dyn PdfEngine,
        session: &DocumentSession,
        zoom: ZoomLevel,
    ) -> EditorResult<bool> {
        if zoom == self.zoom {
            return Ok(false);
        }

        match render_pages(engine, session.handle(), zoom) {
            Ok(pages) => {
                debug!("re-rendered {} pages at zoom {}", pages.len(), zoom.level());
                self.pages = pages;
                self.zoom = zoom;
                Ok(true)
            }
            Err(err) => {
                error!("failed to render {} at zoom {}: {err}", session.path().display(), zoom.level());
                Err(err)
            }
        }
    }
}
