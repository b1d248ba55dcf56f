//! Rasterising backend built on PDFium.
//!
//! Document structure, editing and encryption stay with [`LopdfEngine`];
//! PDFium only receives a decrypted copy of each unlocked document and draws
//! its pages.

use crate::{
    DocumentHandle, DocumentMetadata, Encryption, LopdfEngine, OpenSource, PageSelection,
    PageSize, PdfEngine, PdfEngineError, RenderRequest, RgbaImage, ThumbnailSize,
};
use log::debug;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::path::Path;

pub struct PdfiumEngine {
    inner: LopdfEngine,
    pdfium: &'static Pdfium,
    rendered: HashMap<DocumentHandle, PdfDocument<'static>>,
}

impl PdfiumEngine {
    /// Binds the PDFium shared library.
    ///
    /// Search order:
    /// 1. `library_dir`, when given
    /// 2. Executable's directory
    /// 3. Current working directory
    /// 4. System library paths
    pub fn bind(library_dir: Option<&Path>) -> Result<Self, PdfEngineError> {
        let exe_dir =
            std::env::current_exe().ok().and_then(|p| p.parent().map(|p| p.to_path_buf()));

        let candidates = library_dir.map(Path::to_path_buf).into_iter().chain(exe_dir);
        let mut bindings = None;
        for dir in candidates {
            if let Ok(found) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            {
                debug!("bound pdfium from {}", dir.display());
                bindings = Some(found);
                break;
            }
        }

        let bindings = match bindings {
            Some(bindings) => bindings,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| PdfEngineError::Backend(e.to_string()))?,
        };

        let pdfium: &'static Pdfium = Box::leak(Box::new(Pdfium::new(bindings)));
        Ok(Self { inner: LopdfEngine::new(), pdfium, rendered: HashMap::new() })
    }

    /// Reloads the PDFium copy of `handle` after its structure changed.
    fn refresh(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        if self.inner.is_locked(handle)? {
            self.rendered.remove(&handle);
            return Ok(());
        }

        let bytes = self.inner.to_bytes(handle)?;
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| PdfEngineError::Backend(e.to_string()))?;
        self.rendered.insert(handle, document);
        Ok(())
    }
}

impl PdfEngine for PdfiumEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let handle = self.inner.open(source)?;
        if let Err(err) = self.refresh(handle) {
            let _ = self.inner.close(handle);
            return Err(err);
        }
        Ok(handle)
    }

    fn create(&mut self) -> DocumentHandle {
        // Empty documents have nothing to draw until pages are inserted.
        self.inner.create()
    }

    fn is_encrypted(&self, handle: DocumentHandle) -> Result<bool, PdfEngineError> {
        self.inner.is_encrypted(handle)
    }

    fn is_locked(&self, handle: DocumentHandle) -> Result<bool, PdfEngineError> {
        self.inner.is_locked(handle)
    }

    fn authenticate(
        &mut self,
        handle: DocumentHandle,
        password: &str,
    ) -> Result<(), PdfEngineError> {
        self.inner.authenticate(handle, password)?;
        self.refresh(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        self.inner.page_count(handle)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        self.inner.page_size(handle, page_index)
    }

    fn metadata(&self, handle: DocumentHandle) -> Result<DocumentMetadata, PdfEngineError> {
        self.inner.metadata(handle)
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let size = self.inner.page_size(handle, request.page_index)?;
        let Some(document) = self.rendered.get(&handle) else {
            return self.inner.render_page(handle, request);
        };

        let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };
        let width = (size.width_pt * scale).round().max(1.0) as i32;
        let height = (size.height_pt * scale).round().max(1.0) as i32;

        let page_count = self.inner.page_count(handle)?;
        let page = document
            .pages()
            .get(pdfium_page_index(request.page_index, page_count)?)
            .map_err(|e| PdfEngineError::Backend(e.to_string()))?;
        let config = PdfRenderConfig::new().set_target_width(width).set_target_height(height);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfEngineError::Backend(e.to_string()))?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes().to_vec())
            .ok_or_else(|| PdfEngineError::Backend("bitmap size mismatch".to_string()))
    }

    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError> {
        let size = self.inner.page_size(handle, page_index)?;
        let scale = (target.width_px as f32 / size.width_pt)
            .min(target.height_px as f32 / size.height_pt)
            .max(0.01);
        self.render_page(handle, RenderRequest { page_index, scale })
    }

    fn insert_pages(
        &mut self,
        target: DocumentHandle,
        source: DocumentHandle,
        pages: PageSelection,
    ) -> Result<(), PdfEngineError> {
        self.inner.insert_pages(target, source, pages)?;
        self.refresh(target)
    }

    fn save(
        &self,
        handle: DocumentHandle,
        path: &Path,
        encryption: &Encryption,
    ) -> Result<(), PdfEngineError> {
        self.inner.save(handle, path, encryption)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.rendered.remove(&handle);
        self.inner.close(handle)
    }
}

/// PDFium addresses pages with a `u16`.
fn pdfium_page_index(page_index: u32, page_count: u32) -> Result<u16, PdfEngineError> {
    u16::try_from(page_index)
        .map_err(|_| PdfEngineError::PageOutOfRange { page: page_index, page_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_fits_pdfium_range() {
        assert_eq!(pdfium_page_index(0, 1).unwrap(), 0);
        assert_eq!(pdfium_page_index(65_535, 70_000).unwrap(), u16::MAX);
    }

    #[test]
    fn page_index_beyond_u16_is_out_of_range() {
        let err = pdfium_page_index(65_536, 70_000).unwrap_err();
        assert!(matches!(err, PdfEngineError::PageOutOfRange { page: 65_536, page_count: 70_000 }));
    }
}
