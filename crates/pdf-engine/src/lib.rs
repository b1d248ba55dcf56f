//! PDF engine seam for the editor.
//!
//! Every document operation the application performs goes through the
//! [`PdfEngine`] trait: opening and authenticating, reading page geometry and
//! metadata, rasterising pages, assembling new documents from pages of open
//! ones, and saving with or without encryption. The default backend is pure
//! `lopdf`; the `pdfium` feature adds a backend that rasterises real page
//! content.

mod compose;
mod encryption;
mod metadata;
#[cfg(feature = "pdfium")]
pub mod pdfium_backend;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use image::{ImageBuffer, Rgba};
use log::debug;
use lopdf::{Document, ObjectId};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use encryption::Encryption;
pub use metadata::DocumentMetadata;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self { width_px: 256, height_px: 256 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Pages of a source document to copy into a target.
///
/// `Pages` keeps the given order and may repeat an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Pages(Vec<u32>),
}

impl PageSelection {
    pub fn single(page_index: u32) -> Self {
        Self::Pages(vec![page_index])
    }

    fn resolve(&self, page_count: u32) -> Result<Vec<usize>, PdfEngineError> {
        match self {
            PageSelection::All => Ok((0..page_count as usize).collect()),
            PageSelection::Pages(pages) => pages
                .iter()
                .map(|&page| {
                    if page < page_count {
                        Ok(page as usize)
                    } else {
                        Err(PdfEngineError::PageOutOfRange { page, page_count })
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("document is encrypted and requires a password")]
    PasswordRequired,
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PdfEngine {
    /// Loads a document. Encrypted documents that need a password are
    /// registered in a locked state until [`PdfEngine::authenticate`] succeeds.
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    /// Creates an empty document with no pages.
    fn create(&mut self) -> DocumentHandle;
    fn is_encrypted(&self, handle: DocumentHandle) -> Result<bool, PdfEngineError>;
    fn is_locked(&self, handle: DocumentHandle) -> Result<bool, PdfEngineError>;
    fn authenticate(
        &mut self,
        handle: DocumentHandle,
        password: &str,
    ) -> Result<(), PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError>;
    fn metadata(&self, handle: DocumentHandle) -> Result<DocumentMetadata, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError>;
    /// Appends pages of `source` to the end of `target`.
    fn insert_pages(
        &mut self,
        target: DocumentHandle,
        source: DocumentHandle,
        pages: PageSelection,
    ) -> Result<(), PdfEngineError>;
    fn save(
        &self,
        handle: DocumentHandle,
        path: &Path,
        encryption: &Encryption,
    ) -> Result<(), PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

struct DocumentRecord {
    document: Document,
    page_ids: Vec<ObjectId>,
    page_sizes: Vec<PageSize>,
    encryption: Option<String>,
    /// Source bytes of a document still waiting for its password.
    locked: Option<Vec<u8>>,
}

impl DocumentRecord {
    fn new(document: Document) -> Self {
        let encryption = encryption::describe(&document);
        let mut record =
            Self { document, page_ids: Vec::new(), page_sizes: Vec::new(), encryption, locked: None };
        record.index_pages();
        record
    }

    fn load(bytes: Vec<u8>) -> Result<Self, PdfEngineError> {
        let document = Document::load_mem(&bytes)?;
        if !encryption::is_locked(&document) {
            return Ok(Self::new(document));
        }

        let encryption = encryption::describe(&document);
        Ok(Self {
            document,
            page_ids: Vec::new(),
            page_sizes: Vec::new(),
            encryption,
            locked: Some(bytes),
        })
    }

    fn index_pages(&mut self) {
        self.page_ids = self.document.get_pages().values().copied().collect();
        self.page_sizes =
            self.page_ids.iter().map(|&id| compose::page_size(&self.document, id)).collect();
    }
}

#[derive(Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialises an unlocked document without its encryption, for backends
    /// that need to load it themselves.
    pub fn to_bytes(&self, handle: DocumentHandle) -> Result<Vec<u8>, PdfEngineError> {
        let mut document = encryption::plain_copy(&self.unlocked(handle)?.document);
        let mut bytes = Vec::new();
        document.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Number of handles that are open.
    pub fn open_documents(&self) -> usize {
        self.docs.len()
    }

    fn register(&mut self, record: DocumentRecord) -> DocumentHandle {
        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.docs.insert(handle, record);
        handle
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }

    fn record_mut(&mut self, handle: DocumentHandle) -> Result<&mut DocumentRecord, PdfEngineError> {
        self.docs.get_mut(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }

    fn unlocked(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        let record = self.record(handle)?;
        if record.locked.is_some() {
            return Err(PdfEngineError::PasswordRequired);
        }
        Ok(record)
    }
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let record = DocumentRecord::load(bytes)?;
        debug!(
            "loaded document: {} pages, encrypted={}, locked={}",
            record.page_ids.len(),
            record.encryption.is_some(),
            record.locked.is_some()
        );

        Ok(self.register(record))
    }

    fn create(&mut self) -> DocumentHandle {
        self.register(DocumentRecord::new(compose::empty_document()))
    }

    fn is_encrypted(&self, handle: DocumentHandle) -> Result<bool, PdfEngineError> {
        Ok(self.record(handle)?.encryption.is_some())
    }

    fn is_locked(&self, handle: DocumentHandle) -> Result<bool, PdfEngineError> {
        Ok(self.record(handle)?.locked.is_some())
    }

    fn authenticate(
        &mut self,
        handle: DocumentHandle,
        password: &str,
    ) -> Result<(), PdfEngineError> {
        let record = self.record_mut(handle)?;
        let Some(source) = record.locked.as_deref() else {
            return Ok(());
        };

        let document = encryption::load_with_password(source, password).map_err(|err| {
            debug!("authentication rejected for handle {}: {err}", handle.raw());
            err
        })?;
        *record = DocumentRecord::new(document);

        Ok(())
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.unlocked(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let record = self.unlocked(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn metadata(&self, handle: DocumentHandle) -> Result<DocumentMetadata, PdfEngineError> {
        let record = self.unlocked(handle)?;
        Ok(metadata::read(&record.document, record.encryption.clone()))
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page_size = self.page_size(handle, request.page_index)?;
        let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };

        let width = (page_size.width_pt * scale).round().max(1.0) as u32;
        let height = (page_size.height_pt * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page = self.render_page(handle, RenderRequest { page_index, scale: 0.25 })?;

        Ok(image::imageops::thumbnail(&page, target.width_px.max(1), target.height_px.max(1)))
    }

    fn insert_pages(
        &mut self,
        target: DocumentHandle,
        source: DocumentHandle,
        pages: PageSelection,
    ) -> Result<(), PdfEngineError> {
        let donor = self.unlocked(source)?;
        let indices = pages.resolve(donor.page_ids.len() as u32)?;
        let donor = encryption::plain_copy(&donor.document);

        self.unlocked(target)?;
        let record = self.record_mut(target)?;
        compose::append_pages(&mut record.document, donor, &indices)?;
        record.index_pages();

        debug!(
            "inserted {} page(s) from handle {} into handle {}",
            indices.len(),
            source.raw(),
            target.raw()
        );
        Ok(())
    }

    fn save(
        &self,
        handle: DocumentHandle,
        path: &Path,
        encryption: &Encryption,
    ) -> Result<(), PdfEngineError> {
        let record = self.unlocked(handle)?;
        let mut document = encryption::plain_copy(&record.document);
        document.prune_objects();

        if let Encryption::Aes256 { owner_password, user_password } = encryption {
            encryption::apply_aes256(&mut document, owner_password, user_password)?;
        }

        document.save(path)?;
        debug!("saved handle {} to {}", handle.raw(), path.display());
        Ok(())
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}

/// Picks the best available backend: pdfium when the feature is enabled and
/// the shared library can be bound, otherwise the lopdf backend.
pub fn preferred_engine(library_dir: Option<&Path>) -> Box<dyn PdfEngine> {
    #[cfg(feature = "pdfium")]
    {
        match pdfium_backend::PdfiumEngine::bind(library_dir) {
            Ok(engine) => return Box::new(engine),
            Err(err) => log::warn!("pdfium unavailable, falling back to placeholder rendering: {err}"),
        }
    }
    #[cfg(not(feature = "pdfium"))]
    let _ = library_dir;

    Box::new(default_engine())
}
