//! PDF Editor Core Library
//!
//! Widget-free state and operations for the PDF editor: document sessions,
//! the picker and reorder models, zoom, the viewer model, open tabs, and the
//! delegating document operations. The GUI and CLI only translate user input
//! into calls on these types.

pub mod encryption;
pub mod error;
pub mod naming;
pub mod operations;
pub mod reorder;
pub mod selection;
pub mod session;
pub mod viewer;
pub mod workspace;
pub mod zoom;

pub use encryption::{encrypt_action, EncryptAction, EncryptionChoice, EncryptionOptions};
pub use error::{EditorError, EditorResult};
pub use reorder::{grid_cell, grid_rows, PageOrder, ReorderEvent, GRID_COLUMNS};
pub use selection::{PagePicker, RankedSelection, SelectionEvent, SelectionPolicy};
pub use session::{begin_open, open_document, DocumentSession, OpenOutcome, PendingSession};
pub use viewer::{metadata_rows, MetadataRow, PageThumbnail, ViewerModel};
pub use workspace::{DocumentTab, Workspace};
pub use zoom::{ZoomLevel, MAX_ZOOM, MIN_ZOOM};
