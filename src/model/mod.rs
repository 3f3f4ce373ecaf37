//! Document model types for layout reconstruction.
//!
//! This module defines the intermediate representation that bridges the
//! extraction boundary (positioned text items) and serialization (DOCX,
//! JSON, text). Everything here is created fresh per conversion.

mod block;
mod document;
mod item;
mod table;

pub use block::{Alignment, BlockStyle, BlockType, Bounds, TextBlock};
pub use document::{
    DocumentInput, DocumentStructure, ImagePlaceholder, Metadata, PageInput, PageStructure,
};
pub(crate) use item::is_all_caps;
pub use item::{Color, FontStyle, ResolvedStyle, TextItem};
pub use table::{TableCell, TableData, TableRow};
