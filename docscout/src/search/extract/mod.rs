//! Format backends that turn a file into a sequence of text units.
//!
//! A backend opens a file and hands back an iterator of [`ContentUnit`]s.
//! The iterator owns whatever handle the backend holds, so dropping it
//! releases the file. Units come out lazily and in document order; an
//! `Err` item reports a unit (a sheet or a page) that could not be read.
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::errors::ExtractResult;
use crate::filters::FileType;

pub mod document;
pub mod spreadsheet;

pub use document::PdfExtractor;
pub use spreadsheet::{column_letter, SpreadsheetExtractor};

/// One logical piece of text in a file: a spreadsheet cell or a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    /// Human-readable position, e.g. `Sheet 'Q1', Cell B7` or `Page 3`
    pub label: String,
    pub text: String,
}

impl ContentUnit {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Options forwarded from the search criteria to the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Read formula cells as their cached value instead of the formula text
    pub content_only: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { content_only: true }
    }
}

/// Lazy, finite, single-pass sequence of units from one opened file
pub type ContentUnits = Box<dyn Iterator<Item = ExtractResult<ContentUnit>>>;

/// A backend able to enumerate the text units of one document format
pub trait ContentExtractor: Send + Sync {
    /// Opens `path`, failing with an `ExtractError` when it cannot be read
    fn open(&self, path: &Path, options: ExtractOptions) -> ExtractResult<ContentUnits>;
}

/// The backend used for each [`FileType`]
#[derive(Clone)]
pub struct Extractors {
    spreadsheet: Arc<dyn ContentExtractor>,
    document: Arc<dyn ContentExtractor>,
}

impl Extractors {
    pub fn new(spreadsheet: Arc<dyn ContentExtractor>, document: Arc<dyn ContentExtractor>) -> Self {
        Self {
            spreadsheet,
            document,
        }
    }

    pub fn for_type(&self, file_type: FileType) -> &dyn ContentExtractor {
        match file_type {
            FileType::Excel => self.spreadsheet.as_ref(),
            FileType::Pdf => self.document.as_ref(),
        }
    }
}

impl Default for Extractors {
    fn default() -> Self {
        Self::new(Arc::new(SpreadsheetExtractor), Arc::new(PdfExtractor))
    }
}

impl fmt::Debug for Extractors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractors").finish_non_exhaustive()
    }
}
