use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::trace;

use super::{ContentExtractor, ContentUnit, ContentUnits, ExtractOptions};
use crate::errors::{ExtractError, ExtractResult};

/// Reads PDF documents through lopdf, one unit per page
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl ContentExtractor for PdfExtractor {
    fn open(&self, path: &Path, _options: ExtractOptions) -> ExtractResult<ContentUnits> {
        let document = Document::load(path).map_err(|e| {
            let reason = e.to_string();
            let lowered = reason.to_lowercase();
            if lowered.contains("encrypt") || lowered.contains("decrypt") || lowered.contains("password") {
                ExtractError::protected(path)
            } else {
                ExtractError::unreadable(path, reason)
            }
        })?;

        // Still encrypted after loading means the empty password did not work
        if document.is_encrypted() {
            return Err(ExtractError::protected(path));
        }

        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Err(ExtractError::empty(path));
        }

        Ok(Box::new(PageUnits {
            path: path.to_path_buf(),
            document,
            pages: pages.into_iter(),
        }))
    }
}

/// Pages of an open document, extracted on demand
struct PageUnits {
    path: PathBuf,
    document: Document,
    pages: std::vec::IntoIter<u32>,
}

impl Iterator for PageUnits {
    type Item = ExtractResult<ContentUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Page numbers from lopdf are already 1-based
            let page = self.pages.next()?;
            match self.document.extract_text(&[page]) {
                Ok(text) if text.trim().is_empty() => {
                    trace!("Page {} of {} has no text", page, self.path.display());
                }
                Ok(text) => return Some(Ok(ContentUnit::new(format!("Page {}", page), text))),
                Err(e) => {
                    return Some(Err(ExtractError::partial_read(
                        &self.path,
                        format!("page {}", page),
                        e,
                    )))
                }
            }
        }
    }
}
