//! Page text extraction from uploaded PDFs.

mod extract;

pub use extract::MupdfExtractor;

use crate::error::Result;
use crate::model::NewPage;

/// Turns PDF bytes into per-page text.
///
/// Implementations are synchronous and CPU bound; async callers should run
/// them on a blocking thread.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText>;
}

/// Raw text of one page, as extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// 1-based
    pub page_number: u32,
    pub text: String,
}

/// Extraction result: every page in reading order plus the whole document text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub pages: Vec<ExtractedPage>,
    pub full_text: String,
}

impl ExtractedText {
    /// Pages to persist.
    ///
    /// Page text is trimmed and blank pages are dropped. When no page has any
    /// text left, the trimmed full text becomes a single page 1, unless it is
    /// blank too, in which case there are no pages.
    pub fn into_pages(self) -> Vec<NewPage> {
        let pages: Vec<NewPage> = self
            .pages
            .into_iter()
            .filter_map(|page| {
                let text = page.text.trim();
                (!text.is_empty()).then(|| NewPage {
                    page_number: page.page_number,
                    text: text.to_string(),
                })
            })
            .collect();

        if !pages.is_empty() {
            return pages;
        }
        let full_text = self.full_text.trim();
        if full_text.is_empty() {
            return Vec::new();
        }
        vec![NewPage {
            page_number: 1,
            text: full_text.to_string(),
        }]
    }
}
