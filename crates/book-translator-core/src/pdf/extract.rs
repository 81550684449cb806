use ::mupdf::{Document, TextPageOptions};
use tracing::debug;

use super::{ExtractedPage, ExtractedText, PageExtractor};
use crate::error::{Error, Result};

/// Text extraction through MuPDF.
///
/// Each text line of a page becomes one line of the page text, and text
/// blocks are separated by an empty line so the chunker sees paragraph
/// boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfExtractor;

impl MupdfExtractor {
    pub const fn new() -> Self {
        Self
    }

    fn page_text(doc: &Document, index: i32, page_number: u32) -> Result<String> {
        let page = doc.load_page(index).map_err(|e| Error::PdfTextExtraction {
            page: page_number,
            reason: format!("Failed to load page: {e}"),
        })?;

        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| Error::PdfTextExtraction {
                page: page_number,
                reason: format!("Failed to get text page: {e}"),
            })?;

        let mut text = String::new();
        for block in text_page.blocks() {
            let mut block_text = String::new();

            for line in block.lines() {
                let line_text: String = line.chars().filter_map(|c| c.char()).collect();
                let line_text = line_text.trim_end();
                if line_text.is_empty() {
                    continue;
                }
                block_text.push_str(line_text);
                block_text.push('\n');
            }

            if block_text.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&block_text);
        }

        Ok(text)
    }
}

impl PageExtractor for MupdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        let doc = Document::from_bytes(bytes, "")
            .map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;

        let mut pages = Vec::new();
        let mut full_text = String::new();

        for index in 0..page_count {
            let page_number = u32::try_from(index + 1).map_err(|_| Error::PdfTextExtraction {
                page: 0,
                reason: format!("invalid page index {index}"),
            })?;

            let text = Self::page_text(&doc, index, page_number)?;
            if !full_text.is_empty() {
                full_text.push('\n');
            }
            full_text.push_str(&text);
            pages.push(ExtractedPage { page_number, text });
        }

        debug!(
            "Extracted {} pages ({} chars)",
            pages.len(),
            full_text.chars().count()
        );

        Ok(ExtractedText { pages, full_text })
    }
}
