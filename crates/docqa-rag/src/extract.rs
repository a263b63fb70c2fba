//! Text extraction for the supported document formats.

use tracing::{debug, warn};

use docqa_core::traits::TextExtractor;
use docqa_core::types::PageText;
use docqa_core::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// UTF-8 text as a single page; invalid sequences are replaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, document_name: &str, bytes: &[u8]) -> Result<Vec<PageText>> {
        let text = match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(e) => {
                debug!(document = document_name, error = %e, "invalid UTF-8, decoding lossily");
                String::from_utf8_lossy(bytes).into_owned()
            }
        };
        Ok(vec![PageText { page_number: 1, text }])
    }
}

/// Per-page text via `lopdf`; falls back to whole-document `pdf-extract`
/// when the page walk fails or yields nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    fn pages(bytes: &[u8]) -> std::result::Result<Vec<PageText>, lopdf::Error> {
        let doc = lopdf::Document::load_mem(bytes)?;
        let mut pages = Vec::new();
        for page_number in doc.get_pages().into_keys() {
            match doc.extract_text(&[page_number]) {
                Ok(text) => pages.push(PageText { page_number, text }),
                Err(e) => debug!(page = page_number, error = %e, "no text on page"),
            }
        }
        Ok(pages)
    }

    fn whole_document(document_name: &str, bytes: &[u8]) -> Result<Vec<PageText>> {
        // pdf-extract panics on some malformed inputs
        let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
        match outcome {
            Ok(Ok(text)) => Ok(vec![PageText { page_number: 1, text }]),
            Ok(Err(e)) => Err(Error::extraction(document_name, e.to_string())),
            Err(_) => Err(Error::extraction(document_name, "PDF parser aborted on malformed input")),
        }
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, document_name: &str, bytes: &[u8]) -> Result<Vec<PageText>> {
        match Self::pages(bytes) {
            Ok(pages) if pages.iter().any(|p| !p.text.trim().is_empty()) => Ok(pages),
            Ok(_) => {
                debug!(document = document_name, "page walk found no text, trying whole-document extraction");
                Self::whole_document(document_name, bytes)
            }
            Err(e) => {
                warn!(document = document_name, error = %e, "lopdf could not load document, trying pdf-extract");
                Self::whole_document(document_name, bytes)
            }
        }
    }
}

/// Dispatches on the document name's extension (`pdf`, `txt`, `md`), or on
/// the PDF header when there is no extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoExtractor {
    pdf: PdfExtractor,
    text: PlainTextExtractor,
}

impl AutoExtractor {
    pub fn new() -> Self { Self::default() }
}

impl TextExtractor for AutoExtractor {
    fn extract(&self, document_name: &str, bytes: &[u8]) -> Result<Vec<PageText>> {
        let ext = std::path::Path::new(document_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => self.pdf.extract(document_name, bytes),
            Some("txt") | Some("md") => self.text.extract(document_name, bytes),
            None if bytes.starts_with(PDF_MAGIC) => self.pdf.extract(document_name, bytes),
            None => self.text.extract(document_name, bytes),
            Some(other) => Err(Error::extraction(document_name, format!("unsupported file type '.{other}'"))),
        }
    }
}
