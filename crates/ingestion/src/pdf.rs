//! PDF text extraction module
//!
//! Loads PDFs from memory with lopdf and exposes their pages as a lazy,
//! borrowing sequence. Each page extracts its own text; a document's
//! text is the concatenation of its pages' text in page order, with no
//! separator added between pages.

use crate::errors::IngestionError;
use tracing::debug;

/// Suffix required on uploaded filenames
pub const PDF_SUFFIX: &str = ".pdf";

/// Whether an upload filename names a PDF (case-sensitive suffix check)
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.ends_with(PDF_SUFFIX)
}

/// Anything that can produce the text of one page
pub trait PageText {
    /// 1-based page number
    fn number(&self) -> u32;

    /// Extracted text of this page
    fn text(&self) -> Result<String, IngestionError>;
}

/// A parsed PDF held in memory
pub struct PdfDocument {
    doc: lopdf::Document,
}

impl PdfDocument {
    /// Parse PDF bytes
    pub fn load(bytes: &[u8]) -> Result<Self, IngestionError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| IngestionError::PdfParse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(IngestionError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Pages in page order
    pub fn pages(&self) -> impl Iterator<Item = PdfPage<'_>> + '_ {
        self.doc
            .get_pages()
            .into_keys()
            .map(move |number| PdfPage {
                doc: &self.doc,
                number,
            })
    }
}

/// One page of a [`PdfDocument`]
pub struct PdfPage<'a> {
    doc: &'a lopdf::Document,
    number: u32,
}

impl PageText for PdfPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn text(&self) -> Result<String, IngestionError> {
        self.doc
            .extract_text(&[self.number])
            .map_err(|e| IngestionError::PageExtraction {
                page: self.number,
                message: e.to_string(),
            })
    }
}

/// Concatenate page texts in order; any page failure fails the whole document
pub fn concat_page_text<P, I>(pages: I) -> Result<String, IngestionError>
where
    P: PageText,
    I: IntoIterator<Item = P>,
{
    let mut text = String::new();
    for page in pages {
        let page_text = page.text()?;
        debug!(page = page.number(), chars = page_text.len(), "Extracted page");
        text.push_str(&page_text);
    }
    Ok(text)
}

/// Extract the full text of a PDF held in memory
pub fn extract_text(bytes: &[u8]) -> Result<String, IngestionError> {
    let document = PdfDocument::load(bytes)?;
    debug!(page_count = document.page_count(), "Extracting text from PDF");

    let text = concat_page_text(document.pages())?;
    if text.trim().is_empty() {
        return Err(IngestionError::NoText);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{encrypted_pdf_with_pages, pdf_with_pages};

    struct FakePage(u32, Result<&'static str, &'static str>);

    impl PageText for FakePage {
        fn number(&self) -> u32 {
            self.0
        }

        fn text(&self) -> Result<String, IngestionError> {
            self.1
                .map(str::to_string)
                .map_err(|message| IngestionError::PageExtraction {
                    page: self.0,
                    message: message.to_string(),
                })
        }
    }

    #[test]
    fn test_pdf_suffix() {
        assert!(is_pdf_filename("report.pdf"));
        assert!(!is_pdf_filename("notes.txt"));
        assert!(!is_pdf_filename("report.PDF"));
        assert!(!is_pdf_filename("pdf"));
    }

    #[test]
    fn test_pages_concatenate_without_separator() {
        let pages = vec![FakePage(1, Ok("first ")), FakePage(2, Ok("second"))];
        assert_eq!(concat_page_text(pages).unwrap(), "first second");
    }

    #[test]
    fn test_page_failure_fails_document() {
        let pages = vec![FakePage(1, Ok("fine")), FakePage(2, Err("bad stream"))];
        let err = concat_page_text(pages).unwrap_err();
        assert!(matches!(err, IngestionError::PageExtraction { page: 2, .. }));
    }

    #[test]
    fn test_extract_real_pdf_in_page_order() {
        let bytes = pdf_with_pages(&["Alpha page", "Beta page"]);

        let document = PdfDocument::load(&bytes).unwrap();
        assert_eq!(document.page_count(), 2);

        let per_page: Vec<String> = document.pages().map(|p| p.text().unwrap()).collect();
        let text = extract_text(&bytes).unwrap();

        assert_eq!(text, per_page.concat());
        let alpha = text.find("Alpha page").unwrap();
        let beta = text.find("Beta page").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = extract_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, IngestionError::PdfParse(_)));
    }

    #[test]
    fn test_blank_pdf_has_no_text() {
        let bytes = pdf_with_pages(&["   "]);
        let err = extract_text(&bytes).unwrap_err();
        assert!(matches!(err, IngestionError::NoText));
    }

    #[test]
    fn test_encrypted_pdf_is_rejected() {
        let bytes = encrypted_pdf_with_pages(&["Secret"]);

        let err = extract_text(&bytes).unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Encrypted | IngestionError::PdfParse(_)
        ));

        let err: pdfquery_common::AppError = err.into();
        assert_eq!(err.status_code().as_u16(), 500);
    }
}
