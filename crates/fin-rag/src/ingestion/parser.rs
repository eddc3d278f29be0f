//! PDF and DOCX text extraction

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// How long pdf-extract may run before we give up on a file
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Replace typographic characters that PDF fonts commonly emit with plain equivalents
fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{2010}', "-")  // Hyphen -> regular hyphen
        .replace('\u{2011}', "-")  // Non-breaking hyphen -> hyphen
        .replace('\u{2013}', "-")  // En dash -> hyphen
        .replace('\u{2014}', "--") // Em dash -> double hyphen
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parser for the document formats the service accepts
pub struct FileParser;

impl FileParser {
    /// Parse a file into page records based on its extension.
    ///
    /// Pages without any text are dropped; a file with no text at all is an error.
    pub fn parse(filename: &str, data: &[u8]) -> Result<Vec<Document>> {
        let pages = match FileType::from_filename(filename) {
            FileType::Pdf => Self::parse_pdf(filename, data)?,
            FileType::Docx => Self::parse_docx(filename, data)?,
            FileType::Unknown => {
                return Err(Error::UnsupportedFileType(filename.to_string()));
            }
        };

        if pages.is_empty() {
            return Err(Error::file_parse(filename, "No text content could be extracted"));
        }

        Ok(pages)
    }

    /// Parse PDF document page by page
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<Vec<Document>> {
        match lopdf::Document::load_mem(data) {
            Ok(pdf) => {
                let mut pages = Vec::new();
                for page_number in pdf.get_pages().keys() {
                    match pdf.extract_text(&[*page_number]) {
                        Ok(text) => {
                            let text = cleanup_pdf_text(&text);
                            if !text.is_empty() {
                                pages.push(Document::new(filename, Some(*page_number), text));
                            }
                        }
                        Err(e) => {
                            tracing::debug!("{}: no text on page {}: {}", filename, page_number, e);
                        }
                    }
                }

                if !pages.is_empty() {
                    return Ok(pages);
                }
                tracing::debug!("{}: lopdf found no text, trying pdf-extract", filename);
            }
            Err(e) => {
                tracing::debug!("{}: lopdf failed to load ({}), trying pdf-extract", filename, e);
            }
        }

        let text = cleanup_pdf_text(&Self::extract_pdf_with_timeout(filename, data)?);
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Document::new(filename, None, text)])
    }

    /// Extract PDF text on a separate thread so a pathological font cannot hang ingestion
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        let data = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::file_parse(filename, e.to_string())),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::file_parse(
                filename,
                format!("PDF extraction timed out after {}s", PDF_EXTRACT_TIMEOUT.as_secs()),
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::file_parse(filename, "PDF extraction thread crashed"))
            }
        }
    }

    /// Parse DOCX document as a single record
    fn parse_docx(filename: &str, data: &[u8]) -> Result<Vec<Document>> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    content.push_str(&paragraph_text(p));
                    content.push('\n');
                }
                docx_rs::DocumentChild::Table(table) => {
                    content.push_str(&table_text(table));
                }
                _ => {}
            }
        }

        let content = content.trim().to_string();
        if content.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Document::new(filename, None, content)])
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for child in &run.children {
                if let docx_rs::RunChild::Text(t) = child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

/// Tables are flattened one row per line with tab-separated cells
#[allow(irrefutable_let_patterns)]
fn table_text(table: &docx_rs::Table) -> String {
    let mut text = String::new();
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row else {
            continue;
        };
        let mut cells = Vec::new();
        for cell in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            let cell_text: Vec<String> = cell
                .children
                .iter()
                .filter_map(|content| match content {
                    docx_rs::TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                    _ => None,
                })
                .collect();
            cells.push(cell_text.join(" "));
        }
        text.push_str(&cells.join("\t"));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_pdf_text() {
        let raw = "  Pro\u{FB01}t \u{2013} FY24\u{0}\n\n\n  \u{201C}resilient\u{201D}  ";
        assert_eq!(cleanup_pdf_text(raw), "Profit - FY24\n\"resilient\"");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileParser::parse("notes.txt", b"hello").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn test_garbage_pdf_is_parse_error() {
        let err = FileParser::parse("broken.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn test_docx_round_trip() {
        let mut buf = std::io::Cursor::new(Vec::new());
        docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Revenue: 240,893 crore")),
            )
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Net margin: 19.3%")),
            )
            .build()
            .pack(&mut buf)
            .unwrap();

        let pages = FileParser::parse("summary.docx", buf.get_ref()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source, "summary.docx");
        assert_eq!(pages[0].page, None);
        assert!(pages[0].content.contains("Revenue: 240,893 crore"));
        assert!(pages[0].content.contains("Net margin: 19.3%"));
    }
}
