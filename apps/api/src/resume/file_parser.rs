//! Turns an uploaded PDF or DOCX resume into plain text.
//!
//! Extraction is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// Part of a DOCX package that holds the main document body.
const DOCX_BODY_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ResumeParseError {
    #[error("Unsupported file format: {0}. Please upload PDF or DOCX.")]
    UnsupportedFormat(String),

    #[error("Error reading PDF: {0}")]
    Pdf(String),

    #[error("Error reading DOCX: {0}")]
    Docx(String),

    #[error("No text could be extracted from the document")]
    EmptyDocument,
}

impl From<zip::result::ZipError> for ResumeParseError {
    fn from(err: zip::result::ZipError) -> Self {
        ResumeParseError::Docx(err.to_string())
    }
}

impl From<quick_xml::Error> for ResumeParseError {
    fn from(err: quick_xml::Error) -> Self {
        ResumeParseError::Docx(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    /// Picks the parser from the file extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, ResumeParseError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(ResumeFormat::Pdf),
            "docx" | "doc" => Ok(ResumeFormat::Docx),
            other => Err(ResumeParseError::UnsupportedFormat(if other.is_empty() {
                "(none)".to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// Extracts trimmed text from resume bytes on a blocking thread.
pub async fn extract_resume_text(
    bytes: bytes::Bytes,
    filename: &str,
) -> Result<String, ResumeParseError> {
    let format = ResumeFormat::from_filename(filename)?;
    let text = tokio::task::spawn_blocking(move || extract_text(&bytes, format))
        .await
        .map_err(|e| match format {
            ResumeFormat::Pdf => ResumeParseError::Pdf(format!("extraction aborted: {e}")),
            ResumeFormat::Docx => ResumeParseError::Docx(format!("extraction aborted: {e}")),
        })??;
    debug!(filename, chars = text.len(), "Resume text extracted");
    Ok(text)
}

/// Synchronous extraction. Result is trimmed; empty output is an error.
pub fn extract_text(bytes: &[u8], format: ResumeFormat) -> Result<String, ResumeParseError> {
    let text = match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ResumeParseError::Pdf(e.to_string()))?,
        ResumeFormat::Docx => extract_docx_text(bytes)?,
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ResumeParseError::EmptyDocument);
    }
    Ok(text)
}

/// Reads paragraph text from a DOCX package, one line per `<w:p>`.
fn extract_docx_text(bytes: &[u8]) -> Result<String, ResumeParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)?
        .read_to_string(&mut xml)
        .map_err(|e| ResumeParseError::Docx(e.to_string()))?;
    paragraphs_from_document_xml(&xml)
}

fn paragraphs_from_document_xml(xml: &str) -> Result<String, ResumeParseError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text_run => text.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;

    /// Builds a minimal DOCX package whose body holds one paragraph per input line.
    pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", FileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Builds a one-page PDF that draws each line in Helvetica. No lines gives a page
    /// with an empty content stream.
    pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
        let mut content = String::new();
        if !lines.is_empty() {
            content.push_str("BT\n/F1 12 Tf\n14 TL\n72 720 Td\n");
            for line in lines {
                content.push_str(&format!("({line}) Tj T*\n"));
            }
            content.push_str("ET\n");
        }

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}endstream", content.len()),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_offset = pdf.len();
        pdf.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(
            ResumeFormat::from_filename("CV.PDF").unwrap(),
            ResumeFormat::Pdf
        );
        assert_eq!(
            ResumeFormat::from_filename("resume.final.docx").unwrap(),
            ResumeFormat::Docx
        );
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let err = ResumeFormat::from_filename("resume.txt").unwrap_err();
        assert!(err.to_string().contains("txt"));
        assert!(matches!(
            ResumeFormat::from_filename("resume"),
            Err(ResumeParseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let docx = fixtures::docx_with_paragraphs(&[
            "Jane Doe",
            "Skills: Rust, Python &amp; SQL",
        ]);
        let text = extract_text(&docx, ResumeFormat::Docx).unwrap();
        assert_eq!(text, "Jane Doe\nSkills: Rust, Python & SQL");
    }

    #[test]
    fn test_docx_tabs_and_breaks_preserved() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>Role</w:t><w:tab/><w:t>Company</w:t><w:br/><w:t>2020</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = paragraphs_from_document_xml(xml).unwrap();
        assert_eq!(text.trim(), "Role\tCompany\n2020");
    }

    #[test]
    fn test_empty_docx_is_an_error() {
        let docx = fixtures::docx_with_paragraphs(&["   "]);
        assert!(matches!(
            extract_text(&docx, ResumeFormat::Docx),
            Err(ResumeParseError::EmptyDocument)
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_as_docx() {
        let result = extract_text(b"definitely not a zip", ResumeFormat::Docx);
        assert!(matches!(result, Err(ResumeParseError::Docx(_))));
    }

    #[test]
    fn test_pdf_text_extracted() {
        let pdf = fixtures::minimal_pdf(&["Ada Lovelace", "Rust engineer"]);
        let text = extract_text(&pdf, ResumeFormat::Pdf).unwrap();
        assert!(text.contains("Ada Lovelace"), "got {text:?}");
        assert!(text.contains("Rust engineer"), "got {text:?}");
    }

    #[test]
    fn test_pdf_without_text_is_empty_document() {
        let pdf = fixtures::minimal_pdf(&[]);
        assert!(matches!(
            extract_text(&pdf, ResumeFormat::Pdf),
            Err(ResumeParseError::EmptyDocument)
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_as_pdf() {
        let result = extract_text(b"definitely not a pdf", ResumeFormat::Pdf);
        assert!(matches!(result, Err(ResumeParseError::Pdf(_))));
    }

    #[tokio::test]
    async fn test_async_pdf_extraction() {
        let pdf = fixtures::minimal_pdf(&["Grace Hopper"]);
        let text = extract_resume_text(bytes::Bytes::from(pdf), "resume.pdf")
            .await
            .unwrap();
        assert!(text.contains("Grace Hopper"));
    }

    #[tokio::test]
    async fn test_async_extraction_rejects_unknown_format_before_spawning() {
        let result = extract_resume_text(bytes::Bytes::from_static(b"x"), "cv.odt").await;
        assert!(matches!(result, Err(ResumeParseError::UnsupportedFormat(_))));
    }
}
