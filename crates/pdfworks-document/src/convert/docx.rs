// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF → Word (.docx), in-process.
//
// Text is pulled page by page out of the PDF content streams and written as
// a minimal WordprocessingML package: one paragraph per extracted line and
// a hard page break between source pages. Layout, images and fonts are not
// carried over.

use std::io::{Cursor, Write};

use pdfworks_core::error::{PdfworksError, Result};
use tracing::{debug, info, instrument, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::pdf::loader::load_readable;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_TAIL: &str = "<w:sectPr/></w:body></w:document>";

const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

/// Convert a PDF to a `.docx` package holding its text.
///
/// Pages whose text cannot be extracted come out empty rather than failing
/// the whole conversion.
#[instrument(skip_all, fields(bytes_len = input.len()))]
pub fn pdf_to_docx(input: &[u8]) -> Result<Vec<u8>> {
    let document = load_readable(input, "converting")?;

    let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
    let mut body = String::from(DOCUMENT_HEAD);

    for (position, page_number) in page_numbers.iter().enumerate() {
        if position > 0 {
            body.push_str(PAGE_BREAK);
        }
        let text = match document.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(err) => {
                warn!(page = page_number, %err, "text extraction failed; page left blank");
                String::new()
            }
        };
        push_paragraphs(&mut body, &text);
    }
    body.push_str(DOCUMENT_TAIL);

    debug!(pages = page_numbers.len(), xml_bytes = body.len(), "document.xml built");
    let output = package(&body)?;
    info!(output_bytes = output.len(), "PDF → Word complete");
    Ok(output)
}

fn push_paragraphs(body: &mut String, text: &str) {
    let mut wrote_any = false;
    for line in text.lines().map(str::trim_end).filter(|line| !line.is_empty()) {
        body.push_str(r#"<w:p><w:r><w:t xml:space="preserve">"#);
        escape_into(body, line);
        body.push_str("</w:t></w:r></w:p>");
        wrote_any = true;
    }
    // Word requires at least one paragraph between breaks to keep the page.
    if !wrote_any {
        body.push_str("<w:p/>");
    }
}

/// XML-escape `text`, dropping control characters XML 1.0 cannot carry.
fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' => out.push(' '),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
}

fn package(document_xml: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, contents) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", document_xml),
    ] {
        zip.start_file(name, options)
            .map_err(|err| PdfworksError::Internal(format!("cannot write {name}: {err}")))?;
        zip.write_all(contents.as_bytes())?;
    }

    let cursor = zip
        .finish()
        .map_err(|err| PdfworksError::Internal(format!("cannot finish docx package: {err}")))?;
    Ok(cursor.into_inner())
}
