// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfworks-document — Document transforms for the pdfworks API.
//
// Provides page-range parsing, PDF merge/split/compress/protect/unlock on
// in-memory buffers, and conversion between PDF and Word documents. Every
// function here is blocking; async callers run them on a blocking pool.

pub mod convert;
pub mod pdf;

// Re-export the primary entry points so callers can use `pdfworks_document::PdfReader` etc.
pub use convert::{OfficeRenderer, SofficeRenderer, WordToPdf, pdf_to_docx};
pub use pdf::{
    PageSelection, PdfReader, compress, merge, page_count, parse_page_ranges, protect, split,
    unlock,
};
