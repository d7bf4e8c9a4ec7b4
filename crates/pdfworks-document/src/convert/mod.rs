// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format conversion between PDF and Word documents.
//
// PDF → Word runs in-process. Word → PDF shells out to an office renderer
// in an isolated scratch directory.

pub mod docx;
pub mod office;

pub use docx::pdf_to_docx;
pub use office::{ConversionJob, OfficeRenderer, SofficeRenderer, WordToPdf};
