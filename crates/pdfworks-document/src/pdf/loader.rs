// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading PDFs that may carry the standard security handler.
//
// `Document::load_mem` opens documents whose user password is empty
// transparently. For anything else it returns a shell holding only the
// `/Encrypt` dictionary; `load_with_password` rebuilds the object table
// from the xref before decrypting.

use std::collections::{BTreeMap, HashSet};

use lopdf::encryption::DecryptionError;
use lopdf::xref::XrefEntry;
use lopdf::{Document, Object, Reader};
use pdfworks_core::error::{PdfworksError, Result};
use tracing::{debug, warn};

/// Parse `input`, mapping any failure to `Format`.
pub(crate) fn load(input: &[u8]) -> Result<Document> {
    Document::load_mem(input)
        .map_err(|err| PdfworksError::Format(format!("failed to load PDF: {err}")))
}

/// True when the content of `document` still needs a password.
pub(crate) fn is_locked(document: &Document) -> bool {
    document.is_encrypted() && document.encryption_state.is_none()
}

/// Drop the security handler from a document whose content is already in
/// the clear, so it serialises as a plain PDF.
pub(crate) fn clear_encryption(document: &mut Document) {
    if let Ok(id) = document.trailer.get(b"Encrypt").and_then(Object::as_reference) {
        document.objects.remove(&id);
    }
    document.trailer.remove(b"Encrypt");
    document.encryption_state = None;
}

/// Load `input` for a transform that needs readable content.
///
/// `action` completes the sentence "unlock it before ...".
pub(crate) fn load_readable(input: &[u8], action: &str) -> Result<Document> {
    let mut document = load(input)?;
    if is_locked(&document) {
        return Err(PdfworksError::Validation(format!(
            "Document is password protected; unlock it before {action}"
        )));
    }
    clear_encryption(&mut document);
    Ok(document)
}

/// Load `input` and open it with `password`. The result carries no
/// security handler.
pub(crate) fn load_with_password(input: &[u8], password: &str) -> Result<Document> {
    let document = load(input)?;
    if !is_locked(&document) {
        let mut document = document;
        clear_encryption(&mut document);
        return Ok(document);
    }

    // Offsets in the xref are relative to the header, as in `Reader::read`.
    let start = input.windows(5).position(|w| w == b"%PDF-").unwrap_or(0);
    let reader = Reader {
        buffer: &input[start..],
        document,
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };

    let mut parsed = Vec::new();
    for (&number, entry) in &reader.document.reference_table.entries {
        let XrefEntry::Normal { generation, .. } = *entry else {
            continue;
        };
        let id = (number, generation);
        if reader.document.objects.contains_key(&id) {
            continue;
        }
        match reader.get_object(id, &mut HashSet::new()) {
            Ok(object) => parsed.push((id, object)),
            Err(err) => warn!(?id, %err, "skipping unreadable object"),
        }
    }
    debug!(objects = parsed.len(), "encrypted objects read");

    let mut document = reader.document;
    document.objects.extend(parsed);
    document.decrypt(password).map_err(|err| match err {
        lopdf::Error::Decryption(DecryptionError::IncorrectPassword) => {
            warn!("incorrect document password");
            PdfworksError::Auth("Incorrect password".into())
        }
        other => PdfworksError::Format(format!("failed to decrypt PDF: {other}")),
    })?;
    clear_encryption(&mut document);

    if document.get_pages().is_empty() {
        return Err(PdfworksError::Format(
            "decrypted document has no readable pages".into(),
        ));
    }
    Ok(document)
}
