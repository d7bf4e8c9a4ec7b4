// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compression — re-serialise a document with tighter encoding.
//
// Level mapping:
//   low    → Flate-compress every stream that is not already filtered
//   medium → low + prune unreachable objects, drop empty streams, renumber
//   high   → medium + strip /Thumb and /PieceInfo, prune again
//
// Page count and drawn content are never touched.

use lopdf::{Document, Object};
use pdfworks_core::CompressionLevel;
use pdfworks_core::error::Result;
use tracing::{debug, info, instrument};

use super::loader::load_readable;
use super::reader::save_to_vec;

/// Page and catalog entries that carry no visible content.
const DISPOSABLE_KEYS: [&[u8]; 2] = [b"Thumb", b"PieceInfo"];

/// Compress `input` at the given level.
#[instrument(skip_all, fields(bytes_len = input.len(), level = level.as_str()))]
pub fn compress(input: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    let mut document = load_readable(input, "compressing")?;

    if level >= CompressionLevel::High {
        let stripped = strip_disposable_entries(&mut document);
        debug!(stripped, "removed thumbnails and private data");
    }

    if level >= CompressionLevel::Medium {
        let pruned = document.prune_objects();
        let emptied = document.delete_zero_length_streams();
        debug!(pruned = pruned.len(), emptied = emptied.len(), "object graph tidied");
        document.renumber_objects();
    }

    document.compress();

    let output = save_to_vec(&mut document)?;
    info!(
        input_bytes = input.len(),
        output_bytes = output.len(),
        "PDF compressed"
    );
    Ok(output)
}

/// Remove thumbnail and private-data entries from every page and the
/// catalog. Returns how many entries were removed; the objects they
/// pointed at are left for `prune_objects`.
fn strip_disposable_entries(document: &mut Document) -> usize {
    let mut targets: Vec<_> = document.get_pages().into_values().collect();
    if let Ok(root) = document.trailer.get(b"Root").and_then(Object::as_reference) {
        targets.push(root);
    }

    let mut removed = 0;
    for id in targets {
        if let Ok(dict) = document.get_dictionary_mut(id) {
            for key in DISPOSABLE_KEYS {
                if dict.remove(key).is_some() {
                    removed += 1;
                }
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use pdfworks_core::error::PdfworksError;

    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::pdf::testing::{bloated_pdf, labelled_pdf, owner_only_pdf, page_labels, protected_pdf};

    #[test]
    fn every_level_preserves_pages() {
        let input = bloated_pdf(3);
        for level in [CompressionLevel::Low, CompressionLevel::Medium, CompressionLevel::High] {
            let output = compress(&input, level).unwrap();
            assert_eq!(page_labels(&output), vec!["Z1", "Z2", "Z3"], "{level:?}");
        }
    }

    #[test]
    fn size_is_non_increasing_with_level() {
        let input = bloated_pdf(4);
        let low = compress(&input, CompressionLevel::Low).unwrap();
        let medium = compress(&input, CompressionLevel::Medium).unwrap();
        let high = compress(&input, CompressionLevel::High).unwrap();

        assert!(low.len() < input.len(), "low {} vs input {}", low.len(), input.len());
        assert!(medium.len() <= low.len(), "medium {} vs low {}", medium.len(), low.len());
        assert!(high.len() <= medium.len(), "high {} vs medium {}", high.len(), medium.len());
    }

    #[test]
    fn high_strips_thumbnails() {
        let output = compress(&bloated_pdf(1), CompressionLevel::High).unwrap();
        let reader = PdfReader::from_bytes(&output).unwrap();
        let doc = reader.document();
        let page_id = *doc.get_pages().get(&1).unwrap();
        assert!(!doc.get_dictionary(page_id).unwrap().has(b"Thumb"));
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(
            compress(b"nope", CompressionLevel::Medium),
            Err(PdfworksError::Format(_))
        ));
    }

    #[test]
    fn small_documents_survive() {
        let input = labelled_pdf("S", 1);
        let output = compress(&input, CompressionLevel::High).unwrap();
        assert_eq!(page_labels(&output), vec!["S1"]);
    }

    #[test]
    fn empty_user_password_input_comes_out_unencrypted() {
        let output = compress(&owner_only_pdf("O", 2), CompressionLevel::Medium).unwrap();
        assert!(!Document::load_mem(&output).unwrap().is_encrypted());
        assert_eq!(page_labels(&output), vec!["O1", "O2"]);
    }

    #[test]
    fn locked_input_is_refused() {
        assert!(matches!(
            compress(&protected_pdf("K", 1, "pw"), CompressionLevel::Low),
            Err(PdfworksError::Validation(_))
        ));
    }
}
