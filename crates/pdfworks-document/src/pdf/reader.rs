// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — load documents from memory and rebuild them from selected
// pages using the `lopdf` crate. Merge and split both go through
// `PageAssembler`, which deep-copies pages into a fresh page tree.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfworks_core::error::{PdfworksError, Result};
use tracing::{debug, info, instrument, warn};

use super::loader::{clear_encryption, is_locked, load};
use super::ranges::PageSelection;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees with a `/Parent` cycle.
const MAX_TREE_DEPTH: usize = 64;

/// Reads existing PDF documents.
///
/// Wraps `lopdf::Document`; the transforms in this crate never mutate the
/// document they were given, they build a new one.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = load(data)?;
        if !is_locked(&document) {
            clear_encryption(&mut document);
        }

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Whether the content is still encrypted, i.e. opening it needs a
    /// non-empty password. Documents with an empty user password are read
    /// in the clear.
    pub fn is_locked(&self) -> bool {
        is_locked(&self.document)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    // -- Extraction -----------------------------------------------------------

    /// Build a new document containing only the selected pages, in ascending
    /// order.
    #[instrument(skip_all, fields(selected = selection.len()))]
    pub fn extract(&self, selection: &PageSelection) -> Result<Vec<u8>> {
        let pages = self.document.get_pages();
        let page_ids = selection
            .page_numbers()
            .map(|page_number| {
                pages.get(&page_number).copied().ok_or_else(|| {
                    PdfworksError::Format(format!("page {page_number} not found in page tree"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut assembler = PageAssembler::new();
        assembler.append_pages(&self.document, page_ids)?;

        let output = assembler.finish()?;
        debug!(output_bytes = output.len(), "pages extracted");
        Ok(output)
    }

    /// Keep only the pages named by `ranges` (e.g. `"1-3,5"`).
    ///
    /// Pages come out in ascending order with duplicates collapsed.
    #[instrument(skip_all, fields(ranges = ranges))]
    pub fn split(&self, ranges: &str) -> Result<Vec<u8>> {
        if self.is_locked() {
            return Err(PdfworksError::Validation(
                "Document is password protected; unlock it before splitting".into(),
            ));
        }
        let selection = PageSelection::parse(ranges, self.page_count())?;
        info!(pages = selection.len(), of = self.page_count(), "splitting PDF");
        self.extract(&selection)
    }

    /// Concatenate the pages of every input, in input order.
    ///
    /// Inputs that fail to parse are reported by their 1-based position.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn merge(inputs: &[&[u8]]) -> Result<Vec<u8>> {
        if inputs.is_empty() {
            return Err(PdfworksError::Validation("nothing to merge".into()));
        }

        let mut assembler = PageAssembler::new();
        for (index, bytes) in inputs.iter().enumerate() {
            let source = Document::load_mem(bytes).map_err(|err| {
                PdfworksError::Format(format!("file #{} is not a valid PDF: {err}", index + 1))
            })?;
            if is_locked(&source) {
                return Err(PdfworksError::Format(format!(
                    "file #{} is password protected",
                    index + 1
                )));
            }

            // `get_pages` is keyed by 1-based page number, so iteration is in
            // page order.
            assembler.append_pages(&source, source.get_pages().into_values())?;
        }

        info!(pages = assembler.page_count(), "merging PDFs");
        assembler.finish()
    }
}

/// Concatenate the pages of every input, in input order.
pub fn merge(inputs: &[&[u8]]) -> Result<Vec<u8>> {
    PdfReader::merge(inputs)
}

/// Keep the pages of `input` named by `ranges`.
pub fn split(input: &[u8], ranges: &str) -> Result<Vec<u8>> {
    PdfReader::from_bytes(input)?.split(ranges)
}

/// Number of pages in `input`.
pub fn page_count(input: &[u8]) -> Result<u32> {
    Ok(PdfReader::from_bytes(input)?.page_count())
}

/// Serialise a document to bytes.
pub(crate) fn save_to_vec(document: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|err| PdfworksError::Format(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}

// -- Page assembly ------------------------------------------------------------

/// Builds a new document by deep-copying pages from one or more sources.
struct PageAssembler {
    target: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageAssembler {
    fn new() -> Self {
        let mut target = Document::with_version("1.7");
        let pages_id = target.new_object_id();
        Self {
            target,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Copy `page_ids` from `source`, in order, and append them.
    ///
    /// Objects shared between those pages (fonts, images, graphics states)
    /// are copied once.
    fn append_pages(
        &mut self,
        source: &Document,
        page_ids: impl IntoIterator<Item = ObjectId>,
    ) -> Result<()> {
        let mut copied = HashMap::new();
        for page_id in page_ids {
            self.append_page(source, page_id, &mut copied)?;
        }
        Ok(())
    }

    /// Copy `page_id` from `source` (with everything it references) and
    /// append it as the last page. `copied` maps already copied source ids
    /// to their ids in the target.
    fn append_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<()> {
        let page = source
            .get_dictionary(page_id)
            .map_err(|err| PdfworksError::Format(format!("cannot read page {page_id:?}: {err}")))?;

        let mut new_page = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            new_page.set(key.clone(), copy_object(source, &mut self.target, value, copied));
        }

        for key in INHERITABLE_KEYS {
            if new_page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                new_page.set(key.to_vec(), copy_object(source, &mut self.target, &value, copied));
            }
        }

        new_page.set("Parent", Object::Reference(self.pages_id));
        let new_id = self.target.add_object(Object::Dictionary(new_page));
        self.kids.push(Object::Reference(new_id));
        Ok(())
    }

    /// Write the page tree and catalog and serialise the result.
    fn finish(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(PdfworksError::EmptySelection);
        }

        let count = self.kids.len() as i64;
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(self.kids));
        pages.set("Count", Object::Integer(count));
        self.target.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.target.add_object(Object::Dictionary(catalog));
        self.target.trailer.set("Root", Object::Reference(catalog_id));

        save_to_vec(&mut self.target)
    }
}

/// Walk up the `/Parent` chain looking for an inheritable attribute.
fn inherited_attribute(source: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = source.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = source.get_dictionary(parent_id).ok()?;
    }
    None
}

/// Deep-copy `object` from `source` into `target`, following references.
///
/// `copied` maps source ids to target ids so that shared objects and
/// reference cycles are copied once. `/Parent` entries are dropped; the
/// only parent that matters (the page's) is set by the caller.
fn copy_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Reference(ref_id) => {
            if let Some(existing) = copied.get(ref_id) {
                return Object::Reference(*existing);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    copied.insert(*ref_id, new_id);
                    let cloned = copy_object(source, target, referenced, copied);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(source, target, dict, copied)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| copy_object(source, target, item, copied))
                .collect(),
        ),
        Object::Stream(stream) => {
            let dict = copy_dictionary(source, target, &stream.dict, copied);
            let mut new_stream = Stream::new(dict, stream.content.clone());
            new_stream.allows_compression = stream.allows_compression;
            Object::Stream(new_stream)
        }
        other => other.clone(),
    }
}

fn copy_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), copy_object(source, target, value, copied));
    }
    new_dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{labelled_pdf, owner_only_pdf, page_labels, protected_pdf};

    fn font_count(bytes: &[u8]) -> usize {
        let doc = Document::load_mem(bytes).unwrap();
        doc.objects
            .values()
            .filter_map(|object| object.as_dict().ok())
            .filter(|dict| dict.has_type(b"Font"))
            .count()
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let result = PdfReader::from_bytes(b"definitely not a pdf");
        assert!(matches!(result, Err(PdfworksError::Format(_))));
    }

    #[test]
    fn merge_preserves_input_order() {
        let a = labelled_pdf("A", 2);
        let b = labelled_pdf("B", 3);

        let merged = PdfReader::merge(&[&a, &b]).unwrap();
        let reader = PdfReader::from_bytes(&merged).unwrap();

        assert_eq!(reader.page_count(), 5);
        assert_eq!(page_labels(&merged), vec!["A1", "A2", "B1", "B2", "B3"]);
    }

    #[test]
    fn merge_names_the_bad_input() {
        let a = labelled_pdf("A", 1);
        let err = PdfReader::merge(&[&a, b"%PDF-1.4 broken"]).unwrap_err();
        match err {
            PdfworksError::Format(msg) => assert!(msg.contains("#2"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extract_keeps_selected_pages_in_order() {
        let source = labelled_pdf("P", 5);
        let reader = PdfReader::from_bytes(&source).unwrap();
        let selection = PageSelection::parse("5,1-2", 5).unwrap();

        let output = reader.extract(&selection).unwrap();
        assert_eq!(page_labels(&output), vec!["P1", "P2", "P5"]);
    }

    #[test]
    fn split_applies_the_range_expression() {
        let source = labelled_pdf("S", 6);
        let reader = PdfReader::from_bytes(&source).unwrap();

        let output = reader.split("2-3, 6,3").unwrap();
        assert_eq!(page_labels(&output), vec!["S2", "S3", "S6"]);
    }

    #[test]
    fn split_beyond_last_page_is_a_range_error() {
        let reader = PdfReader::from_bytes(&labelled_pdf("S", 2)).unwrap();
        assert!(matches!(reader.split("7-9"), Err(PdfworksError::Range { .. })));
        assert!(matches!(reader.split(" "), Err(PdfworksError::EmptySelection)));
    }

    #[test]
    fn free_functions_match_the_reader() {
        let source = labelled_pdf("F", 4);
        assert_eq!(page_count(&source).unwrap(), 4);
        let output = split(&source, "4,2").unwrap();
        assert_eq!(page_labels(&output), vec!["F2", "F4"]);
        let merged = merge(&[&output, &source]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 6);
    }

    #[test]
    fn shared_font_is_copied_once_per_source() {
        let a = labelled_pdf("A", 4);
        let b = labelled_pdf("B", 3);
        assert_eq!(font_count(&a), 1);

        let merged = merge(&[&a, &b]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 7);
        assert_eq!(font_count(&merged), 2);

        let split_output = split(&a, "1-4").unwrap();
        assert_eq!(font_count(&split_output), 1);
    }

    #[test]
    fn empty_user_password_inputs_are_readable() {
        let owner_only = owner_only_pdf("O", 2);
        let merged = merge(&[&owner_only, &labelled_pdf("P", 1)]).unwrap();
        assert_eq!(page_labels(&merged), vec!["O1", "O2", "P1"]);

        let output = split(&owner_only, "2").unwrap();
        assert_eq!(page_labels(&output), vec!["O2"]);
        assert!(!PdfReader::from_bytes(&owner_only).unwrap().is_locked());
    }

    #[test]
    fn locked_inputs_are_refused() {
        let locked = protected_pdf("K", 2, "pw");
        assert!(PdfReader::from_bytes(&locked).unwrap().is_locked());
        assert!(matches!(split(&locked, "1"), Err(PdfworksError::Validation(_))));
        match merge(&[&labelled_pdf("P", 1), &locked]) {
            Err(PdfworksError::Format(msg)) => assert!(msg.contains("#2"), "{msg}"),
            other => panic!("expected format error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn inherited_resources_are_materialised() {
        let source = labelled_pdf("R", 2);
        let reader = PdfReader::from_bytes(&source).unwrap();
        let selection = PageSelection::parse("2", 2).unwrap();

        let output = reader.extract(&selection).unwrap();
        let doc = Document::load_mem(&output).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }
}
