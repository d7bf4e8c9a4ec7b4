// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// Build an `n`-page PDF whose page `i` draws the text `{label}{i}`.
///
/// Resources and MediaBox live on the /Pages node, so every page inherits
/// them.
pub fn labelled_pdf(label: &str, n: u32) -> Vec<u8> {
    let mut doc = build_labelled(label, n, false);
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save fixture");
    out
}

/// Like [`labelled_pdf`] but with bulky uncompressed content, an
/// unreachable object, an empty stream and a page thumbnail, so every
/// compression level has something to do.
pub fn bloated_pdf(n: u32) -> Vec<u8> {
    let mut doc = build_labelled("Z", n, true);

    let orphan = "unreachable filler ".repeat(400).into_bytes();
    doc.add_object(Stream::new(Dictionary::new(), orphan));

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save fixture");
    out
}

/// [`labelled_pdf`] protected with `password` as both owner and user
/// password.
pub fn protected_pdf(label: &str, n: u32, password: &str) -> Vec<u8> {
    super::protect(&labelled_pdf(label, n), password).expect("protect fixture")
}

/// [`labelled_pdf`] with an owner password and an empty user password, so
/// it opens without prompting.
pub fn owner_only_pdf(label: &str, n: u32) -> Vec<u8> {
    let spec = super::EncryptionSpec {
        owner_password: "owner",
        user_password: "",
    };
    super::protect_with(&labelled_pdf(label, n), &spec).expect("protect fixture")
}

/// The label text drawn on each page, in page order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("load output");
    labels_of(&doc)
}

pub fn labels_of(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let raw = doc.get_page_content(page_id).expect("page content");
            let content = Content::decode(&raw).expect("decode content");
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(text, _)) => Some(String::from_utf8_lossy(text).into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .collect()
}

fn build_labelled(label: &str, n: u32, bloated: bool) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let resources_id = doc.add_object(resources);

    let mut kids = Vec::new();
    for i in 1..=n {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
            Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
            Operation::new(
                "Tj",
                vec![Object::String(format!("{label}{i}").into_bytes(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];
        if bloated {
            for _ in 0..200 {
                operations.push(Operation::new(
                    "re",
                    vec![
                        Object::Integer(10),
                        Object::Integer(10),
                        Object::Integer(100),
                        Object::Integer(100),
                    ],
                ));
                operations.push(Operation::new("S", vec![]));
            }
        }
        let content = Content { operations };
        let mut stream = Stream::new(Dictionary::new(), content.encode().expect("encode content"));
        stream.allows_compression = true;
        let content_id = doc.add_object(stream);

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        if bloated {
            let thumb = Stream::new(Dictionary::new(), vec![0x7Fu8; 4096]);
            let thumb_id = doc.add_object(thumb);
            page.set("Thumb", Object::Reference(thumb_id));
            let empty_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
            page.set("PieceInfo", Object::Reference(empty_id));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(n as i64));
    pages.set("Kids", Object::Array(kids));
    pages.set("Resources", Object::Reference(resources_id));
    pages.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc
}
