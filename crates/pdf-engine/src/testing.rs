//! Sample documents for tests. Each page draws the label `Page N` (1-based)
//! so tests can tell pages apart after they are copied around.

use crate::{encryption, PdfEngineError};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

pub fn sample_document(page_count: usize) -> Document {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for n in 1..=page_count {
        let content = format!("BT /F1 24 Tf 72 720 Td (Page {n}) Tj ET");
        let content_id = document.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => [0, 0, 595, 842].map(Object::Integer).to_vec(),
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let info_id = document.add_object(dictionary! {
        "Title" => Object::string_literal(format!("Sample {page_count}")),
        "Producer" => Object::string_literal("pdf-engine"),
    });
    document.trailer.set("Info", info_id);

    document
}

fn to_bytes(mut document: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    document.save_to(&mut bytes).expect("in-memory save should succeed");
    bytes
}

pub fn sample_pdf(page_count: usize) -> Vec<u8> {
    to_bytes(sample_document(page_count))
}

pub fn encrypted_sample_pdf(page_count: usize, password: &str) -> Vec<u8> {
    let mut document = sample_document(page_count);
    encryption::apply_aes256(&mut document, password, password)
        .expect("sample encryption should succeed");
    to_bytes(document)
}

pub fn write_sample_pdf(path: &Path, page_count: usize) -> std::io::Result<()> {
    std::fs::write(path, sample_pdf(page_count))
}

pub fn write_encrypted_sample_pdf(
    path: &Path,
    page_count: usize,
    password: &str,
) -> std::io::Result<()> {
    std::fs::write(path, encrypted_sample_pdf(page_count, password))
}

/// `Page N` labels of every page in document order.
pub fn page_labels(bytes: &[u8], password: Option<&str>) -> Result<Vec<String>, PdfEngineError> {
    let mut document = Document::load_mem(bytes)?;
    if encryption::is_locked(&document) {
        let password = password.ok_or(PdfEngineError::PasswordRequired)?;
        document = encryption::load_with_password(bytes, password)?;
    }

    document
        .get_pages()
        .values()
        .map(|&page_id| -> Result<String, PdfEngineError> {
            let content = document.get_page_content(page_id)?;
            let text = String::from_utf8_lossy(&content);
            Ok(text
                .split_once('(')
                .and_then(|(_, rest)| rest.split_once(')'))
                .map(|(label, _)| label.to_string())
                .unwrap_or_default())
        })
        .collect()
}

pub fn page_labels_at(path: &Path, password: Option<&str>) -> Result<Vec<String>, PdfEngineError> {
    page_labels(&std::fs::read(path)?, password)
}
