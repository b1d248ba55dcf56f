use lopdf::{Dictionary, Document, Object};

/// Document information as shown in the viewer's properties table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// `"PDF <version>"`.
    pub format: String,
    /// Security handler summary; `None` when unencrypted.
    pub encryption: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

pub(crate) fn read(document: &Document, encryption: Option<String>) -> DocumentMetadata {
    let info = info_dictionary(document);
    let field = |key: &[u8]| {
        info.and_then(|dict| dict.get(key).ok())
            .map(|value| decode_text(document, value))
            .filter(|text| !text.is_empty())
    };

    DocumentMetadata {
        format: format!("PDF {}", document.version),
        encryption,
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        keywords: field(b"Keywords"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
        creation_date: field(b"CreationDate"),
        mod_date: field(b"ModDate"),
    }
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Text strings are either UTF-16BE with a byte order mark or
/// PDFDocEncoding, which matches Latin-1 for printable text.
fn decode_text(document: &Document, object: &Object) -> String {
    match object {
        Object::Reference(id) => match document.get_object(*id) {
            Ok(Object::Reference(_)) | Err(_) => String::new(),
            Ok(inner) => decode_text(document, inner),
        },
        Object::String(bytes, _) => {
            if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
                let units: Vec<u16> =
                    utf16.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
                String::from_utf16_lossy(&units)
            } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
                String::from_utf8_lossy(utf8).into_owned()
            } else {
                bytes.iter().map(|&b| b as char).collect()
            }
        }
        Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    fn document_with_info(info: Dictionary) -> Document {
        let mut document = Document::with_version("1.4");
        let info_id = document.add_object(info);
        document.trailer.set("Info", info_id);
        document
    }

    #[test]
    fn reads_literal_and_utf16_strings() {
        let title = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9];
        let document = document_with_info(dictionary! {
            "Title" => Object::String(title.to_vec(), StringFormat::Hexadecimal),
            "Author" => Object::string_literal("Ada"),
        });

        let metadata = read(&document, None);
        assert_eq!(metadata.title.as_deref(), Some("Hé"));
        assert_eq!(metadata.author.as_deref(), Some("Ada"));
        assert_eq!(metadata.subject, None);
        assert_eq!(metadata.format, "PDF 1.4");
    }

    #[test]
    fn missing_info_yields_only_format() {
        let document = Document::with_version("1.7");
        let metadata = read(&document, Some("Standard V5 R6".into()));

        assert_eq!(metadata.format, "PDF 1.7");
        assert_eq!(metadata.encryption.as_deref(), Some("Standard V5 R6"));
        assert!(metadata.title.is_none());
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let document = document_with_info(dictionary! { "Keywords" => Object::string_literal("") });
        assert_eq!(read(&document, None).keywords, None);
    }
}
