use crate::PdfEngineError;
use lopdf::encryption::crypt_filters::{Aes256CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat};
use rand::RngCore;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::sync::Arc;

const STANDARD_FILTER: &[u8] = b"StdCF";

/// How a document is protected when written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Encryption {
    #[default]
    None,
    /// Standard security handler revision 6 with AES-256 crypt filters.
    Aes256 { owner_password: String, user_password: String },
}

impl Encryption {
    /// AES-256 with the same password for owner and user.
    pub fn aes256(password: &str) -> Self {
        Self::Aes256 { owner_password: password.to_string(), user_password: password.to_string() }
    }
}

/// True while the document's objects are still encrypted.
pub(crate) fn is_locked(document: &Document) -> bool {
    document.is_encrypted() && document.encryption_state.is_none()
}

/// Reparses `bytes` with `password`. The objects of an encrypted file are
/// only parsed once a password is accepted, so a locked document has to be
/// loaded again rather than decrypted in place.
pub(crate) fn load_with_password(bytes: &[u8], password: &str) -> Result<Document, PdfEngineError> {
    Document::load_mem_with_password(bytes, password).map_err(|err| match err {
        lopdf::Error::InvalidPassword => PdfEngineError::IncorrectPassword,
        other => PdfEngineError::Pdf(other),
    })
}

/// Human readable security handler summary, `None` for plain documents.
pub(crate) fn describe(document: &Document) -> Option<String> {
    let encrypt = match document.trailer.get(b"Encrypt") {
        Ok(Object::Reference(id)) => document.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    let Some(encrypt) = encrypt else {
        return document.encryption_state.as_ref().map(|_| "Standard".to_string());
    };

    let filter = encrypt
        .get(b"Filter")
        .and_then(Object::as_name)
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .unwrap_or_else(|_| "Standard".to_string());
    let mut summary = filter;
    if let Ok(version) = encrypt.get(b"V").and_then(Object::as_i64) {
        summary.push_str(&format!(" V{version}"));
    }
    if let Ok(revision) = encrypt.get(b"R").and_then(Object::as_i64) {
        summary.push_str(&format!(" R{revision}"));
    }
    Some(summary)
}

/// Clone of `document` with its security handler removed.
pub(crate) fn plain_copy(document: &Document) -> Document {
    let mut copy = document.clone();
    if let Ok(encrypt_id) = copy.trailer.get(b"Encrypt").and_then(Object::as_reference) {
        copy.objects.remove(&encrypt_id);
    }
    copy.trailer.remove(b"Encrypt");
    copy.encryption_state = None;
    copy
}

/// Encryption needs a file identifier in the trailer.
fn ensure_file_id(document: &mut Document) {
    if document.trailer.get(b"ID").is_ok() {
        return;
    }

    let mut id = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut id);
    document.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.to_vec(), StringFormat::Hexadecimal),
            Object::String(id.to_vec(), StringFormat::Hexadecimal),
        ]),
    );
}

pub(crate) fn apply_aes256(
    document: &mut Document,
    owner_password: &str,
    user_password: &str,
) -> Result<(), PdfEngineError> {
    ensure_file_id(document);

    let mut file_key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut file_key);

    let filter: Arc<dyn CryptFilter> = Arc::new(Aes256CryptFilter);
    let version = EncryptionVersion::V5 {
        encrypt_metadata: true,
        crypt_filters: BTreeMap::from([(STANDARD_FILTER.to_vec(), filter)]),
        file_encryption_key: &file_key,
        stream_filter: STANDARD_FILTER.to_vec(),
        string_filter: STANDARD_FILTER.to_vec(),
        owner_password,
        user_password,
        permissions: Permissions::all(),
    };

    let state = EncryptionState::try_from(version)
        .map_err(|err| PdfEngineError::Encryption(err.to_string()))?;
    document.encrypt(&state).map_err(|err| PdfEngineError::Encryption(err.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encrypted_sample_pdf, sample_pdf};

    #[test]
    fn plain_document_has_no_description() {
        let document = Document::load_mem(&sample_pdf(1)).unwrap();
        assert_eq!(describe(&document), None);
        assert!(!is_locked(&document));
    }

    #[test]
    fn aes256_document_is_described_and_locked() {
        let document = Document::load_mem(&encrypted_sample_pdf(1, "pw")).unwrap();

        assert!(is_locked(&document));
        let summary = describe(&document).expect("encrypted document should be described");
        assert!(summary.starts_with("Standard"));
        assert!(summary.contains("V5"));
    }

    #[test]
    fn plain_copy_drops_encrypt_entry() {
        let document = load_with_password(&encrypted_sample_pdf(1, "pw"), "pw").unwrap();

        let copy = plain_copy(&document);
        assert!(copy.trailer.get(b"Encrypt").is_err());
        assert!(copy.encryption_state.is_none());
    }

    #[test]
    fn load_with_password_parses_every_page() {
        let bytes = encrypted_sample_pdf(3, "pw");

        let document = load_with_password(&bytes, "pw").unwrap();
        assert!(!is_locked(&document));
        assert!(describe(&document).is_some());
        assert_eq!(document.get_pages().len(), 3);
    }

    #[test]
    fn load_with_wrong_password_is_rejected() {
        let bytes = encrypted_sample_pdf(1, "pw");

        assert!(matches!(
            load_with_password(&bytes, "nope"),
            Err(PdfEngineError::IncorrectPassword)
        ));
    }

    #[test]
    fn file_id_is_added_once() {
        let mut document = Document::load_mem(&sample_pdf(1)).unwrap();
        document.trailer.remove(b"ID");

        ensure_file_id(&mut document);
        let first = format!("{:?}", document.trailer.get(b"ID").unwrap());
        ensure_file_id(&mut document);

        assert_eq!(format!("{:?}", document.trailer.get(b"ID").unwrap()), first);
    }
}
