//! Output paths derived from a source document. Every derived file lands in
//! the source's directory and overwrites whatever is already there.

use std::path::{Path, PathBuf};

pub const MERGED_FILE_NAME: &str = "merged.pdf";
pub const SPLIT_FILE_NAME: &str = "split.pdf";

pub fn merged_path(first_source: &Path) -> PathBuf {
    first_source.with_file_name(MERGED_FILE_NAME)
}

pub fn split_path(source: &Path) -> PathBuf {
    source.with_file_name(SPLIT_FILE_NAME)
}

pub fn reordered_path(source: &Path) -> PathBuf {
    with_suffix(source, "reordered")
}

pub fn encrypted_path(source: &Path) -> PathBuf {
    with_suffix(source, "encrypted")
}

pub fn new_password_path(source: &Path) -> PathBuf {
    with_suffix(source, "newpassword")
}

pub fn decrypted_path(source: &Path) -> PathBuf {
    with_suffix(source, "decrypted")
}

/// `<dir>/<stem>_<suffix>.pdf`
fn with_suffix(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    source.with_file_name(format!("{stem}_{suffix}.pdf"))
}
