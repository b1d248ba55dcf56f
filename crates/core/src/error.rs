use crate::selection::SelectionPolicy;
use pdf_engine::PdfEngineError;

/// Errors surfaced to the user by editor operations.
///
/// The `Display` text is what the message dialog shows.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Engine(#[from] PdfEngineError),

    #[error("Incorrect password.")]
    IncorrectPassword,

    #[error("Current password is incorrect.")]
    IncorrectCurrentPassword,

    #[error("A password is required to open this PDF.")]
    PasswordRequired,

    #[error("You need to open at least two PDFs to merge.")]
    NotEnoughDocuments { open: usize },

    #[error("You need to select at least {} to {}.", .policy.requirement(), .policy.verb())]
    InsufficientSelection { policy: SelectionPolicy, selected: usize },

    #[error("There are no pages to rearrange.")]
    NothingToRearrange,

    #[error("The password must not be empty.")]
    EmptyPassword,

    #[error("The PDF is already encrypted.")]
    AlreadyEncrypted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_messages_name_the_requirement() {
        let merge = EditorError::InsufficientSelection { policy: SelectionPolicy::Merge, selected: 1 };
        let split = EditorError::InsufficientSelection { policy: SelectionPolicy::Split, selected: 0 };

        assert_eq!(merge.to_string(), "You need to select at least two PDFs to merge.");
        assert_eq!(split.to_string(), "You need to select at least one page to split.");
    }

    #[test]
    fn test_engine_errors_keep_their_message() {
        let err = EditorError::from(PdfEngineError::InvalidHandle(3));
        assert_eq!(err.to_string(), "invalid handle 3");
    }
}
