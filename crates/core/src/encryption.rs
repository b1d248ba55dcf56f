//! What the Encrypt action does for a given session.

use crate::session::DocumentSession;

/// Options offered for documents that are already encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionChoice {
    ChangePassword,
    Decrypt,
}

/// Radio-button state of the encryption options dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncryptionOptions {
    choice: Option<EncryptionChoice>,
}

impl EncryptionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting one choice deselects the other.
    pub fn select(&mut self, choice: EncryptionChoice) {
        self.choice = Some(choice);
    }

    pub fn is_selected(&self, choice: EncryptionChoice) -> bool {
        self.choice == Some(choice)
    }

    /// `None` when the dialog is accepted with nothing chosen.
    pub fn accept(self) -> Option<EncryptionChoice> {
        self.choice
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptAction {
    /// Prompt for a password and write an encrypted copy.
    SetPassword,
    /// Tell the user, then offer [`EncryptionOptions`].
    AlreadyEncrypted,
}

pub fn encrypt_action(session: &DocumentSession) -> EncryptAction {
    if session.is_encrypted() {
        EncryptAction::AlreadyEncrypted
    } else {
        EncryptAction::SetPassword
    }
}
