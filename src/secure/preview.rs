use super::{EncryptionError, EncryptionProvider};

/// Cipher text prefix written by the orchestrator's AES provider.
const AES_PREFIX: &str = "AES:";
const PENDING: &str = "(pending encryption)";

/// Stands in for the real provider when previewing which values would be
/// encrypted. Plain text never reaches the output: every value is replaced by
/// a fixed marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewCipher;

impl EncryptionProvider for PreviewCipher {
    fn encrypt(&self, _plain_text: &str) -> Result<String, EncryptionError> {
        Ok(PENDING.to_string())
    }

    fn is_encrypted(&self, value: &str) -> bool {
        value.starts_with(AES_PREFIX) || value == PENDING
    }
}
