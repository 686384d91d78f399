use crate::errors::CryptoError;
use base64::{engine::general_purpose::STANDARD, Engine};

/// Base64 encode the provided buffer using the standard padded alphabet
pub fn b64_encode(x: impl AsRef<[u8]>) -> String {
    STANDARD.encode(x)
}

pub fn b64_decode(x: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(x)
        .map_err(|e| CryptoError::InvalidToken(e.to_string()))
}
