//! PDF text extraction. `pdf-extract` is CPU-bound and may panic on malformed
//! input, so it always runs inside `tokio::task::spawn_blocking`.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;

/// `%PDF-` magic; checked before handing bytes to the parser.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts the raw text layer of an uploaded PDF.
/// Returns `UnprocessableEntity` when the bytes are not a readable PDF.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    if !looks_like_pdf(&bytes) {
        return Err(AppError::UnprocessableEntity(
            "Uploaded file is not a PDF document".to_string(),
        ));
    }

    let size = bytes.len();
    let outcome = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await;

    match outcome {
        Ok(Ok(text)) => {
            debug!("Extracted {} chars from {} byte PDF", text.len(), size);
            Ok(text)
        }
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {e}");
            Err(AppError::UnprocessableEntity(
                "Uploaded PDF could not be read".to_string(),
            ))
        }
        Err(e) => {
            warn!("PDF text extraction aborted: {e}");
            Err(AppError::UnprocessableEntity(
                "Uploaded PDF could not be read".to_string(),
            ))
        }
    }
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    // The header may be preceded by a little junk; readers accept it within the first KiB.
    let window = &bytes[..bytes.len().min(1024)];
    window
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_detection() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(looks_like_pdf(b"\n\n%PDF-1.4"));
        assert!(!looks_like_pdf(b"PK\x03\x04 zip archive"));
        assert!(!looks_like_pdf(b""));
    }

    #[tokio::test]
    async fn test_non_pdf_is_unprocessable() {
        let result = extract_pdf_text(Bytes::from_static(b"plain text resume")).await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }

    #[tokio::test]
    async fn test_truncated_pdf_is_unprocessable() {
        let result = extract_pdf_text(Bytes::from_static(b"%PDF-1.4\n%%EOF")).await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }
}
