use std::path::PathBuf;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Allowed document image extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Maximum file size (5 MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Save an uploaded document image to the uploads directory.
/// Returns the relative path to the file (e.g., "uploads/abc123.jpg")
pub async fn save_uploaded_file(
    uploads_dir: &str,
    filename: &str,
    data: &[u8],
) -> Result<String> {
    let extension = extension_of(filename)?;
    store(uploads_dir, &extension, data).await
}

/// Save a `data:image/...;base64,` URI as produced by the crop dialog.
pub async fn save_data_uri(uploads_dir: &str, data_uri: &str) -> Result<String> {
    let (extension, data) = decode_data_uri(data_uri)?;
    store(uploads_dir, extension, &data).await
}

/// Splits an image data URI into its file extension and decoded bytes.
pub fn decode_data_uri(data_uri: &str) -> Result<(&'static str, Vec<u8>)> {
    let invalid = || AppError::Validation("Invalid image data URI".to_string());

    let rest = data_uri.strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;

    let extension = match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => {
            return Err(AppError::Validation(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )))
        }
    };

    let data = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    Ok((extension, data))
}

fn extension_of(filename: &str) -> Result<String> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(extension)
}

async fn store(uploads_dir: &str, extension: &str, data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(AppError::Validation("File is empty".to_string()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation("File too large (max 5 MB)".to_string()));
    }

    // Ensure uploads directory exists
    let uploads_path = PathBuf::from(uploads_dir);
    fs::create_dir_all(&uploads_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create uploads directory: {}", e))
    })?;

    let new_filename = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = uploads_path.join(&new_filename);

    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create file: {}", e))
    })?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    tracing::debug!("Stored upload {} ({} bytes)", new_filename, data.len());

    // Relative path, as stored on the member record
    Ok(format!("uploads/{}", new_filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_document_image_types() {
        assert_eq!(extension_of("selfie.JPG").unwrap(), "jpg");
        assert_eq!(extension_of("card.webp").unwrap(), "webp");
        assert!(extension_of("anim.gif").is_err());
        assert!(extension_of("noextension").is_err());
    }

    #[test]
    fn decodes_crop_output() {
        let (ext, bytes) = decode_data_uri("data:image/jpeg;base64,/9j/4A==").unwrap();
        assert_eq!(ext, "jpg");
        assert_eq!(bytes, vec![0xff, 0xd8, 0xff, 0xe0]);

        assert!(decode_data_uri("data:image/gif;base64,R0lG").is_err());
        assert!(decode_data_uri("https://example.com/a.png").is_err());
    }

    #[tokio::test]
    async fn rejects_oversized_upload() {
        let data = vec![0u8; MAX_FILE_SIZE + 1];
        let err = save_uploaded_file("target/test-uploads", "big.png", &data).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
