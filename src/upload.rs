use axum::http::{HeaderMap, header};
use chrono::Utc;
use std::path::Path;
use tokio::fs;

use crate::error::{AppError, AppResult};

/// Route prefix uploaded images are served from.
pub const UPLOAD_ROUTE: &str = "/public/uploads";

const FILE_TYPE_MAP: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpeg"),
    ("image/jpg", "jpg"),
];

/// One multipart file part, buffered in memory.
#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    FILE_TYPE_MAP
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// Stored name: the final path component of the client-supplied name, with
/// spaces replaced by hyphens, suffixed with the upload timestamp and the
/// extension for the (allow-listed) MIME type. Any other MIME type is
/// rejected outright. The client name is untrusted: path separators are
/// stripped here so the stored file can never land outside the upload
/// directory.
pub fn build_file_name(original: &str, content_type: &str) -> AppResult<String> {
    let ext = extension_for(content_type)
        .ok_or_else(|| AppError::BadRequest("Invalid image type".to_string()))?;
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .replace(' ', "-");
    if base.is_empty() {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }
    Ok(format!("{}-{}.{}", base, Utc::now().timestamp_millis(), ext))
}

/// Write the image into the upload directory and return the stored file name.
pub async fn store_image(dir: &str, image: &UploadedImage) -> AppResult<String> {
    let file_name = build_file_name(&image.file_name, &image.content_type)?;
    fs::create_dir_all(dir)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    let path = Path::new(dir).join(&file_name);
    fs::write(&path, &image.bytes)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    Ok(file_name)
}

/// Public URL for a stored file, derived from the request headers: the
/// scheme from `X-Forwarded-Proto` (plain `http` when absent, i.e. no proxy
/// in front) and the authority from `Host`.
pub fn public_url(headers: &HeaderMap, file_name: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}{UPLOAD_ROUTE}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_allowed_mime_types() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[test]
    fn file_name_replaces_spaces_and_appends_extension() {
        let name = build_file_name("my product photo.png", "image/png").unwrap();
        assert!(name.starts_with("my-product-photo.png-"));
        assert!(name.ends_with(".png"));
        assert!(!name.contains(' '));
    }

    #[test]
    fn file_name_rejects_unlisted_mime_type() {
        let err = build_file_name("clip.gif", "image/gif").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn file_name_keeps_only_the_final_path_component() {
        let name = build_file_name("../escaped.png", "image/png").unwrap();
        assert!(name.starts_with("escaped.png-"));

        let name = build_file_name("/etc/passwd photo.png", "image/png").unwrap();
        assert!(name.starts_with("passwd-photo.png-"));

        let name = build_file_name("..\\..\\boot.jpg", "image/jpg").unwrap();
        assert!(name.starts_with("boot.jpg-"));
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
    }

    #[test]
    fn file_name_rejects_bare_separators() {
        let err = build_file_name("/", "image/png").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = build_file_name("uploads/", "image/png").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn stores_image_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let image = UploadedImage {
            file_name: "cover art.jpg".into(),
            content_type: "image/jpg".into(),
            bytes: vec![1, 2, 3],
        };
        let stored = store_image(dir.path().to_str().unwrap(), &image)
            .await
            .unwrap();
        let written = tokio::fs::read(dir.path().join(&stored)).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn traversal_names_stay_inside_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let image = UploadedImage {
            file_name: "../../escape attempt.png".into(),
            content_type: "image/png".into(),
            bytes: vec![9],
        };
        let stored = store_image(dir.path().to_str().unwrap(), &image)
            .await
            .unwrap();
        assert!(stored.starts_with("escape-attempt.png-"));

        let written = dir.path().join(&stored).canonicalize().unwrap();
        assert!(written.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn public_url_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "shop.example.com:3000".parse().unwrap());
        let url = public_url(&headers, "photo-1.png");
        assert_eq!(
            url,
            "http://shop.example.com:3000/public/uploads/photo-1.png"
        );
    }

    #[test]
    fn public_url_honors_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "shop.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        let url = public_url(&headers, "photo-1.png");
        assert_eq!(url, "https://shop.example.com/public/uploads/photo-1.png");
    }
}
