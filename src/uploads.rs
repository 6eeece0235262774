use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::errors::AppError;

/// Photo fields accept either an external URL (stored verbatim), an existing
/// `/uploads/...` reference (kept as-is), or inline base64 image data which is
/// written to the uploads directory. Returns the value to store in the row.
pub fn resolve_photo(
    uploads_dir: &str,
    prefix: &str,
    photo: Option<&str>,
) -> Result<Option<String>, AppError> {
    let Some(photo) = photo else {
        return Ok(None);
    };
    let photo = photo.trim();
    if photo.is_empty() {
        return Ok(None);
    }
    if photo.starts_with("http://") || photo.starts_with("https://") || photo.starts_with("/uploads/")
    {
        return Ok(Some(photo.to_string()));
    }
    save_photo(uploads_dir, prefix, photo).map(Some)
}

/// Decodes base64 image data (with or without a `data:...;base64,` prefix)
/// and writes it as `<prefix>_<millis>.png`, returning the `/uploads/...` path.
pub fn save_photo(uploads_dir: &str, prefix: &str, data: &str) -> Result<String, AppError> {
    let raw = match data.split_once(",") {
        Some((head, body)) if head.starts_with("data:") => body,
        _ => data,
    };
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|_| AppError::Validation("photo must be a URL or base64 image data".to_string()))?;

    let file_name = format!(
        "{}_{}.png",
        prefix,
        chrono::Utc::now().timestamp_millis()
    );
    fs::create_dir_all(uploads_dir)?;
    fs::write(Path::new(uploads_dir).join(&file_name), bytes)?;
    Ok(format!("/uploads/{file_name}"))
}

/// Removes a previously stored photo file. External URLs are ignored and a
/// missing or undeletable file is logged, never escalated to a request failure.
pub fn delete_photo(uploads_dir: &str, stored: &str) {
    let Some(file_name) = stored.strip_prefix("/uploads/") else {
        return;
    };
    let path = Path::new(uploads_dir).join(file_name);
    match fs::remove_file(&path) {
        Ok(()) => log::info!("Deleted stored photo {}", stored),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not delete stored photo {}: {}", stored, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};

    #[test]
    fn stores_and_deletes_base64_photos() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let data = STANDARD.encode([0x89, 0x50, 0x4e, 0x47]);
        let stored = resolve_photo(dir_str, "teacher", Some(&data))
            .unwrap()
            .unwrap();
        assert!(stored.starts_with("/uploads/teacher_"));
        let on_disk = dir.path().join(stored.strip_prefix("/uploads/").unwrap());
        assert!(on_disk.exists());

        delete_photo(dir_str, &stored);
        assert!(!on_disk.exists());
        // Deleting again must be tolerated.
        delete_photo(dir_str, &stored);
    }

    #[test]
    fn keeps_urls_untouched() {
        let kept = resolve_photo("unused", "student", Some("https://cdn.example/x.png")).unwrap();
        assert_eq!(kept.as_deref(), Some("https://cdn.example/x.png"));
        let kept = resolve_photo("unused", "student", Some("/uploads/student_1.png")).unwrap();
        assert_eq!(kept.as_deref(), Some("/uploads/student_1.png"));
        assert_eq!(resolve_photo("unused", "student", None).unwrap(), None);
        assert_eq!(resolve_photo("unused", "student", Some("  ")).unwrap(), None);
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        let data = format!("data:image/png;base64,{}", STANDARD.encode(b"img"));
        let stored = save_photo(dir_str, "school", &data).unwrap();
        assert!(stored.starts_with("/uploads/school_"));
    }

    #[test]
    fn garbage_photo_data_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_photo(dir.path().to_str().unwrap(), "x", "!!not base64!!").is_err());
    }
}
