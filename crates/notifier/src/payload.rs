//! Static media + caption payload shared by every contact in a batch.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use courier_common::error::{AppError, Result};

/// Media attachment in the shape the gateway expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub mimetype: String,
    pub filename: String,
    /// Base64-encoded file contents
    pub data: String,
}

/// One media attachment plus the caption sent with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub media: MediaFile,
    pub caption: String,
}

impl MediaPayload {
    /// Read the media and caption files from disk.
    ///
    /// Called once per poll batch so edits to either file are picked up
    /// without restarting the process.
    pub async fn load(media_path: &Path, caption_path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(media_path).await?;
        if bytes.is_empty() {
            return Err(AppError::Validation(format!(
                "media file {} is empty",
                media_path.display()
            )));
        }

        let caption = tokio::fs::read_to_string(caption_path)
            .await?
            .trim()
            .to_string();

        let filename = media_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());

        tracing::debug!(
            media = %media_path.display(),
            size = bytes.len(),
            caption_len = caption.len(),
            "Loaded dispatch payload"
        );

        Ok(Self {
            media: MediaFile {
                mimetype: mime_for(media_path),
                filename,
                data: STANDARD.encode(&bytes),
            },
            caption,
        })
    }
}

/// Guess a MIME type from the file extension.
fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a/b/image.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("promo.png")), "image/png");
        assert_eq!(mime_for(Path::new("flyer.pdf")), "application/pdf");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_mime_for_audio_and_video() {
        assert_eq!(mime_for(Path::new("promo.jpe")), "image/jpeg");
        assert_eq!(mime_for(Path::new("jingle.mp3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("voice.ogg")), "audio/ogg");
        assert_eq!(mime_for(Path::new("clip.webm")), "video/webm");
        assert_eq!(mime_for(Path::new("clip.mov")), "video/quicktime");
    }

    #[tokio::test]
    async fn test_load_encodes_media_and_trims_caption() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("image.jpg");
        let caption = dir.path().join("caption.txt");
        std::fs::write(&media, [0xFFu8, 0xD8, 0xFF]).unwrap();
        std::fs::write(&caption, "  Promoção de hoje!\n").unwrap();

        let payload = MediaPayload::load(&media, &caption).await.unwrap();
        assert_eq!(payload.caption, "Promoção de hoje!");
        assert_eq!(payload.media.mimetype, "image/jpeg");
        assert_eq!(payload.media.filename, "image.jpg");
        assert_eq!(payload.media.data, "/9j/");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MediaPayload::load(&dir.path().join("nope.jpg"), &dir.path().join("c.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_empty_media_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("empty.png");
        let caption = dir.path().join("caption.txt");
        std::fs::write(&media, b"").unwrap();
        std::fs::write(&caption, "hi").unwrap();

        let err = MediaPayload::load(&media, &caption).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
