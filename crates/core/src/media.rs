//! Media kind inference for campaign header attachments.

/// Provider media categories accepted in a template header component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    /// Wire name used in the provider's component parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
        }
    }
}

/// Infer the media kind from an attachment URL's file extension.
///
/// Used when a campaign attachment does not declare its kind
/// explicitly. Unknown extensions fall back to `Image`, the common
/// case for invitation-card attachments.
pub fn infer_media_kind(url: &str) -> MediaKind {
    // Ignore query string and fragment when reading the extension.
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "webp" => MediaKind::Image,
        "mp4" | "3gp" => MediaKind::Video,
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => MediaKind::Document,
        _ => MediaKind::Image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_image_extensions() {
        assert_eq!(infer_media_kind("https://cdn.example.com/card.png"), MediaKind::Image);
        assert_eq!(infer_media_kind("https://cdn.example.com/photo.JPEG"), MediaKind::Image);
    }

    #[test]
    fn video_and_document_extensions() {
        assert_eq!(infer_media_kind("https://x/intro.mp4"), MediaKind::Video);
        assert_eq!(infer_media_kind("https://x/itinerary.pdf"), MediaKind::Document);
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(
            infer_media_kind("https://x/card.pdf?token=abc.def"),
            MediaKind::Document
        );
    }

    #[test]
    fn unknown_extension_defaults_to_image() {
        assert_eq!(infer_media_kind("https://x/attachment"), MediaKind::Image);
        assert_eq!(infer_media_kind("https://x/card.bin"), MediaKind::Image);
    }
}
