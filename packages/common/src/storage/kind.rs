use std::fmt;

use serde::{Deserialize, Serialize};

/// Media kind of a stored blob, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `image/*` or `video/*`; `None` for any other type.
    pub fn classify(mime_type: &str) -> Option<Self> {
        let essence = mime_type.trim().to_ascii_lowercase();
        if essence.starts_with("video/") {
            Some(Self::Video)
        } else if essence.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Kind recorded for a stored blob. Callers gate uploads with
    /// [`MediaKind::classify`]; anything unclassified is recorded as an image.
    pub fn from_mime(mime_type: &str) -> Self {
        Self::classify(mime_type).unwrap_or(Self::Image)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level folder a blob is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobCategory {
    Media,
    Infographics,
}

impl BlobCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::Infographics => "infographics",
        }
    }
}

impl fmt::Display for BlobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
