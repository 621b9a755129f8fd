use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::FILE_UPLOAD_MAX_SIZE;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// An uploaded file (usually an image) as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeapcellFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    meta: FileMeta,
}

impl LeapcellFile {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn width(&self) -> u32 {
        self.meta.width
    }

    pub fn height(&self) -> u32 {
        self.meta.height
    }
}

impl fmt::Display for LeapcellFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LeapcellFile(id={}, link={}, width={}, height={})",
            self.id, self.link, self.meta.width, self.meta.height
        )
    }
}

/// One file in a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Bytes,
}

impl FilePart {
    /// Wraps a payload, rejecting anything above [`FILE_UPLOAD_MAX_SIZE`].
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > FILE_UPLOAD_MAX_SIZE {
            return Err(Error::FileTooLarge {
                size: bytes.len(),
                max: FILE_UPLOAD_MAX_SIZE,
            });
        }
        Ok(Self {
            file_name: file_name.into(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_meta_defaults_to_zero() {
        let file: LeapcellFile =
            serde_json::from_value(json!({"id": "img1", "link": "https://x/img1"})).unwrap();
        assert_eq!(file.width(), 0);
        assert_eq!(
            file.to_string(),
            "LeapcellFile(id=img1, link=https://x/img1, width=0, height=0)"
        );
    }

    #[test]
    fn rejects_oversized_parts() {
        let err = FilePart::new("big", vec![0u8; FILE_UPLOAD_MAX_SIZE + 1]).unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { .. }));
        assert!(FilePart::new("ok", vec![0u8; 16]).is_ok());
    }
}
