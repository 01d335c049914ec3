//! Custom buzzer sound, stored inline as a base64 data URL

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::MediaError;

/// A user supplied alert sound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerSound {
    pub name: String,
    /// `data:<mime>;base64,<payload>`
    pub src: String,
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" | "oga" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

impl BuzzerSound {
    pub fn from_bytes(name: impl Into<String>, mime: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            src: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        }
    }

    /// Read an audio file and embed it.
    pub fn from_file(path: &Path) -> Result<Self, MediaError> {
        let mime = mime_for(path)
            .ok_or_else(|| MediaError::UnsupportedFormat(path.display().to_string()))?;
        let bytes = std::fs::read(path)
            .map_err(|e| MediaError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Custom Buzzer".to_string());
        Ok(Self::from_bytes(name, mime, &bytes))
    }

    /// MIME type declared in the data URL.
    pub fn mime(&self) -> Option<&str> {
        let rest = self.src.strip_prefix("data:")?;
        let (mime, _) = rest.split_once(";base64,")?;
        Some(mime)
    }

    /// Decode the embedded audio.
    pub fn decode(&self) -> Result<Vec<u8>, MediaError> {
        let payload = self
            .src
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, payload)| payload)
            .ok_or_else(|| MediaError::UnsupportedFormat(format!("{} is not a base64 data URL", self.name)))?;
        STANDARD
            .decode(payload)
            .map_err(|e| MediaError::UnsupportedFormat(format!("{}: {}", self.name, e)))
    }

    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.src.is_empty()
    }
}
