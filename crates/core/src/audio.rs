//! Audio domain types shared by the ASR and TTS paths.

use serde::{Deserialize, Serialize};

/// The audio container formats the gateway accepts and emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    M4a,
}

impl AudioFormat {
    /// The canonical MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
        }
    }

    /// Resolve an uploaded MIME type to a format. Accepts the common
    /// aliases browsers and recording apps actually send.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(AudioFormat::Wav),
            "audio/mpeg" | "audio/mp3" => Some(AudioFormat::Mp3),
            "audio/mp4" | "audio/x-m4a" | "audio/m4a" => Some(AudioFormat::M4a),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "m4a" => Ok(AudioFormat::M4a),
            other => Err(format!("unknown audio format: {other}")),
        }
    }
}

/// The outcome of one transcription call. Ephemeral — produced by the ASR
/// adapter, consumed by the caller, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Transcribed text. May be empty — silence is a valid recording.
    pub text: String,
    /// Format of the source audio as declared by the caller.
    pub format: AudioFormat,
    /// Size of the source audio payload in bytes.
    pub size_bytes: usize,
    /// Duration if the collaborator reported one.
    pub duration_seconds: Option<f64>,
}

/// The outcome of one synthesis call. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio bytes as returned by the collaborator.
    pub audio: Vec<u8>,
    /// Declared output format (always WAV for the current synthesis path).
    pub format: AudioFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_resolution() {
        assert_eq!(AudioFormat::from_mime("audio/wav"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_mime("audio/x-wav"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_mime("audio/mpeg"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_mime("audio/x-m4a"), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_mime("video/mp4"), None);
    }

    #[test]
    fn format_roundtrip_via_str() {
        for fmt in [AudioFormat::Wav, AudioFormat::Mp3, AudioFormat::M4a] {
            let parsed: AudioFormat = fmt.to_string().parse().unwrap();
            assert_eq!(parsed, fmt);
        }
        assert!("ogg".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn format_serializes_lowercase() {
        let json = serde_json::to_string(&AudioFormat::M4a).unwrap();
        assert_eq!(json, "\"m4a\"");
    }

    #[test]
    fn empty_transcription_is_representable() {
        let result = TranscriptionResult {
            text: String::new(),
            format: AudioFormat::Wav,
            size_bytes: 1024,
            duration_seconds: None,
        };
        assert!(result.text.is_empty());
        assert_eq!(result.size_bytes, 1024);
    }
}
