//! Decoding and validation of uploaded media.
//!
//! Both decoders are CPU-bound; callers on an async runtime should run them
//! on the blocking pool.

use std::io::Cursor;

use image::ImageFormat;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;
use triage_core::{AgentError, MediaKind};

const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded image that decoded successfully.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Original encoded bytes, forwarded to the pipeline unchanged.
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    /// MIME type of the encoded bytes.
    pub fn mime(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Decodes `bytes` as an image, sniffing the format from its content.
pub fn decode_image(bytes: Vec<u8>) -> Result<DecodedImage, AgentError> {
    let format = image::guess_format(&bytes).map_err(|e| AgentError::decode(MediaKind::Image, e))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| AgentError::decode(MediaKind::Image, e))?;

    debug!(?format, width = decoded.width(), height = decoded.height(), "decoded image");
    Ok(DecodedImage {
        width: decoded.width(),
        height: decoded.height(),
        format,
        bytes,
    })
}

/// Client-supplied metadata that helps identify an audio container.
#[derive(Debug, Clone, Default)]
pub struct AudioHint {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl AudioHint {
    fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Resolves the MIME type to forward, preferring the declared content type.
    fn mime(&self) -> String {
        let declared = self
            .content_type
            .as_deref()
            .filter(|ct| ct.starts_with("audio/") || ct.starts_with("video/"));
        if let Some(ct) = declared {
            return ct.to_string();
        }

        let by_extension = match self.extension().map(str::to_ascii_lowercase).as_deref() {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("ogg" | "oga") => "audio/ogg",
            Some("flac") => "audio/flac",
            Some("webm") => "audio/webm",
            Some("m4a" | "mp4") => "audio/mp4",
            _ => OCTET_STREAM,
        };
        by_extension.to_string()
    }
}

/// An uploaded audio clip whose container was recognized.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Original encoded bytes, forwarded to the pipeline unchanged.
    pub bytes: Vec<u8>,
    pub mime: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub duration_secs: Option<f64>,
}

/// Probes `bytes` as an audio container and checks it carries an audio track.
pub fn decode_audio(bytes: Vec<u8>, hint: &AudioHint) -> Result<DecodedAudio, AgentError> {
    let mut probe_hint = Hint::new();
    if let Some(ct) = hint.content_type.as_deref() {
        probe_hint.mime_type(ct);
    }
    if let Some(ext) = hint.extension() {
        probe_hint.with_extension(ext);
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.clone())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(&probe_hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AgentError::decode(MediaKind::Audio, e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AgentError::decode(MediaKind::Audio, "no audio track found"))?;

    let params = &track.codec_params;
    let sample_rate = params.sample_rate;
    let duration_secs = match (params.n_frames, sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / f64::from(rate)),
        _ => None,
    };

    let audio = DecodedAudio {
        mime: hint.mime(),
        sample_rate,
        channels: params.channels.map(|c| c.count()),
        duration_secs,
        bytes,
    };
    debug!(mime = %audio.mime, sample_rate = ?audio.sample_rate, duration_secs = ?audio.duration_secs, "decoded audio");
    Ok(audio)
}
