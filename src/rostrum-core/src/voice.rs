//! Voice capabilities: narration of speeches and capture of spoken input.
//!
//! The narrator synthesizes speech with kokoro-tiny, one voice per side of
//! the house. The engine has a strict limit on input length, so text is
//! chunked around sentence boundaries before synthesis and the pieces are
//! joined with short silences. Capture is a capability trait so front ends
//! without a microphone path can substitute typed input or report the
//! capability as absent.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use kokoro_tiny::TtsEngine;
use tracing::debug;

use crate::config::VoicesConfig;
use crate::error::{DebateError, Result};

/// Output sample rate of the synthesis engine.
pub const SAMPLE_RATE: u32 = 24_000;

/// Safe input length for a single synthesis call.
const CHUNK_CHARS: usize = 200;

/// Silence inserted between chunks so sentence endings are not clipped.
const CHUNK_GAP_SECS: f32 = 0.3;

/// Trailing silence after a full narration.
const TAIL_GAP_SECS: f32 = 0.5;

/// Speech synthesis over the configured debate voices.
pub struct Narrator {
    engine: TtsEngine,
    voices: VoicesConfig,
    available: Vec<String>,
    cancelled: AtomicBool,
}

impl Narrator {
    /// Initializes the synthesis engine (downloads the model on first run).
    pub async fn new(voices: VoicesConfig) -> Result<Self> {
        let engine = TtsEngine::new()
            .await
            .map_err(|e| DebateError::Voice(format!("failed to initialize speech engine: {e}")))?;
        let available = engine.voices();
        Ok(Self {
            engine,
            voices,
            available,
            cancelled: AtomicBool::new(false),
        })
    }

    /// Stops any further narration; already synthesized audio is kept.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn validate_voice(&self, voice_id: &str) -> Result<()> {
        if voice_id.is_empty() {
            return Err(DebateError::Voice(format!(
                "voice id cannot be empty; available voices:\n{}",
                self.format_available_voices()
            )));
        }
        if !self.available.iter().any(|v| v == voice_id) {
            return Err(DebateError::Voice(format!(
                "unknown voice '{}'; available voices:\n{}",
                voice_id,
                self.format_available_voices()
            )));
        }
        Ok(())
    }

    /// Checks every configured voice against the engine's list.
    pub fn validate_all(&self) -> Result<()> {
        self.validate_voice(&self.voices.government)?;
        self.validate_voice(&self.voices.opposition)?;
        self.validate_voice(&self.voices.moderator)?;
        Ok(())
    }

    fn format_available_voices(&self) -> String {
        // The engine ships voices for several languages; list only the
        // English ones (American/British, female/male prefixes).
        let mut english: Vec<&String> = self
            .available
            .iter()
            .filter(|v| {
                v.starts_with("af_")
                    || v.starts_with("am_")
                    || v.starts_with("bf_")
                    || v.starts_with("bm_")
            })
            .collect();
        english.sort();
        english
            .iter()
            .map(|v| format!("  - {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Synthesizes `text` in the voice assigned to `team`.
    pub fn narrate_for_team(&mut self, team: &str, text: &str) -> Result<Vec<f32>> {
        let voice = self.voices.for_team(team).to_string();
        self.narrate(text, &voice)
    }

    /// Synthesizes `text` chunk by chunk, joining the pieces with short
    /// silences. Stops with an error if cancellation is requested between
    /// chunks.
    pub fn narrate(&mut self, text: &str, voice_id: &str) -> Result<Vec<f32>> {
        self.validate_voice(voice_id)?;

        let chunks = chunk_text(text, CHUNK_CHARS);
        debug!(voice = voice_id, chunks = chunks.len(), "narrating");

        let gap = silence(CHUNK_GAP_SECS);
        let mut samples = Vec::new();
        for chunk in chunks {
            if self.is_cancelled() {
                return Err(DebateError::Voice("narration cancelled".to_string()));
            }
            if chunk.trim().is_empty() {
                continue;
            }
            let piece = self
                .engine
                .synthesize(&chunk, Some(voice_id))
                .map_err(|e| DebateError::Voice(format!("synthesis failed: {e}")))?;
            samples.extend(piece);
            samples.extend_from_slice(&gap);
        }
        samples.extend(silence(TAIL_GAP_SECS));
        Ok(samples)
    }
}

/// Writes samples as a 16-bit mono WAV at the engine's sample rate.
pub fn export_wav<P: AsRef<Path>>(path: P, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| DebateError::Voice(format!("failed to create WAV file: {e}")))?;
    for &sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(clamped)
            .map_err(|e| DebateError::Voice(format!("failed to write WAV sample: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| DebateError::Voice(format!("failed to finalize WAV file: {e}")))?;
    Ok(())
}

/// Joins narration segments with a silence gap between them.
pub fn combine_segments(segments: Vec<Vec<f32>>, gap_seconds: f32) -> Vec<f32> {
    let gap = silence(gap_seconds);
    let mut combined = Vec::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            combined.extend_from_slice(&gap);
        }
        combined.extend(segment);
    }
    combined
}

/// Filename for an exported debate recording, with the motion title
/// sanitized and truncated.
pub fn output_filename(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(50)
        .collect();
    format!("Rostrum - {}.wav", sanitized.trim())
}

fn silence(seconds: f32) -> Vec<f32> {
    vec![0.0; (seconds * SAMPLE_RATE as f32) as usize]
}

/// Splits text into synthesis-sized chunks on sentence punctuation,
/// falling back to commas when a single sentence overruns the limit.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split_inclusive(&['.', '!', '?', ';'][..]) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        if current.len() + sentence.len() > max_chars {
            if !current.is_empty() {
                chunks.push(current.trim().to_string());
                current = String::new();
            }
            if sentence.len() > max_chars {
                for part in sentence.split_inclusive(',') {
                    if current.len() + part.len() > max_chars && !current.is_empty() {
                        chunks.push(current.trim().to_string());
                        current = String::new();
                    }
                    current.push_str(part);
                    current.push(' ');
                }
                continue;
            }
        }
        current.push_str(sentence);
        current.push(' ');
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

/// Timed capture of spoken (or typed) input from the user.
#[async_trait]
pub trait VoiceCapture: Send {
    /// Captures input for up to `window`, returning the captured text.
    async fn capture(&mut self, window: Duration) -> Result<String>;
}

/// Placeholder for platforms with no capture path.
pub struct UnsupportedCapture;

#[async_trait]
impl VoiceCapture for UnsupportedCapture {
    async fn capture(&mut self, _window: Duration) -> Result<String> {
        Err(DebateError::CapabilityUnavailable("Voice capture"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filename_sanitizes() {
        assert_eq!(
            output_filename("This house would ban single-use plastics."),
            "Rostrum - This house would ban single-use plastics_.wav"
        );
    }

    #[test]
    fn test_output_filename_truncates() {
        let long = "A".repeat(100);
        let filename = output_filename(&long);
        assert!(filename.len() < 70);
    }

    #[test]
    fn test_chunk_text_respects_limit() {
        let text = "First sentence here. Second sentence follows. A third one too.";
        let chunks = chunk_text(text, 30);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= 35, "oversized chunk: {chunk}");
        }
    }

    #[test]
    fn test_chunk_text_splits_long_sentence_on_commas() {
        let text = "one clause, two clause, three clause, four clause, five clause, six clause";
        let chunks = chunk_text(text, 30);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn test_combine_segments_inserts_gap() {
        let combined = combine_segments(vec![vec![1.0, 1.0], vec![2.0, 2.0]], 0.5);
        let gap_len = (0.5 * SAMPLE_RATE as f32) as usize;
        assert_eq!(combined.len(), 4 + gap_len);
        assert_eq!(combined[2], 0.0);
    }

    #[test]
    fn test_export_wav_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        export_wav(&path, &[0.0, 0.5, -0.5, 2.0]).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len(), 4);
    }

    #[tokio::test]
    async fn test_unsupported_capture_reports_absence() {
        let mut capture = UnsupportedCapture;
        let err = capture.capture(Duration::from_secs(1)).await.unwrap_err();
        assert!(err.to_string().contains("not available on this device"));
    }
}
