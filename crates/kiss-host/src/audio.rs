//! Microphone recording to WAV.
//!
//! Audio is captured as raw 16-bit little-endian stereo PCM from an external
//! recorder (`arecord` or sox's `rec`) and wrapped in a WAV container with
//! `hound`. The finished file is read back to verify its duration.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::process::Tool;
use crate::{HostError, Result};

/// Sample rate of every recording, in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Channel count of every recording.
pub const CHANNELS: u16 = 2;

/// Bits per sample.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Durations, in seconds, an operator may choose from.
pub const RECORD_DURATIONS: [u32; 3] = [5, 15, 30];

/// Allowed gap between requested and recorded duration.
pub const DURATION_TOLERANCE_SECS: f64 = 1.0;

/// Recorders, in order of preference.
const BACKENDS: &[&str] = &["arecord", "rec"];

/// Check that `secs` is one of [`RECORD_DURATIONS`].
pub fn offered_duration(secs: u32) -> Result<u32> {
    if RECORD_DURATIONS.contains(&secs) {
        Ok(secs)
    } else {
        Err(HostError::DurationNotOffered(secs))
    }
}

/// A finished recording on disk.
///
/// The WAV file is removed when this value is dropped.
#[derive(Debug)]
pub struct Recording {
    file: NamedTempFile,
    requested_secs: u32,
    actual_secs: f64,
}

impl Recording {
    /// Path to the WAV file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Duration the operator asked for.
    pub fn requested_secs(&self) -> u32 {
        self.requested_secs
    }

    /// Duration decoded from the written file.
    pub fn actual_secs(&self) -> f64 {
        self.actual_secs
    }

    /// Whether the recorded length is off by more than the tolerance.
    pub fn duration_mismatch(&self) -> bool {
        (self.actual_secs - f64::from(self.requested_secs)).abs() > DURATION_TOLERANCE_SECS
    }
}

/// Records audio from the default input device.
#[derive(Debug, Clone)]
pub struct Recorder {
    tool: Tool,
}

impl Recorder {
    /// Find a usable recorder.
    ///
    /// # Errors
    ///
    /// Returns `HostError::ToolNotFound` if neither `arecord` nor `rec` is in PATH.
    pub fn detect() -> Result<Self> {
        let tool = Tool::first_of(BACKENDS).ok_or(HostError::ToolNotFound("audio recording"))?;
        info!(tool = tool.name, "audio recording backend selected");
        Ok(Self { tool })
    }

    /// Name of the selected tool.
    pub fn backend(&self) -> &'static str {
        self.tool.name
    }

    /// Record `secs` seconds of stereo audio. Blocks for the whole duration.
    ///
    /// # Errors
    ///
    /// Returns `HostError::DurationNotOffered` for durations outside
    /// [`RECORD_DURATIONS`], or any recorder/encoding failure.
    pub fn record(&self, secs: u32) -> Result<Recording> {
        let secs = offered_duration(secs)?;
        info!(tool = self.tool.name, secs, "recording audio");

        let args = record_args(self.tool.name, secs);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let raw = self.tool.run_checked(&args)?;

        let samples = pcm_samples(&raw);
        if samples.is_empty() {
            return Err(HostError::EmptyCapture(self.tool.name.to_string()));
        }

        let file = tempfile::Builder::new()
            .prefix("kiss-recording-")
            .suffix(".wav")
            .tempfile()?;
        write_wav(file.path(), &samples)?;
        let actual_secs = wav_duration_secs(file.path())?;

        let recording = Recording {
            file,
            requested_secs: secs,
            actual_secs,
        };
        if recording.duration_mismatch() {
            warn!(
                expected = secs,
                actual = actual_secs,
                "recording duration mismatch"
            );
        } else {
            debug!(secs, actual = actual_secs, "recording complete");
        }
        Ok(recording)
    }
}

/// Arguments that make `tool` write `secs` seconds of raw PCM to stdout.
fn record_args(tool: &str, secs: u32) -> Vec<String> {
    let rate = SAMPLE_RATE.to_string();
    let channels = CHANNELS.to_string();
    let secs = secs.to_string();

    let args: Vec<&str> = match tool {
        "rec" => vec![
            "-q", "-t", "raw", "-b", "16", "-e", "signed-integer", "-L", "-c", &channels, "-r",
            &rate, "-", "trim", "0", &secs,
        ],
        _ => vec![
            "-q", "-t", "raw", "-f", "S16_LE", "-c", &channels, "-r", &rate, "-d", &secs, "-",
        ],
    };
    args.into_iter().map(str::to_string).collect()
}

/// Decode raw little-endian 16-bit PCM, dropping any incomplete frame.
pub fn pcm_samples(raw: &[u8]) -> Vec<i16> {
    let frame_bytes = usize::from(CHANNELS) * 2;
    let usable = raw.len() - raw.len() % frame_bytes;

    raw[..usable]
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Write interleaved stereo samples as a 16-bit PCM WAV file.
pub fn write_wav(path: &Path, samples: &[i16]) -> Result<()> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Duration of a WAV file in seconds.
pub fn wav_duration_secs(path: &Path) -> Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_of(secs: u32, actual: f64) -> Recording {
        Recording {
            file: NamedTempFile::new().unwrap(),
            requested_secs: secs,
            actual_secs: actual,
        }
    }

    #[test]
    fn test_offered_duration() {
        for secs in RECORD_DURATIONS {
            assert_eq!(offered_duration(secs).unwrap(), secs);
        }
        assert!(matches!(
            offered_duration(7),
            Err(HostError::DurationNotOffered(7))
        ));
        assert!(offered_duration(0).is_err());
    }

    #[test]
    fn test_pcm_samples_drops_partial_frame() {
        // one full stereo frame plus three stray bytes
        let raw = [0x01, 0x00, 0xff, 0xff, 0x10, 0x20, 0x30];
        assert_eq!(pcm_samples(&raw), vec![1, -1]);
        assert!(pcm_samples(&[0x01]).is_empty());
    }

    #[test]
    fn test_wav_duration_matches_frames() {
        let file = NamedTempFile::new().unwrap();
        let frames = SAMPLE_RATE as usize * 2;
        let samples = vec![0i16; frames * usize::from(CHANNELS)];

        write_wav(file.path(), &samples).unwrap();

        let secs = wav_duration_secs(file.path()).unwrap();
        assert!((secs - 2.0).abs() < f64::EPSILON);

        let reader = WavReader::open(file.path()).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44_100);
        assert_eq!(reader.spec().bits_per_sample, 16);
    }

    #[test]
    fn test_duration_mismatch_tolerance() {
        assert!(!recording_of(5, 5.0).duration_mismatch());
        assert!(!recording_of(5, 4.2).duration_mismatch());
        assert!(!recording_of(15, 16.0).duration_mismatch());
        assert!(recording_of(15, 13.5).duration_mismatch());
        assert!(recording_of(30, 0.0).duration_mismatch());
    }

    #[test]
    fn test_record_args() {
        let args = record_args("arecord", 5);
        assert!(args.windows(2).any(|w| w == ["-d", "5"]));
        assert!(args.windows(2).any(|w| w == ["-r", "44100"]));
        assert_eq!(args.last().map(String::as_str), Some("-"));

        let args = record_args("rec", 15);
        assert!(args.ends_with(&["trim".to_string(), "0".to_string(), "15".to_string()]));
    }

    #[test]
    fn test_recording_reports_requested_secs() {
        let recording = recording_of(15, 14.8);
        assert_eq!(recording.requested_secs(), 15);
        assert!((recording.actual_secs() - 14.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_detected_backend_is_known() {
        // hosts without a recorder are covered by ToolNotFound
        match Recorder::detect() {
            Ok(recorder) => assert!(BACKENDS.contains(&recorder.backend())),
            Err(e) => assert!(matches!(e, HostError::ToolNotFound(_))),
        }
    }

    #[test]
    fn test_recording_removed_on_drop() {
        let recording = recording_of(5, 5.0);
        let path = recording.path().to_path_buf();
        assert!(path.exists());
        drop(recording);
        assert!(!path.exists());
    }
}
