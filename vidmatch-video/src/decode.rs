//! Media decode seam.
//!
//! The processor never talks to a codec directly; it goes through the
//! [`MediaDecoder`] trait. The default implementation shells out to the
//! `ffmpeg`/`ffprobe` CLIs, decoding video as a scaled rawvideo stream and
//! demuxing audio through a temporary WAV file that is removed on every exit
//! path. Tests substitute an in-memory decoder.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use vidmatch_core::{AudioBuffer, Frame};

use crate::error::{Result, VideoError};

/// Probed stream information for a media file.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Video width in pixels (0 when no video stream).
    pub width: u32,
    /// Video height in pixels (0 when no video stream).
    pub height: u32,
    /// Average frame rate.
    pub fps: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Total video frame count (estimated from fps when the container does
    /// not carry it).
    pub frame_count: u64,
    /// Whether an audio stream is present.
    pub has_audio: bool,
}

/// Abstraction over media decoding.
pub trait MediaDecoder {
    /// Probe container/stream metadata.
    fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Decode the video stream to RGB frames, scaled to `target_width`
    /// (height follows the aspect ratio). Frames are returned in decode
    /// order.
    fn read_frames(&self, path: &Path, target_width: u32) -> Result<Vec<Frame>>;

    /// Demux and resample the audio track to mono PCM at `sample_rate`.
    fn read_audio(&self, path: &Path, sample_rate: u32) -> Result<AudioBuffer>;
}

/// CLI-backed decoder using `ffmpeg` and `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDecoder;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_rate(rate: &str) -> f64 {
    // ffprobe reports rates as "num/den"
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(0.0);
            let den: f64 = den.parse().unwrap_or(1.0);
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => rate.parse().unwrap_or(0.0),
    }
}

impl FfmpegDecoder {
    fn run_probe(&self, path: &Path) -> Result<ProbeOutput> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("stream=codec_type,width,height,avg_frame_rate,nb_frames")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("json")
            .arg(path)
            .output()
            .map_err(|e| VideoError::DecoderFailed(format!("failed to spawn ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(VideoError::DecoderFailed(format!(
                "ffprobe could not open {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| VideoError::DecoderFailed(format!("unreadable ffprobe output: {e}")))
    }
}

impl MediaDecoder for FfmpegDecoder {
    fn probe(&self, path: &Path) -> Result<MediaInfo> {
        if !path.exists() {
            return Err(VideoError::NotFound(path.to_path_buf()));
        }

        let probe = self.run_probe(path)?;
        let duration = probe
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let mut info = MediaInfo {
            width: 0,
            height: 0,
            fps: 0.0,
            duration,
            frame_count: 0,
            has_audio: false,
        };

        for stream in &probe.streams {
            match stream.codec_type.as_deref() {
                Some("video") if info.width == 0 => {
                    info.width = stream.width.unwrap_or(0);
                    info.height = stream.height.unwrap_or(0);
                    info.fps = stream
                        .avg_frame_rate
                        .as_deref()
                        .map(parse_rate)
                        .unwrap_or(0.0);
                    info.frame_count = stream
                        .nb_frames
                        .as_deref()
                        .and_then(|n| n.parse::<u64>().ok())
                        .unwrap_or_else(|| (info.fps * duration).round() as u64);
                }
                Some("audio") => info.has_audio = true,
                _ => {}
            }
        }

        debug!(
            path = %path.display(),
            width = info.width,
            fps = info.fps,
            frames = info.frame_count,
            has_audio = info.has_audio,
            "probed media"
        );
        Ok(info)
    }

    fn read_frames(&self, path: &Path, target_width: u32) -> Result<Vec<Frame>> {
        if !path.exists() {
            return Err(VideoError::NotFound(path.to_path_buf()));
        }
        let info = self.probe(path)?;
        if info.width == 0 || info.height == 0 {
            return Err(VideoError::MissingStream("no video stream".into()));
        }

        let width = target_width.min(info.width).max(2);
        let height = ((info.height as u64 * width as u64 / info.width as u64) as u32).max(2);

        let output = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-vf")
            .arg(format!("scale={width}:{height}"))
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("pipe:1")
            .output()
            .map_err(|e| VideoError::DecoderFailed(format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(VideoError::DecoderFailed(format!(
                "ffmpeg could not decode {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let frame_bytes = width as usize * height as usize * 3;
        let mut frames = Vec::with_capacity(output.stdout.len() / frame_bytes);
        for chunk in output.stdout.chunks_exact(frame_bytes) {
            // chunk length is exact, so Frame::new cannot fail here
            if let Ok(frame) = Frame::new(chunk.to_vec(), width, height, 3) {
                frames.push(frame);
            }
        }

        if frames.is_empty() {
            return Err(VideoError::DecoderFailed(format!(
                "decoded zero frames from {}",
                path.display()
            )));
        }
        debug!(count = frames.len(), width, height, "decoded frames");
        Ok(frames)
    }

    fn read_audio(&self, path: &Path, sample_rate: u32) -> Result<AudioBuffer> {
        if !path.exists() {
            return Err(VideoError::NotFound(path.to_path_buf()));
        }

        // The guard removes the temp file on every exit path, including
        // errors.
        let temp = tempfile::Builder::new()
            .prefix("vidmatch-audio-")
            .suffix(".wav")
            .tempfile()?;
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-vn")
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg(sample_rate.to_string())
            .arg("-f")
            .arg("wav")
            .arg(temp.path())
            .output()
            .map_err(|e| VideoError::DecoderFailed(format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(VideoError::DecoderFailed(format!(
                "ffmpeg could not demux audio from {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let audio = read_wav(temp.path())?;
        if audio.samples.is_empty() {
            return Err(VideoError::MissingStream(format!(
                "no audio samples in {}",
                path.display()
            )));
        }
        Ok(audio)
    }
}

/// Read a PCM WAV file into an audio buffer, rescaling integer samples to
/// [-1.0, 1.0].
fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| VideoError::DecoderFailed(format!("unreadable demuxed wav: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.unwrap_or(0) as f32 / i16::MAX as f32)
            .collect(),
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.unwrap_or(0.0))
            .collect(),
    };

    Ok(AudioBuffer::from_samples(
        samples,
        spec.channels as usize,
        spec.sample_rate,
    ))
}
