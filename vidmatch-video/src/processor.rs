//! The video processor: turns a media file into the raw signal streams the
//! extractors consume (sampled frames, scene intervals, keyframes, mono
//! audio).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vidmatch_core::{AudioBuffer, Frame};

use crate::decode::{FfmpegDecoder, MediaDecoder};
use crate::error::{Result, VideoError};
use crate::scene::{segment_scenes, SceneConfig, SceneSpan};

/// Fallback frame rate when the container does not report one.
const DEFAULT_FPS: f64 = 30.0;

/// Processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoProcessorConfig {
    /// Target sampling rate in frames per second for frame extraction.
    pub sample_fps: f64,
    /// Width frames are scaled to for analysis (height follows aspect).
    pub analysis_width: u32,
    /// Sample rate audio is resampled to, in Hz.
    pub audio_sample_rate: u32,
    /// Scene detection settings.
    pub scene: SceneConfig,
}

impl Default for VideoProcessorConfig {
    fn default() -> Self {
        Self {
            sample_fps: 1.0,
            analysis_width: 320,
            audio_sample_rate: 22050,
            scene: SceneConfig::default(),
        }
    }
}

/// A scene interval in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneInterval {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Cut confidence in [0, 1].
    pub confidence: f64,
}

/// Converts video files into frames, scenes, keyframes and audio.
#[derive(Debug)]
pub struct VideoProcessor<D: MediaDecoder = FfmpegDecoder> {
    config: VideoProcessorConfig,
    decoder: D,
}

impl VideoProcessor<FfmpegDecoder> {
    /// Create a processor backed by the ffmpeg CLI decoder.
    pub fn new(config: VideoProcessorConfig) -> Self {
        Self {
            config,
            decoder: FfmpegDecoder,
        }
    }
}

impl Default for VideoProcessor<FfmpegDecoder> {
    fn default() -> Self {
        Self::new(VideoProcessorConfig::default())
    }
}

impl<D: MediaDecoder> VideoProcessor<D> {
    /// Create a processor with a custom decoder.
    pub fn with_decoder(config: VideoProcessorConfig, decoder: D) -> Self {
        Self { config, decoder }
    }

    /// Processor configuration.
    pub fn config(&self) -> &VideoProcessorConfig {
        &self.config
    }

    /// Extract an ordered sequence of RGB frames.
    ///
    /// With `uniform_sampling` and more source frames than `max_frames`,
    /// indices follow the configured `sample_fps` rate when that yields at
    /// most `max_frames`, and are otherwise spaced evenly across the full
    /// duration. Without sampling, frames are read sequentially and
    /// decimated by the rate. Selected indices are always strictly
    /// increasing.
    pub fn extract_frames(
        &self,
        path: &Path,
        max_frames: usize,
        uniform_sampling: bool,
    ) -> Result<Vec<Frame>> {
        if max_frames == 0 {
            return Err(VideoError::InvalidParameter("max_frames must be > 0".into()));
        }

        let info = self.decoder.probe(path)?;
        let frames = self.decoder.read_frames(path, self.config.analysis_width)?;
        let total = frames.len();
        let fps = if info.fps > 0.0 { info.fps } else { DEFAULT_FPS };

        let indices = select_frame_indices(total, max_frames, fps, self.config.sample_fps, uniform_sampling);
        debug!(total, selected = indices.len(), uniform_sampling, "sampled frames");

        let mut frames = frames;
        let mut selected = Vec::with_capacity(indices.len());
        // Walk indices back-to-front so each swap_remove leaves earlier
        // indices valid.
        for &idx in indices.iter().rev() {
            selected.push(frames.swap_remove(idx));
        }
        selected.reverse();
        Ok(selected)
    }

    /// Detect scene boundaries, returning ordered, non-overlapping
    /// intervals covering the video duration. When `save_dir` is given, one
    /// representative midpoint image per scene is written there.
    pub fn detect_scenes(&self, path: &Path, save_dir: Option<&Path>) -> Result<Vec<SceneInterval>> {
        let info = self.decoder.probe(path)?;
        let frames = self.decoder.read_frames(path, self.config.analysis_width)?;
        let spans = segment_scenes(&frames, self.config.scene.clone())?;

        let duration = if info.duration > 0.0 {
            info.duration
        } else {
            frames.len() as f64 / DEFAULT_FPS
        };
        let seconds_per_frame = duration / frames.len() as f64;

        if let Some(dir) = save_dir {
            std::fs::create_dir_all(dir)?;
            for (i, span) in spans.iter().enumerate() {
                let frame = &frames[span.midpoint_frame()];
                save_frame_image(frame, &dir.join(format!("scene_{i:04}.png")))?;
            }
        }

        let mut intervals: Vec<SceneInterval> = spans
            .iter()
            .map(|span| SceneInterval {
                start: span.start_frame as f64 * seconds_per_frame,
                end: (span.end_frame + 1) as f64 * seconds_per_frame,
                confidence: span.confidence,
            })
            .collect();
        // Rounding must not leave a gap at the tail.
        if let Some(last) = intervals.last_mut() {
            last.end = duration;
        }

        info!(scenes = intervals.len(), duration, "detected scenes");
        Ok(intervals)
    }

    /// Extract at most `max_keyframes` representative frames, one per
    /// selected scene, each taken at the scene's temporal midpoint.
    pub fn extract_keyframes(&self, path: &Path, max_keyframes: usize) -> Result<Vec<Frame>> {
        if max_keyframes == 0 {
            return Err(VideoError::InvalidParameter("max_keyframes must be > 0".into()));
        }

        let frames = self.decoder.read_frames(path, self.config.analysis_width)?;
        let spans = segment_scenes(&frames, self.config.scene.clone())?;
        let selected = select_spans(&spans, max_keyframes);

        Ok(selected
            .iter()
            .map(|span| frames[span.midpoint_frame()].clone())
            .collect())
    }

    /// Demux the audio track to mono PCM at the configured sample rate.
    pub fn extract_audio(&self, path: &Path) -> Result<AudioBuffer> {
        let audio = self.decoder.read_audio(path, self.config.audio_sample_rate)?;
        if audio.channels > 1 {
            warn!(channels = audio.channels, "decoder returned non-mono audio, downmixing");
            return Ok(audio.to_mono());
        }
        Ok(audio)
    }
}

/// Choose source-frame indices for extraction. Returned indices are
/// strictly increasing.
fn select_frame_indices(
    total: usize,
    max_frames: usize,
    fps: f64,
    sample_fps: f64,
    uniform_sampling: bool,
) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    if total <= max_frames && uniform_sampling {
        return (0..total).collect();
    }

    let step = (fps / sample_fps.max(1e-6)).round().max(1.0) as usize;

    if !uniform_sampling {
        // Sequential read decimated by the configured rate.
        return (0..total).step_by(step).take(max_frames).collect();
    }

    let rate_count = total.div_ceil(step);
    if rate_count <= max_frames {
        (0..total).step_by(step).collect()
    } else if max_frames == 1 {
        vec![0]
    } else {
        // Spread evenly across the full duration.
        (0..max_frames)
            .map(|i| i * (total - 1) / (max_frames - 1))
            .collect()
    }
}

/// Pick at most `max` spans, uniformly across the list when over the cap.
fn select_spans(spans: &[SceneSpan], max: usize) -> Vec<&SceneSpan> {
    if spans.len() <= max {
        return spans.iter().collect();
    }
    if max == 1 {
        return vec![&spans[0]];
    }
    (0..max)
        .map(|i| &spans[i * (spans.len() - 1) / (max - 1)])
        .collect()
}

fn save_frame_image(frame: &Frame, path: &Path) -> Result<()> {
    let img = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| VideoError::InvalidParameter("frame is not RGB".into()))?;
    img.save(path)
        .map_err(|e| VideoError::DecoderFailed(format!("failed to save scene image: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::MediaInfo;

    /// In-memory decoder for tests: `count` frames at 30 fps with a hard
    /// luminance cut halfway through, and one second of audio.
    struct StubDecoder {
        count: usize,
    }

    impl StubDecoder {
        fn frame(&self, index: usize) -> Frame {
            let value = if index < self.count / 2 { 40 } else { 215 };
            Frame::new(vec![value; 32 * 32 * 3], 32, 32, 3).unwrap()
        }
    }

    impl MediaDecoder for StubDecoder {
        fn probe(&self, _path: &Path) -> Result<MediaInfo> {
            Ok(MediaInfo {
                width: 32,
                height: 32,
                fps: 30.0,
                duration: self.count as f64 / 30.0,
                frame_count: self.count as u64,
                has_audio: true,
            })
        }

        fn read_frames(&self, _path: &Path, _target_width: u32) -> Result<Vec<Frame>> {
            Ok((0..self.count).map(|i| self.frame(i)).collect())
        }

        fn read_audio(&self, _path: &Path, sample_rate: u32) -> Result<AudioBuffer> {
            Ok(AudioBuffer::from_samples(
                vec![0.25; sample_rate as usize],
                1,
                sample_rate,
            ))
        }
    }

    fn processor(count: usize) -> VideoProcessor<StubDecoder> {
        let config = VideoProcessorConfig {
            scene: SceneConfig {
                threshold: 0.1,
                min_scene_frames: 1,
                adaptive: false,
                ..Default::default()
            },
            ..Default::default()
        };
        VideoProcessor::with_decoder(config, StubDecoder { count })
    }

    #[test]
    fn test_uniform_sampling_spans_duration() {
        let indices = select_frame_indices(1000, 10, 30.0, 1.0, true);
        assert_eq!(indices.len(), 10);
        assert_eq!(indices[0], 0);
        assert_eq!(*indices.last().unwrap(), 999);
        for pair in indices.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_rate_sampling_when_under_cap() {
        // 90 frames at 30 fps, 1 fps sampling -> 3 frames, under the cap.
        let indices = select_frame_indices(90, 10, 30.0, 1.0, true);
        assert_eq!(indices, vec![0, 30, 60]);
    }

    #[test]
    fn test_sequential_decimation() {
        let indices = select_frame_indices(100, 2, 30.0, 1.0, false);
        assert_eq!(indices, vec![0, 30]);
    }

    #[test]
    fn test_extract_frames_count() {
        let p = processor(1000);
        let frames = p.extract_frames(Path::new("stub.mp4"), 10, true).unwrap();
        assert_eq!(frames.len(), 10);
    }

    #[test]
    fn test_extract_frames_rejects_zero_cap() {
        let p = processor(10);
        assert!(matches!(
            p.extract_frames(Path::new("stub.mp4"), 0, true),
            Err(VideoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_detect_scenes_intervals_cover_duration() {
        let p = processor(60);
        let intervals = p.detect_scenes(Path::new("stub.mp4"), None).unwrap();
        assert!(intervals.len() >= 2);

        assert!(intervals[0].start.abs() < 1e-9);
        let duration = 60.0 / 30.0;
        assert!((intervals.last().unwrap().end - duration).abs() < 1e-9);
        for pair in intervals.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < 1e-9);
            assert!(pair[0].start <= pair[0].end);
        }
    }

    #[test]
    fn test_extract_keyframes_capped() {
        let p = processor(120);
        let keyframes = p.extract_keyframes(Path::new("stub.mp4"), 1).unwrap();
        assert_eq!(keyframes.len(), 1);

        let keyframes = p.extract_keyframes(Path::new("stub.mp4"), 8).unwrap();
        assert!(keyframes.len() <= 8);
        assert!(!keyframes.is_empty());
    }

    #[test]
    fn test_extract_audio_is_mono() {
        let p = processor(30);
        let audio = p.extract_audio(Path::new("stub.mp4")).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 22050);
    }

    #[test]
    fn test_select_spans_uniform() {
        let spans: Vec<SceneSpan> = (0..10)
            .map(|i| SceneSpan {
                start_frame: i * 10,
                end_frame: i * 10 + 9,
                confidence: 1.0,
            })
            .collect();
        let picked = select_spans(&spans, 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].start_frame, 0);
        assert_eq!(picked[2].start_frame, 90);
    }
}
