//! End-to-end pipeline integration tests.
//!
//! Runs the full extract → serialize → index → search cycle against
//! synthetic media served by an in-memory decoder.

use std::path::Path;

use vidmatch::{
    compare_features, AudioBuffer, ExtractorKind, FeaturePipeline, FeatureRecord, FeatureVector,
    Frame, MediaDecoder, MediaInfo, PipelineConfig, SimilarityIndex, VideoProcessor,
};
use vidmatch_video::Result as VideoResult;

/// Serves `frame_count` frames of a moving gradient plus a sine tone whose
/// frequency is derived from the requested path, so distinct "files" yield
/// distinct content.
struct SyntheticDecoder {
    frame_count: usize,
    tone_hz: f32,
    brightness: u8,
}

impl SyntheticDecoder {
    fn new(tone_hz: f32, brightness: u8) -> Self {
        Self {
            frame_count: 90,
            tone_hz,
            brightness,
        }
    }
}

impl MediaDecoder for SyntheticDecoder {
    fn probe(&self, _path: &Path) -> VideoResult<MediaInfo> {
        Ok(MediaInfo {
            width: 48,
            height: 48,
            fps: 30.0,
            duration: self.frame_count as f64 / 30.0,
            frame_count: self.frame_count as u64,
            has_audio: true,
        })
    }

    fn read_frames(&self, _path: &Path, _target_width: u32) -> VideoResult<Vec<Frame>> {
        Ok((0..self.frame_count)
            .map(|i| {
                let mut data = Vec::with_capacity(48 * 48 * 3);
                for y in 0..48u32 {
                    for x in 0..48u32 {
                        let base = self.brightness as u32;
                        let v = ((x * 3 + y * 2 + i as u32 * 4 + base) % 256) as u8;
                        data.extend_from_slice(&[v, v / 2, 255 - v]);
                    }
                }
                Frame::new(data, 48, 48, 3).unwrap()
            })
            .collect())
    }

    fn read_audio(&self, _path: &Path, sample_rate: u32) -> VideoResult<AudioBuffer> {
        let samples = (0..sample_rate * 2)
            .map(|i| {
                (2.0 * std::f32::consts::PI * self.tone_hz * i as f32 / sample_rate as f32).sin()
                    * 0.4
            })
            .collect();
        Ok(AudioBuffer::from_samples(samples, 1, sample_rate))
    }
}

fn pipeline_with(decoder: SyntheticDecoder) -> FeaturePipeline<SyntheticDecoder> {
    let config = PipelineConfig::default();
    let processor = VideoProcessor::with_decoder(config.processor.clone(), decoder);
    FeaturePipeline::with_processor(config, processor).unwrap()
}

#[test]
fn test_full_feature_map_shape() {
    let pipeline = pipeline_with(SyntheticDecoder::new(440.0, 0));
    let map = pipeline
        .extract_features_from_video(Path::new("clip-a.mp4"), Some("clip-a"))
        .unwrap();

    for key in [
        "visual_embedding",
        "visual_dhash",
        "visual_motion",
        "audio_mfcc",
        "audio_fingerprint",
        "audio_stats",
        "combined_visual",
        "combined_audio",
        "combined",
    ] {
        assert!(map.contains_key(key), "missing entry: {key}");
    }
    assert_eq!(map["visual_embedding"].dim(), 2048);
    assert_eq!(map["visual_dhash"].dim(), 64);
    assert_eq!(map["audio_fingerprint"].dim(), 256);
}

#[test]
fn test_single_extractor_modalities_still_fused() {
    let config = PipelineConfig {
        extractors: vec![ExtractorKind::Dhash, ExtractorKind::Mfcc],
        ..Default::default()
    };
    let processor =
        VideoProcessor::with_decoder(config.processor.clone(), SyntheticDecoder::new(440.0, 0));
    let pipeline = FeaturePipeline::with_processor(config, processor).unwrap();

    let map = pipeline
        .extract_features_from_video(Path::new("a.mp4"), None)
        .unwrap();

    assert!(map.contains_key("visual_dhash"));
    assert!(map.contains_key("audio_mfcc"));
    // Per-modality fusion entries appear even with one extractor per side.
    assert!(map.contains_key("combined_visual"));
    assert!(map.contains_key("combined_audio"));
    // Fusing a single vector returns that vector's values unchanged.
    assert_eq!(
        map["combined_visual"].values(),
        map["visual_dhash"].values()
    );
    assert_eq!(map["combined_audio"].values(), map["audio_mfcc"].values());
}

#[test]
fn test_records_round_trip_through_json() {
    let pipeline = pipeline_with(SyntheticDecoder::new(440.0, 0));
    let map = pipeline
        .extract_features_from_video(Path::new("clip-a.mp4"), Some("clip-a"))
        .unwrap();

    for (key, vector) in &map {
        let json = serde_json::to_string(&vector.to_record()).unwrap();
        let record: FeatureRecord = serde_json::from_str(&json).unwrap();
        let restored = FeatureVector::from_record(record);

        assert_eq!(restored.values(), vector.values(), "values diverged for {key}");
        assert_eq!(restored.metadata(), vector.metadata(), "metadata diverged for {key}");
    }
}

#[test]
fn test_search_recovers_matching_clip() {
    let a = pipeline_with(SyntheticDecoder::new(440.0, 0))
        .extract_features_from_video(Path::new("a.mp4"), Some("a"))
        .unwrap();
    let b = pipeline_with(SyntheticDecoder::new(1760.0, 120))
        .extract_features_from_video(Path::new("b.mp4"), Some("b"))
        .unwrap();

    let mut index = SimilarityIndex::new();
    index.insert("a", a["audio_fingerprint"].clone()).unwrap();
    index.insert("b", b["audio_fingerprint"].clone()).unwrap();

    let hits = index.search(&a["audio_fingerprint"], 0.0, 10).unwrap();
    assert_eq!(hits[0].id, "a");
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn test_compare_features_self_and_symmetry() {
    let map = pipeline_with(SyntheticDecoder::new(440.0, 0))
        .extract_features_from_video(Path::new("a.mp4"), None)
        .unwrap();

    let embedding = &map["visual_embedding"];
    let dhash = &map["visual_dhash"];

    assert!((compare_features(embedding, embedding).unwrap() - 1.0).abs() < 1e-5);
    assert!(compare_features(embedding, dhash).is_err());

    let other = &map["combined_visual"];
    assert_eq!(
        compare_features(dhash, other).unwrap(),
        compare_features(other, dhash).unwrap()
    );
}
