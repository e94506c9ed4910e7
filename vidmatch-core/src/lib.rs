//! # vidmatch-core
//!
//! Core types and utilities for the vidmatch fingerprinting library.
//!
//! This crate provides the building blocks shared by all vidmatch components:
//! - Error handling types
//! - Frame and audio buffer abstractions
//! - Feature vectors and their serialization contract

pub mod audio;
pub mod error;
pub mod frame;
pub mod vector;

pub use audio::AudioBuffer;
pub use error::{Error, Result};
pub use frame::Frame;
pub use vector::{fit_dimension, FeatureRecord, FeatureVector, MetaValue, Metadata};
