//! Waveform QC common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the wqc-core modules:
//! - Identifier newtypes for masks, channels, segments, and provenance stamps
//! - The unified error type with stable numeric codes

pub mod error;
pub mod id;

pub use error::{Error, Result};
pub use id::{ChannelId, CreationInfoId, MaskId, SegmentId};
