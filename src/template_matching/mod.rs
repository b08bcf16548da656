/// Template matching module for UI element detection in screenshots
///
/// This module provides:
/// - Zero-mean normalized cross-correlation over RGB frames
/// - Multi-scale search in exhaustive or first-match mode
/// - Multi-reference detection
/// - Mapping of match centers back to device coordinates
/// - Bounding-box overlays for inspection
pub mod config;
mod correlation;
pub mod error;
pub mod matcher;
pub mod overlay;
pub mod types;


pub use config::{MatchConfig, create_inspect_config, create_tap_config, linspace_scales};
pub use error::{MatchError, MatchResult};
pub use matcher::TemplateMatcher;
pub use types::{
    Detections, Frame, MAX_FRAME_PIXELS, Match, MatchMode, Point, Reference, ReferenceMatches,
};
