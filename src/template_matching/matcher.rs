/// Template matching implementation
///
/// Multi-scale normalized correlation search with exhaustive and first-match modes
use super::config::MatchConfig;
use super::correlation::CorrelationSurface;
use super::error::MatchResult;
use super::types::{Detections, Frame, Match, MatchMode, Point, Reference, ReferenceMatches};
use image::RgbImage;
use std::borrow::Cow;

/// Template matcher for finding reference images in captured frames.
///
/// Stateless apart from its configuration; invalid rasters are rejected when
/// the [`Frame`] and [`Reference`] values are built, so searches themselves
/// cannot fail and an empty result always means "not detected".
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    config: MatchConfig,
}

impl TemplateMatcher {
    pub fn new(config: MatchConfig) -> MatchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Search for `reference` using the configured mode
    pub fn find(&self, frame: &Frame, reference: &Reference) -> Vec<Match> {
        self.find_with_mode(frame, reference, self.config.mode)
    }

    /// Search for `reference` at every configured scale, in order.
    ///
    /// Matches are ordered row-major within a scale, scales in configuration
    /// order. In [`MatchMode::FirstMatch`] the walk stops at the first scale
    /// that yields any match and only that scale's matches are returned.
    pub fn find_with_mode(&self, frame: &Frame, reference: &Reference, mode: MatchMode) -> Vec<Match> {
        let mut matches = Vec::new();

        for &scale in &self.config.scales {
            let found = self.match_at_scale(frame.image(), reference, scale);
            if mode == MatchMode::FirstMatch && !found.is_empty() {
                log::debug!(
                    "✅ '{}' found at scale {:.2} ({} matches), skipping remaining scales",
                    reference.name(),
                    scale,
                    found.len()
                );
                return found;
            }
            matches.extend(found);
        }

        if matches.is_empty() {
            log::debug!("'{}' not detected", reference.name());
        }
        matches
    }

    /// Locate several references independently at scale 1.0
    pub fn find_many(&self, frame: &Frame, references: &[Reference]) -> Detections {
        let entries = references
            .iter()
            .map(|reference| ReferenceMatches {
                reference: reference.name().to_string(),
                matches: self.match_at_scale(frame.image(), reference, 1.0),
            })
            .collect();
        Detections { entries }
    }

    /// Device coordinates to tap for a match found in `frame`
    pub fn tap_point(frame: &Frame, found: &Match) -> Point {
        frame.to_source(found.center())
    }

    fn match_at_scale(&self, image: &RgbImage, reference: &Reference, scale: f32) -> Vec<Match> {
        let Some((width, height)) = scaled_dimensions(reference.image(), scale) else {
            log::debug!(
                "⚠️ Skipping scale {:.2} for '{}': resized reference has no pixels",
                scale,
                reference.name()
            );
            return Vec::new();
        };

        // Skip before resizing if the scaled template cannot fit in the frame
        if width > image.width() as u64 || height > image.height() as u64 {
            log::debug!(
                "⚠️ Skipping scale {:.2} for '{}': {}x{} does not fit in {}x{}",
                scale,
                reference.name(),
                width,
                height,
                image.width(),
                image.height()
            );
            return Vec::new();
        }

        let template = scaled_template(reference.image(), width as u32, height as u32);
        let Some(surface) = CorrelationSurface::compute(image, &template) else {
            return Vec::new();
        };

        if log::log_enabled!(log::Level::Debug) {
            if let Some((x, y, score)) = surface.peak() {
                log::debug!(
                    "🔍 '{}' scale {:.2} ({}x{}): best {:.3} at ({},{}) over {}x{} positions",
                    reference.name(),
                    scale,
                    template.width(),
                    template.height(),
                    score,
                    x,
                    y,
                    surface.width(),
                    surface.height()
                );
            }
        }

        let (width, height) = template.dimensions();
        surface
            .at_or_above(self.config.threshold)
            .map(|(x, y, score)| Match {
                x,
                y,
                width,
                height,
                score,
                scale,
            })
            .collect()
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self {
            config: MatchConfig::default(),
        }
    }
}

/// Size of a reference resized by `scale`, truncated like the resize itself.
///
/// Returns `None` when a dimension truncates to zero.
fn scaled_dimensions(reference: &RgbImage, scale: f32) -> Option<(u64, u64)> {
    let width = (reference.width() as f64 * scale as f64) as u64;
    let height = (reference.height() as f64 * scale as f64) as u64;
    (width > 0 && height > 0).then_some((width, height))
}

/// Resize a reference to `width` x `height` with linear interpolation
fn scaled_template(reference: &RgbImage, width: u32, height: u32) -> Cow<'_, RgbImage> {
    if reference.dimensions() == (width, height) {
        return Cow::Borrowed(reference);
    }
    Cow::Owned(image::imageops::resize(
        reference,
        width,
        height,
        image::imageops::FilterType::Triangle,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_matcher_validates_config() {
        let bad = MatchConfig {
            threshold: -0.1,
            ..MatchConfig::default()
        };
        assert!(TemplateMatcher::new(bad).is_err());
        assert!(TemplateMatcher::new(MatchConfig::default()).is_ok());
    }

    #[test]
    fn test_scaled_dimensions() {
        let reference = RgbImage::new(10, 20);
        assert_eq!(scaled_dimensions(&reference, 1.0), Some((10, 20)));
        assert_eq!(scaled_dimensions(&reference, 2.0), Some((20, 40)));
        assert_eq!(scaled_dimensions(&reference, 0.25), Some((2, 5)));
        assert_eq!(scaled_dimensions(&reference, 0.05), None);
        assert_eq!(
            scaled_dimensions(&reference, 1.0e9),
            Some((10_000_000_000, 20_000_000_000))
        );
    }

    #[test]
    fn test_scaled_template_borrows_native_size() {
        let reference = RgbImage::new(10, 20);
        assert!(matches!(scaled_template(&reference, 10, 20), Cow::Borrowed(_)));
        assert_eq!(scaled_template(&reference, 20, 40).dimensions(), (20, 40));
    }

    #[test]
    fn test_tap_point_inverts_frame_scale() {
        let frame = Frame::new(RgbImage::new(1080, 2400)).unwrap();
        let small = frame.resized(0.5).unwrap();
        let found = Match {
            x: 100,
            y: 200,
            width: 20,
            height: 10,
            score: 0.9,
            scale: 1.0,
        };
        assert_eq!(TemplateMatcher::tap_point(&small, &found), Point::new(220, 410));
        assert_eq!(TemplateMatcher::tap_point(&frame, &found), Point::new(110, 205));
    }
}
