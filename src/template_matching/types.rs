/// Template matching data types
use super::error::{MatchError, MatchResult};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// A pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Largest raster `Frame::resized` will produce
pub const MAX_FRAME_PIXELS: u64 = 1 << 26;

/// A captured screen raster.
///
/// A frame remembers the dimensions of the raster it was resized from, so a
/// point found in a downscaled screenshot can be mapped back to device pixels
/// with [`Frame::to_source`].
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    scale: f32,
    source_width: u32,
    source_height: u32,
}

impl Frame {
    /// Wrap a native (unscaled) raster
    pub fn new(image: RgbImage) -> MatchResult<Self> {
        ensure_non_empty("frame", &image)?;
        let (w, h) = image.dimensions();
        Ok(Self {
            image,
            scale: 1.0,
            source_width: w,
            source_height: h,
        })
    }

    pub fn from_dynamic(image: DynamicImage) -> MatchResult<Self> {
        Self::new(image.to_rgb8())
    }

    /// Decode an encoded screenshot (PNG as produced by `screencap -p`, or JPEG)
    pub fn from_encoded(bytes: &[u8]) -> MatchResult<Self> {
        if bytes.is_empty() {
            return Err(MatchError::invalid_input("frame", "no image bytes"));
        }
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| MatchError::invalid_input("frame", e.to_string()))?;
        Self::from_dynamic(decoded)
    }

    /// Return a copy resized by `factor`, keeping track of the source size
    pub fn resized(&self, factor: f32) -> MatchResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "frame scale must be a positive number, got {factor}"
            )));
        }
        if (factor - 1.0).abs() < f32::EPSILON {
            return Ok(self.clone());
        }

        let new_width = (self.image.width() as f64 * factor as f64) as u64;
        let new_height = (self.image.height() as f64 * factor as f64) as u64;
        if new_width.saturating_mul(new_height) > MAX_FRAME_PIXELS {
            return Err(MatchError::InvalidConfig(format!(
                "frame scale {factor} would resize {}x{} to {new_width}x{new_height}",
                self.image.width(),
                self.image.height()
            )));
        }
        if new_width == 0 || new_height == 0 {
            return Err(MatchError::invalid_input(
                "frame",
                format!(
                    "resizing {}x{} by {factor} leaves no pixels",
                    self.image.width(),
                    self.image.height()
                ),
            ));
        }

        let image = image::imageops::resize(
            &self.image,
            new_width as u32,
            new_height as u32,
            image::imageops::FilterType::Triangle,
        );
        Ok(Self {
            image,
            scale: self.scale * factor,
            source_width: self.source_width,
            source_height: self.source_height,
        })
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Requested resize factor relative to the source raster
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Map a frame-space point back into source pixel space.
    ///
    /// Uses the exact per-axis ratio of source to frame size rather than the
    /// requested factor, since resizing truncates fractional dimensions.
    pub fn to_source(&self, point: Point) -> Point {
        let rx = self.source_width as f64 / self.image.width() as f64;
        let ry = self.source_height as f64 / self.image.height() as f64;
        let x = (point.x as f64 * rx).round() as u32;
        let y = (point.y as f64 * ry).round() as u32;
        Point::new(
            x.min(self.source_width.saturating_sub(1)),
            y.min(self.source_height.saturating_sub(1)),
        )
    }
}

/// A named UI element image to search for
#[derive(Debug, Clone)]
pub struct Reference {
    name: String,
    image: RgbImage,
}

impl Reference {
    pub fn new(name: impl Into<String>, image: RgbImage) -> MatchResult<Self> {
        let name = name.into();
        ensure_non_empty(&name, &image)?;
        Ok(Self { name, image })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

fn ensure_non_empty(name: &str, image: &RgbImage) -> MatchResult<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(MatchError::invalid_input(
            name,
            format!("empty raster {}x{}", image.width(), image.height()),
        ));
    }
    Ok(())
}

/// How scales are walked during a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Evaluate every scale and keep all matches
    #[default]
    Exhaustive,
    /// Stop at the first scale that produces any match
    FirstMatch,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exhaustive" | "all" => Ok(MatchMode::Exhaustive),
            "first-match" | "first" => Ok(MatchMode::FirstMatch),
            other => Err(format!(
                "unknown mode '{other}', expected 'exhaustive' or 'first-match'"
            )),
        }
    }
}

/// A single match result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Top-left X in frame space
    pub x: u32,
    /// Top-left Y in frame space
    pub y: u32,
    /// Width of the resized reference
    pub width: u32,
    /// Height of the resized reference
    pub height: u32,
    /// Correlation coefficient (-1.0..=1.0)
    pub score: f32,
    /// Scale applied to the reference
    pub scale: f32,
}

impl Match {
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center of the matched region in frame space
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Format match as string with score percentage
    pub fn describe(&self, name: &str) -> String {
        format!(
            "{} at {} {}x{} scale={:.2} - {}%",
            name,
            self.top_left(),
            self.width,
            self.height,
            self.scale,
            (self.score * 100.0) as i32
        )
    }
}

/// Matches for one reference of a multi-reference search
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceMatches {
    pub reference: String,
    pub matches: Vec<Match>,
}

impl ReferenceMatches {
    pub fn centers(&self) -> Vec<Point> {
        self.matches.iter().map(Match::center).collect()
    }
}

/// Result of [`TemplateMatcher::find_many`](super::TemplateMatcher::find_many),
/// in the order the references were given
#[derive(Debug, Clone, Default, Serialize)]
pub struct Detections {
    pub entries: Vec<ReferenceMatches>,
}

impl Detections {
    pub fn get(&self, reference: &str) -> Option<&ReferenceMatches> {
        self.entries.iter().find(|e| e.reference == reference)
    }

    pub fn centers(&self, reference: &str) -> Vec<Point> {
        self.get(reference)
            .map(ReferenceMatches::centers)
            .unwrap_or_default()
    }

    /// Centers of every match of every reference
    pub fn all_centers(&self) -> Vec<Point> {
        self.entries.iter().flat_map(|e| e.centers()).collect()
    }

    pub fn has_matches(&self) -> bool {
        self.entries.iter().any(|e| !e.matches.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_match_center_uses_resized_size() {
        let m = Match {
            x: 100,
            y: 150,
            width: 50,
            height: 30,
            score: 0.95,
            scale: 2.0,
        };
        assert_eq!(m.center(), Point::new(125, 165));
    }

    #[test]
    fn test_empty_frame_is_invalid_input() {
        let err = Frame::new(RgbImage::new(0, 10)).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_garbage_bytes_are_invalid_input() {
        let err = Frame::from_encoded(b"definitely not a png").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(Frame::from_encoded(&[]).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_empty_reference_is_invalid_input() {
        let err = Reference::new("button", RgbImage::new(5, 0)).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("button"));
    }

    #[test]
    fn test_resized_frame_maps_back_to_source() {
        let frame = Frame::new(RgbImage::from_pixel(1000, 500, Rgb([10, 20, 30]))).unwrap();
        let small = frame.resized(0.4).unwrap();

        assert_eq!(small.width(), 400);
        assert_eq!(small.height(), 200);
        assert!((small.scale() - 0.4).abs() < 1e-6);
        assert_eq!(small.source_dimensions(), (1000, 500));
        assert_eq!(small.to_source(Point::new(100, 50)), Point::new(250, 125));
    }

    #[test]
    fn test_truncated_resize_uses_exact_ratio() {
        // 1080 * 0.4 = 432, 2400 * 0.4 = 960; 1081 * 0.4 truncates to 432
        let frame = Frame::new(RgbImage::new(1081, 2401)).unwrap();
        let small = frame.resized(0.4).unwrap();
        assert_eq!((small.width(), small.height()), (432, 960));

        let mapped = small.to_source(Point::new(432, 960));
        assert_eq!(mapped, Point::new(1080, 2400));
    }

    #[test]
    fn test_native_frame_maps_identically() {
        let frame = Frame::new(RgbImage::new(64, 48)).unwrap();
        assert_eq!(frame.to_source(Point::new(17, 33)), Point::new(17, 33));
        assert_eq!(frame.resized(1.0).unwrap().to_source(Point::new(5, 6)), Point::new(5, 6));
    }

    #[test]
    fn test_invalid_frame_scale_rejected() {
        let frame = Frame::new(RgbImage::new(10, 10)).unwrap();
        assert!(frame.resized(0.0).is_err());
        assert!(frame.resized(f32::NAN).is_err());
        assert!(frame.resized(0.01).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_huge_frame_scale_rejected_without_allocating() {
        let frame = Frame::new(RgbImage::new(40, 40)).unwrap();
        assert!(matches!(
            frame.resized(1.0e9),
            Err(MatchError::InvalidConfig(_))
        ));
        assert!(matches!(
            frame.resized(f32::MAX),
            Err(MatchError::InvalidConfig(_))
        ));
        // Upscaling within the bound still works
        assert_eq!(frame.resized(4.0).unwrap().width(), 160);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("first".parse::<MatchMode>().unwrap(), MatchMode::FirstMatch);
        assert_eq!("Exhaustive".parse::<MatchMode>().unwrap(), MatchMode::Exhaustive);
        assert!("sometimes".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_detections_centers_flatten_in_order() {
        let hit = |x, y| Match {
            x,
            y,
            width: 10,
            height: 10,
            score: 0.9,
            scale: 1.0,
        };
        let detections = Detections {
            entries: vec![
                ReferenceMatches {
                    reference: "ok".into(),
                    matches: vec![hit(0, 0), hit(20, 0)],
                },
                ReferenceMatches {
                    reference: "cancel".into(),
                    matches: vec![],
                },
                ReferenceMatches {
                    reference: "menu".into(),
                    matches: vec![hit(40, 40)],
                },
            ],
        };
        assert!(detections.has_matches());
        assert!(detections.centers("cancel").is_empty());
        assert!(detections.centers("missing").is_empty());
        assert_eq!(
            detections.all_centers(),
            vec![Point::new(5, 5), Point::new(25, 5), Point::new(45, 45)]
        );
    }
}
