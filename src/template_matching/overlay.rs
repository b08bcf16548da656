//! Bounding-box overlays for inspecting detections

use super::error::{MatchError, MatchResult};
use super::types::{Frame, Match};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;

/// Copy of the frame with a green box around every match
pub fn draw_matches(frame: &Frame, matches: &[Match]) -> RgbImage {
    let mut canvas = frame.image().clone();
    for found in matches {
        for inset in 0..BOX_THICKNESS {
            let width = found.width.saturating_sub(2 * inset);
            let height = found.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((found.x + inset) as i32, (found.y + inset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
    }
    canvas
}

pub fn save_overlay(frame: &Frame, matches: &[Match], path: impl AsRef<Path>) -> MatchResult<()> {
    let path = path.as_ref();
    draw_matches(frame, matches)
        .save(path)
        .map_err(|source| MatchError::OverlayWrite {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("🖼️ Overlay with {} boxes saved to {}", matches.len(), path.display());
    Ok(())
}
